use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use serde::Serialize;

use semgen_generate::{DatasetReport, RunStatistics, TuningConfig};

use super::{RegistryError, RegistryResult};

/// Serializable generation options for runs.
#[derive(Debug, Clone, Serialize)]
pub struct RunOptions {
    pub samples: u64,
    pub reset: bool,
    pub strict: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuning_path: Option<PathBuf>,
    pub tuning: TuningConfig,
}

/// Metadata captured at run start.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub model_path: PathBuf,
    pub model_version: String,
    pub run_dir: PathBuf,
    pub options: RunOptions,
}

/// JSON config written to each run directory.
#[derive(Debug, Serialize)]
pub struct RunConfig {
    pub run_id: String,
    pub started_at: String,
    pub model_path: PathBuf,
    pub model_version: String,
    pub options: RunOptions,
    pub git: GitInfo,
}

/// Git metadata for reproducibility.
#[derive(Debug, Serialize)]
pub struct GitInfo {
    pub commit: Option<String>,
    pub dirty: Option<bool>,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub root: PathBuf,
    pub logs_path: PathBuf,
    pub report_path: PathBuf,
    pub sem_path: PathBuf,
}

/// Generation report as persisted in `generation_report.json`.
#[derive(Debug, Serialize)]
struct GenerationReport<'a> {
    run_id: &'a str,
    #[serde(flatten)]
    dataset: &'a DatasetReport,
    statistics: &'a RunStatistics,
}

pub fn start_run(ctx: &RunContext) -> RegistryResult<RunPaths> {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let root = ctx.run_dir.join(format!("{timestamp}__run_{}", ctx.run_id));

    create_dir_all(&root)?;

    let config_path = root.join("config.json");
    let logs_path = root.join("logs.ndjson");

    let config = RunConfig {
        run_id: ctx.run_id.clone(),
        started_at: ctx.started_at.to_rfc3339(),
        model_path: ctx.model_path.clone(),
        model_version: ctx.model_version.clone(),
        options: ctx.options.clone(),
        git: collect_git_info(),
    };

    write_json(&config_path, &config)?;

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&logs_path)?;

    Ok(RunPaths {
        report_path: root.join("generation_report.json"),
        sem_path: root.join("sem.txt"),
        logs_path,
        root,
    })
}

pub fn write_report(
    paths: &RunPaths,
    run_id: &str,
    dataset: &DatasetReport,
    statistics: &RunStatistics,
) -> RegistryResult<()> {
    let report = GenerationReport {
        run_id,
        dataset,
        statistics,
    };
    write_json(&paths.report_path, &report)
}

pub fn write_sem(paths: &RunPaths, sem: &str) -> RegistryResult<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&paths.sem_path)?;
    file.write_all(sem.as_bytes())?;
    Ok(())
}

pub fn collect_git_info() -> GitInfo {
    let commit = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
            } else {
                None
            }
        })
        .filter(|value| !value.is_empty());

    let dirty = Command::new("git")
        .args(["status", "--porcelain"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| !output.stdout.is_empty());

    GitInfo { commit, dirty }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> RegistryResult<()> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    serde_json::to_writer_pretty(file, value).map_err(RegistryError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_run_creates_config_and_log_file() {
        let base = std::env::temp_dir().join(format!("semgen_cli_run_{}", uuid::Uuid::new_v4()));
        let ctx = RunContext {
            run_id: "abc".to_string(),
            started_at: Utc::now(),
            model_path: PathBuf::from("model.toml"),
            model_version: "0.1".to_string(),
            run_dir: base.clone(),
            options: RunOptions {
                samples: 10,
                reset: false,
                strict: false,
                seed: Some(4),
                tuning_path: None,
                tuning: TuningConfig::default(),
            },
        };

        let paths = start_run(&ctx).expect("start run");
        assert!(paths.root.starts_with(&base));
        assert!(paths.root.to_string_lossy().ends_with("__run_abc"));
        assert!(paths.logs_path.exists());

        let config: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(paths.root.join("config.json")).expect("read config"),
        )
        .expect("parse config");
        assert_eq!(config["run_id"], "abc");
        assert_eq!(config["options"]["seed"], 4);
        assert_eq!(config["options"]["tuning"]["min_coef"], 0.1);
    }
}
