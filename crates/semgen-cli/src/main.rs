mod config;
mod registry;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use registry::{
    RunContext, RunOptions, init_run_logging, init_stderr_logging, run_span, start_run,
    write_report, write_sem,
};
use semgen_core::{
    Error as CoreError, MODEL_VERSION, build_parent_graph_report, load_model, model_json_schema,
    validate_model,
};
use semgen_eval::{EvalError, EvaluateOptions, EvaluationEngine};
use semgen_generate::{GenerateOptions, GenerationError, Generator, TuningConfig};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvalError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("model has {0} validation error(s)")]
    InvalidModel(usize),
}

#[derive(Parser, Debug)]
#[command(name = "semgen", version, about = "Synthetic data from structural equation models")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a dataset and record the run.
    Generate(GenerateArgs),
    /// Score a dataset's causal directions against its model.
    Evaluate(EvaluateArgs),
    /// Validate a model file and print its parent graph.
    Check(CheckArgs),
    /// Print the JSON Schema for model files.
    Schema,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Model file (TOML or JSON).
    model: PathBuf,
    /// Number of samples to draw.
    #[arg(long, default_value_t = 1000)]
    samples: u64,
    /// Draw fresh parameters before sampling.
    #[arg(long, default_value_t = false)]
    reset: bool,
    /// Seed for reproducible parameters and samples.
    #[arg(long)]
    seed: Option<u64>,
    /// Tuning file (TOML) for parameter draws.
    #[arg(long, value_name = "TUNING_TOML")]
    config: Option<PathBuf>,
    /// Output CSV path; defaults to the model path with a .csv extension.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    run_dir: PathBuf,
    /// Fail when any equation does not compile.
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// Dataset CSV produced by `generate`.
    data: PathBuf,
    /// Model the dataset was generated from.
    #[arg(long)]
    model: PathBuf,
    /// Directory for metrics.json, directions.json and report.md.
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Values above 1 use the non-linear direction test.
    #[arg(long, default_value_t = 1.0)]
    power: f64,
    /// Calibration for the non-linear test, 1 to 10.
    #[arg(long)]
    sensitivity: Option<f64>,
    /// Maximum rows used to fit the non-linear regression.
    #[arg(long, default_value_t = 100_000)]
    n_train: usize,
    /// Seed for subsampling and random features.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Drop rows with non-numeric cells instead of failing.
    #[arg(long, default_value_t = false)]
    lenient: bool,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Model file (TOML or JSON).
    model: PathBuf,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Evaluate(args) => run_evaluate(args),
        Command::Check(args) => run_check(&args.model),
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&model_json_schema()?)?);
            Ok(())
        }
    }
}

fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    let GenerateArgs {
        model,
        samples,
        reset,
        seed,
        config,
        out,
        run_dir,
        strict,
    } = args;

    let tuning = match &config {
        Some(path) => config::load_tuning(path)?,
        None => TuningConfig::default(),
    };

    let run_id = Uuid::new_v4().to_string();
    let run_ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        model_path: model.clone(),
        model_version: MODEL_VERSION.to_string(),
        run_dir,
        options: RunOptions {
            samples,
            reset,
            strict,
            seed,
            tuning_path: config,
            tuning: tuning.clone(),
        },
    };

    let run_paths = start_run(&run_ctx)?;
    init_run_logging(&run_paths.logs_path)?;
    let _run = run_span(&run_id).entered();

    tracing::info!(event = "run_started", model = %model.display());
    let timer = Instant::now();

    let options = GenerateOptions {
        seed,
        strict,
        tuning,
    };
    let mut generator = Generator::builder()
        .model_path(&model)
        .options(options)
        .build()?;

    let report = generator.generate(samples, reset, out.as_deref())?;
    tracing::info!(event = "dataset_written", path = %report.path.display());

    let sem = generator.describe_realized_model()?;
    write_sem(&run_paths, &sem)?;
    write_report(&run_paths, &run_id, &report, generator.statistics())?;
    tracing::info!(event = "report_written", path = %run_paths.report_path.display());

    print!("{sem}");
    println!(
        "{} records written to {} ({} failed)",
        report.rows_written,
        report.path.display(),
        report.rows_failed
    );
    println!("run: {}", run_paths.root.display());

    tracing::info!(
        event = "run_finished",
        status = "success",
        duration_ms = timer.elapsed().as_millis()
    );
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<(), CliError> {
    init_stderr_logging()?;

    let model = load_model(&args.model)?;
    let model_name = args
        .model
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned());

    let options = EvaluateOptions {
        strict: !args.lenient,
        power: args.power,
        n_train: args.n_train,
        sensitivity: args.sensitivity,
        seed: args.seed,
        out_dir: args.out_dir,
    };
    let result = EvaluationEngine::new(options).run(&model, model_name.as_deref(), &args.data)?;

    println!("{}", result.report);
    println!();
    println!("report: {}", result.report_path.display());
    Ok(())
}

fn run_check(path: &Path) -> Result<(), CliError> {
    init_stderr_logging()?;

    let model = load_model(path)?;
    let report = validate_model(&model);
    let graph = build_parent_graph_report(&model);

    let output = serde_json::json!({
        "model": path.display().to_string(),
        "validation": report,
        "graph": graph,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    if report.is_ok() {
        Ok(())
    } else {
        Err(CliError::InvalidModel(report.errors.len()))
    }
}
