use std::fs;
use std::path::PathBuf;

use semgen_generate::{DistributionKind, GenerateOptions, GenerationError, Generator, TuningConfig};

fn model_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../models/examples")
        .join(name)
}

fn temp_out_dir(label: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("semgen_generate_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp out dir");
    dir
}

fn seeded(seed: u64) -> GenerateOptions {
    GenerateOptions {
        seed: Some(seed),
        ..GenerateOptions::default()
    }
}

#[test]
fn generate_writes_header_and_rows() {
    let out = temp_out_dir("rows").join("chain.csv");
    let mut generator =
        Generator::from_path(&model_path("chain.toml"), seeded(3)).expect("load chain model");

    let report = generator.generate(40, true, Some(&out)).expect("generate");

    let text = fs::read_to_string(&out).expect("read csv");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("A,B"));
    assert_eq!(lines.count(), 40);
    assert_eq!(report.rows_written, 40);
    assert_eq!(report.rows_failed, 0);
    assert_eq!(report.bytes_written, text.len() as u64);
    assert_eq!(report.variables, vec!["A", "B"]);
    assert_eq!(report.seed, 3);
}

#[test]
fn generate_is_deterministic() {
    let dir = temp_out_dir("determinism");
    let path_a = dir.join("a.csv");
    let path_b = dir.join("b.csv");

    Generator::from_path(&model_path("confounded.json"), seeded(42))
        .expect("load model A")
        .generate(100, true, Some(&path_a))
        .expect("generate A");
    Generator::from_path(&model_path("confounded.json"), seeded(42))
        .expect("load model B")
        .generate(100, true, Some(&path_b))
        .expect("generate B");

    let a = fs::read_to_string(&path_a).expect("read A");
    let b = fs::read_to_string(&path_b).expect("read B");
    assert_eq!(a, b);
    assert!(a.starts_with("X,M,Y,G\n"));
}

#[test]
fn default_output_requires_a_model_path() {
    let model = semgen_core::ModelDefinition::from_pairs(vec![(
        semgen_core::VariableSpec::new("A", &[]),
        "noise()",
    )]);
    let mut generator = Generator::from_definition(model, seeded(1)).expect("build");
    let err = generator.generate(1, false, None).expect_err("no path");
    assert!(matches!(err, GenerationError::Configuration(_)));
}

#[test]
fn failed_samples_are_counted_not_written() {
    let out = temp_out_dir("failures").join("log.csv");
    let model = semgen_core::ModelDefinition::from_pairs(vec![
        (semgen_core::VariableSpec::new("A", &[]), "noise()"),
        (semgen_core::VariableSpec::new("B", &["A"]), "log(A)"),
    ]);
    let options = GenerateOptions {
        tuning: TuningConfig {
            mean_scale: 1e-6,
            distributions: vec![DistributionKind::Normal],
            ..TuningConfig::default()
        },
        ..seeded(7)
    };
    let mut generator = Generator::from_definition(model, options).expect("build");

    let report = generator.generate(200, true, Some(&out)).expect("generate");

    assert!(report.rows_failed > 0);
    assert!(report.rows_written > 0);
    assert_eq!(report.rows_written + report.rows_failed, 200);
    let text = fs::read_to_string(&out).expect("read csv");
    assert_eq!(text.lines().count() as u64, report.rows_written + 1);
}
