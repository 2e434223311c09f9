use std::fs;
use std::path::PathBuf;

use semgen_core::load_model;
use semgen_eval::{EvalError, EvaluateOptions, EvaluationEngine, Verdict};
use semgen_generate::{GenerateOptions, Generator};

fn model_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../models/examples")
        .join(name)
}

fn temp_out_dir(label: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("semgen_eval_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp out dir");
    dir
}

fn generate(model: &str, rows: u64, dir: &PathBuf) -> PathBuf {
    let out = dir.join("data.csv");
    let options = GenerateOptions {
        seed: Some(17),
        ..GenerateOptions::default()
    };
    Generator::from_path(&model_path(model), options)
        .expect("load model")
        .generate(rows, true, Some(&out))
        .expect("generate dataset");
    out
}

#[test]
fn evaluation_writes_metrics_and_report() {
    let dir = temp_out_dir("chain");
    let data = generate("chain.toml", 300, &dir);
    let model = load_model(&model_path("chain.toml")).expect("model");

    let result = EvaluationEngine::new(EvaluateOptions::default())
        .run(&model, Some("chain"), &data)
        .expect("evaluate");

    assert_eq!(result.metrics.rows, 300);
    assert_eq!(result.metrics.column_stats.len(), 2);
    assert_eq!(result.directions.len(), 1);
    assert_eq!(result.directions[0].parent, "A");
    assert_eq!(result.directions[0].child, "B");
    assert_ne!(result.directions[0].verdict, Verdict::Skipped);

    assert!(result.metrics_path.exists());
    assert!(result.directions_path.exists());
    let report = fs::read_to_string(&result.report_path).expect("read report");
    assert!(report.contains("| A -> B |"));
}

#[test]
fn latent_and_categorical_edges_are_skipped() {
    let dir = temp_out_dir("confounded");
    let data = generate("confounded.json", 200, &dir);
    let model = load_model(&model_path("confounded.json")).expect("model");

    let options = EvaluateOptions {
        power: 2.0,
        n_train: 150,
        ..EvaluateOptions::default()
    };
    let result = EvaluationEngine::new(options)
        .run(&model, None, &data)
        .expect("evaluate");

    let skipped: Vec<_> = result
        .directions
        .iter()
        .filter(|edge| edge.verdict == Verdict::Skipped)
        .map(|edge| (edge.parent.as_str(), edge.child.as_str()))
        .collect();
    assert_eq!(skipped, vec![("L", "X"), ("L", "Y"), ("Y", "G")]);
    assert_eq!(result.metrics.directions.skipped, 3);
    assert_eq!(result.metrics.method.name, "knn_residual_independence");
}

#[test]
fn sensitivity_out_of_range_fails_the_run() {
    let dir = temp_out_dir("sensitivity");
    let data = generate("chain.toml", 50, &dir);
    let model = load_model(&model_path("chain.toml")).expect("model");

    let options = EvaluateOptions {
        power: 2.0,
        sensitivity: Some(42.0),
        out_dir: Some(dir.join("eval")),
        ..EvaluateOptions::default()
    };
    let err = EvaluationEngine::new(options)
        .run(&model, None, &data)
        .expect_err("sensitivity out of range");
    assert!(matches!(err, EvalError::SensitivityRange(value) if value == 42.0));
    assert!(!dir.join("eval").join("metrics.json").exists());
}

#[test]
fn missing_dataset_is_an_io_error() {
    let model = load_model(&model_path("chain.toml")).expect("model");
    let err = EvaluationEngine::new(EvaluateOptions::default())
        .run(&model, None, &temp_out_dir("missing").join("absent.csv"))
        .expect_err("missing file");
    assert!(matches!(err, EvalError::Io(_)));
}
