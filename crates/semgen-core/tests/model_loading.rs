use std::fs;
use std::path::PathBuf;

use semgen_core::{
    Error, build_parent_graph_report, load_model, model_json_schema, validate_model,
    validate_model_json,
};

fn example_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../models/examples")
        .join(name)
}

#[test]
fn chain_example_loads_and_validates() {
    let model = load_model(&example_path("chain.toml")).expect("load chain.toml");

    assert_eq!(model.observed_names(), vec!["A", "B"]);
    assert_eq!(model.equations.len(), 2);

    let report = validate_model(&model);
    assert!(report.is_ok(), "unexpected errors: {:?}", report.errors);
    assert!(report.warnings.is_empty(), "unexpected warnings");
}

#[test]
fn confounded_example_keeps_latent_and_tags() {
    let model = load_model(&example_path("confounded.json")).expect("load confounded.json");

    assert_eq!(model.len(), 5);
    assert_eq!(model.latent_count(), 1);
    assert_eq!(model.observed_names(), vec!["X", "M", "Y", "G"]);
    assert!(model.variable("G").and_then(|var| var.data_type).is_some());

    let graph = build_parent_graph_report(&model);
    let order = graph.topo_order.expect("acyclic model");
    assert_eq!(order.first().map(String::as_str), Some("L"));
    assert_eq!(graph.summary.edges, 5);
}

#[test]
fn examples_conform_to_the_emitted_schema() {
    let schema = model_json_schema().expect("emit schema");
    assert!(schema.get("definitions").is_some());

    let contents = fs::read_to_string(example_path("confounded.json")).expect("read example");
    let document: serde_json::Value = serde_json::from_str(&contents).expect("parse json");
    let report = validate_model_json(&document).expect("validate");
    assert!(report.is_ok(), "schema errors: {:?}", report.errors);
}

#[test]
fn unsupported_extension_is_rejected() {
    let mut path = std::env::temp_dir();
    path.push(format!("semgen_model_{}.py", uuid::Uuid::new_v4()));
    fs::write(&path, "model = []").expect("write temp model");

    let result = load_model(&path);
    assert!(matches!(result, Err(Error::Parse(_))));
    let _ = fs::remove_file(&path);
}
