//! Core contracts and helpers for semgen.
//!
//! This crate defines the structural equation model types, the model file
//! format and its JSON Schema, and the structural checks shared by the
//! generator, the evaluator and the CLI.

pub mod contract;
pub mod error;
pub mod graph;
pub mod loader;
pub mod model;
pub mod validation;

pub use contract::{model_json_schema, validate_model_json};
pub use error::{Error, Result};
pub use graph::{ParentGraphReport, ParentGraphSummary, build_parent_graph_report};
pub use loader::{load_model, parse_model_json, parse_model_toml};
pub use model::{DataType, ModelDefinition, ModelFile, VariableDecl, VariableSpec};
pub use validation::{IssueSeverity, ValidationIssue, ValidationReport, validate_model};

/// Current contract version for model files.
pub const MODEL_VERSION: &str = "0.1";
