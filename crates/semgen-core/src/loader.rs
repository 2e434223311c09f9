use std::path::Path;

use serde_json::Value;

use crate::contract::validate_model_json;
use crate::error::{Error, Result};
use crate::model::{ModelDefinition, ModelFile};

/// Load a model file, choosing the format from the file extension.
pub fn load_model(path: &Path) -> Result<ModelDefinition> {
    let contents = std::fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("toml") => parse_model_toml(&contents),
        Some("json") => parse_model_json(&contents),
        _ => Err(Error::Parse(format!(
            "unsupported model file extension: {}",
            path.display()
        ))),
    }
}

/// Parse a JSON model document.
pub fn parse_model_json(contents: &str) -> Result<ModelDefinition> {
    let document: Value = serde_json::from_str(contents)?;
    model_from_document(document)
}

/// Parse a TOML model document.
pub fn parse_model_toml(contents: &str) -> Result<ModelDefinition> {
    let document: Value = toml::from_str(contents).map_err(|err| Error::Parse(err.to_string()))?;
    model_from_document(document)
}

fn model_from_document(document: Value) -> Result<ModelDefinition> {
    let report = validate_model_json(&document)?;
    if !report.is_ok() {
        return Err(Error::InvalidModel(report.error_summary()));
    }
    let file: ModelFile = serde_json::from_value(document)?;
    Ok(ModelDefinition::from(file))
}
