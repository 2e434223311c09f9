use jsonschema::JSONSchema;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::ModelFile;
use crate::validation::{IssueSeverity, ValidationIssue, ValidationReport};

/// JSON Schema describing the model file format.
pub fn model_json_schema() -> Result<Value> {
    let schema = schemars::schema_for!(ModelFile);
    Ok(serde_json::to_value(schema)?)
}

/// Validate a raw model document against the model JSON Schema.
pub fn validate_model_json(document: &Value) -> Result<ValidationReport> {
    let schema = model_json_schema()?;
    let compiled =
        JSONSchema::compile(&schema).map_err(|err| Error::Parse(err.to_string()))?;

    let mut report = ValidationReport::default();
    if let Err(errors) = compiled.validate(document) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "schema_violation",
                path,
                error.to_string(),
                None,
            ));
        }
    }

    Ok(report)
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_mixed_variable_declarations() {
        let document = json!({
            "variables": ["A", {"name": "B", "parents": ["A"]}],
            "equations": ["noise()", "coef() * A + noise()"]
        });
        let report = validate_model_json(&document).expect("validate");
        assert!(report.is_ok(), "unexpected errors: {:?}", report.errors);
    }

    #[test]
    fn reports_missing_equations() {
        let document = json!({ "variables": ["A"] });
        let report = validate_model_json(&document).expect("validate");
        assert!(!report.is_ok());
        assert_eq!(report.errors[0].code, "schema_violation");
        assert_eq!(report.errors[0].path, "/");
    }
}
