use std::collections::BTreeSet;

use serde::Serialize;

use crate::graph::build_parent_graph_report;
use crate::model::ModelDefinition;

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// Structured validation issue with location and hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub code: String,
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ValidationIssue {
    /// Create a new validation issue.
    pub fn new(
        severity: IssueSeverity,
        code: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
        hint: Option<String>,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            path: path.into(),
            message: message.into(),
            hint,
        }
    }
}

/// Aggregated validation report with errors and warnings.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns true when there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push_error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    pub fn push_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Error messages joined into one line, for error values.
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|issue| format!("{}: {}", issue.path, issue.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Validate internal consistency of a model definition.
///
/// This checks:
/// - one equation per declared variable
/// - non-empty, unique variable names
/// - parents are declared, and declared before their children
/// - the parent graph is acyclic
pub fn validate_model(model: &ModelDefinition) -> ValidationReport {
    let mut report = ValidationReport::default();

    if model.is_empty() {
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "no_variables",
            "/variables",
            "model declares no variables",
            None,
        ));
        return report;
    }

    if model.variables.len() != model.equations.len() {
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "equation_count_mismatch",
            "/equations",
            format!(
                "{} variables declared but {} equations supplied",
                model.variables.len(),
                model.equations.len()
            ),
            Some("supply exactly one equation per variable, in the same order".to_string()),
        ));
    }

    let mut seen = BTreeSet::new();
    for (idx, variable) in model.variables.iter().enumerate() {
        let path = format!("/variables/{idx}");
        if variable.name.trim().is_empty() {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "empty_name",
                path,
                "variable name is empty",
                None,
            ));
            continue;
        }
        if !seen.insert(variable.name.as_str()) {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "duplicate_variable",
                path,
                format!("variable '{}' declared more than once", variable.name),
                None,
            ));
        }
    }

    for (idx, variable) in model.variables.iter().enumerate() {
        for (parent_idx, parent) in variable.parents.iter().enumerate() {
            let path = format!("/variables/{idx}/parents/{parent_idx}");
            match model.position(parent) {
                None => report.push_warning(ValidationIssue::new(
                    IssueSeverity::Warning,
                    "unknown_parent",
                    path,
                    format!(
                        "parent '{}' of '{}' is not a declared variable",
                        parent, variable.name
                    ),
                    None,
                )),
                Some(position) if position >= idx => report.push_warning(ValidationIssue::new(
                    IssueSeverity::Warning,
                    "forward_parent",
                    path,
                    format!(
                        "parent '{}' is declared after '{}'",
                        parent, variable.name
                    ),
                    Some("declare parents before the variables that use them".to_string()),
                )),
                Some(_) => {}
            }
        }
    }

    let graph = build_parent_graph_report(model);
    if let Some(cycle) = graph.cycle {
        report.push_warning(ValidationIssue::new(
            IssueSeverity::Warning,
            "parent_cycle",
            "/variables",
            format!("parent graph contains a cycle through: {}", cycle.join(", ")),
            None,
        ));
    }

    if model.observed_names().is_empty() {
        report.push_warning(ValidationIssue::new(
            IssueSeverity::Warning,
            "no_observed_variables",
            "/variables",
            "every variable is latent; output rows will be empty",
            None,
        ));
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VariableSpec;

    fn model(pairs: Vec<(VariableSpec, &str)>) -> ModelDefinition {
        ModelDefinition::from_pairs(pairs)
    }

    #[test]
    fn valid_chain_has_no_issues() {
        let model = model(vec![
            (VariableSpec::new("A", &[]), "noise()"),
            (VariableSpec::new("B", &["A"]), "coef() * A + noise()"),
        ]);
        let report = validate_model(&model);
        assert!(report.is_ok());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn duplicate_names_are_errors() {
        let model = model(vec![
            (VariableSpec::new("A", &[]), "noise()"),
            (VariableSpec::new("A", &[]), "noise()"),
        ]);
        let report = validate_model(&model);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, "duplicate_variable");
        assert_eq!(report.errors[0].path, "/variables/1");
    }

    #[test]
    fn count_mismatch_is_an_error() {
        let model = ModelDefinition::new(
            vec![VariableSpec::new("A", &[]), VariableSpec::new("B", &[])],
            vec!["noise()".to_string()],
        );
        let report = validate_model(&model);
        assert!(
            report
                .errors
                .iter()
                .any(|issue| issue.code == "equation_count_mismatch")
        );
    }

    #[test]
    fn forward_and_unknown_parents_are_warnings() {
        let model = model(vec![
            (VariableSpec::new("A", &["B"]), "B + noise()"),
            (VariableSpec::new("B", &["Z"]), "noise()"),
        ]);
        let report = validate_model(&model);
        assert!(report.is_ok());
        let codes: Vec<&str> = report
            .warnings
            .iter()
            .map(|issue| issue.code.as_str())
            .collect();
        assert!(codes.contains(&"forward_parent"));
        assert!(codes.contains(&"unknown_parent"));
    }

    #[test]
    fn all_latent_model_warns() {
        let model = model(vec![(VariableSpec::latent("L", &[]), "noise()")]);
        let report = validate_model(&model);
        assert!(
            report
                .warnings
                .iter()
                .any(|issue| issue.code == "no_observed_variables")
        );
    }
}
