use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::metrics::{EdgeDirection, MetricsReport};

/// Options for dataset evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluateOptions {
    /// Fail on non-numeric cells instead of dropping the row.
    pub strict: bool,
    /// Values above 1 select the non-linear direction test.
    pub power: f64,
    /// Upper bound on rows used to fit the non-linear regression.
    pub n_train: usize,
    /// Calibration for the non-linear test, in `[1, 10]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<f64>,
    /// Seed for subsampling and random features.
    pub seed: u64,
    /// Optional output directory override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<PathBuf>,
}

impl Default for EvaluateOptions {
    fn default() -> Self {
        Self {
            strict: true,
            power: 1.0,
            n_train: 100_000,
            sensitivity: None,
            seed: 0,
            out_dir: None,
        }
    }
}

/// Result of a dataset evaluation.
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    pub out_dir: PathBuf,
    pub metrics_path: PathBuf,
    pub report_path: PathBuf,
    pub directions_path: PathBuf,
    pub metrics: MetricsReport,
    pub directions: Vec<EdgeDirection>,
    pub report: String,
}
