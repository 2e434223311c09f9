use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::GenerationError;
use crate::params::DistributionKind;

/// Tuning constants for parameter draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TuningConfig {
    /// Minimum absolute value for coefficients.
    pub min_coef: f64,
    /// Scale of the exponential added to `min_coef`, in units of `min_coef`.
    pub coef_scale: f64,
    /// Mean of the normal distribution noise locations are drawn from.
    pub mean_mean: f64,
    /// Standard deviation of the normal distribution for noise locations.
    pub mean_scale: f64,
    /// Minimum noise scale.
    pub min_std: f64,
    /// Scale of the exponential added to `min_std`, in units of `min_std`.
    pub std_scale: f64,
    /// Noise distribution kinds to choose from.
    pub distributions: Vec<DistributionKind>,
    /// Offset added to `data()` noise.
    pub data_offset: f64,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            min_coef: 0.1,
            coef_scale: 1.0,
            mean_mean: 0.0,
            mean_scale: 5.0,
            min_std: 0.1,
            std_scale: 5.0,
            distributions: vec![
                DistributionKind::Lognormal,
                DistributionKind::Laplace,
                DistributionKind::Logistic,
                DistributionKind::Gumbel,
            ],
            data_offset: 1.0,
        }
    }
}

impl TuningConfig {
    /// Reject values the draw distributions cannot be built from.
    pub fn validate(&self) -> Result<(), GenerationError> {
        let finite = [
            ("min_coef", self.min_coef),
            ("coef_scale", self.coef_scale),
            ("mean_mean", self.mean_mean),
            ("mean_scale", self.mean_scale),
            ("min_std", self.min_std),
            ("std_scale", self.std_scale),
            ("data_offset", self.data_offset),
        ];
        for (key, value) in finite {
            if !value.is_finite() {
                return Err(GenerationError::Configuration(format!(
                    "{key} must be finite"
                )));
            }
        }
        for (key, value) in [
            ("min_coef", self.min_coef),
            ("coef_scale", self.coef_scale),
            ("min_std", self.min_std),
            ("std_scale", self.std_scale),
        ] {
            if value <= 0.0 {
                return Err(GenerationError::Configuration(format!(
                    "{key} must be > 0"
                )));
            }
        }
        if self.mean_scale < 0.0 {
            return Err(GenerationError::Configuration(
                "mean_scale must be >= 0".to_string(),
            ));
        }
        if self.distributions.is_empty() {
            return Err(GenerationError::Configuration(
                "distributions must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Options for the generation engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    /// Seed for every draw; a random seed is chosen (and logged) when unset.
    pub seed: Option<u64>,
    /// Fail construction when any equation does not compile.
    pub strict: bool,
    pub tuning: TuningConfig,
}

/// Summary of a dataset written by [`crate::Generator::generate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetReport {
    pub path: PathBuf,
    pub variables: Vec<String>,
    pub rows_requested: u64,
    pub rows_written: u64,
    pub rows_failed: u64,
    pub bytes_written: u64,
    pub duration_ms: u64,
    pub seed: u64,
    pub parameter_generation: u64,
}
