use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;

/// Metrics contract version for dataset evaluation.
pub const METRICS_VERSION: &str = "0.1";

/// Machine-readable metrics for a dataset evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    pub metrics_version: String,
    pub dataset: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    pub rows: u64,
    pub method: DirectionMethod,
    pub column_stats: Vec<ColumnStats>,
    pub directions: DirectionSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<WarningItem>,
    pub performance: PerformanceMetrics,
}

/// Direction test settings used for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectionMethod {
    pub name: String,
    pub power: f64,
    pub n_train: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<f64>,
}

/// Summary statistics for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub name: String,
    pub count: u64,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Counts of edge verdicts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionSummary {
    pub edges: u64,
    pub agree: u64,
    pub reversed: u64,
    pub undetermined: u64,
    pub skipped: u64,
}

impl DirectionSummary {
    pub fn from_edges(edges: &[EdgeDirection]) -> Self {
        let mut summary = Self {
            edges: edges.len() as u64,
            ..Self::default()
        };
        for edge in edges {
            match edge.verdict {
                Verdict::Agrees => summary.agree += 1,
                Verdict::Reversed => summary.reversed += 1,
                Verdict::Undetermined => summary.undetermined += 1,
                Verdict::Skipped => summary.skipped += 1,
            }
        }
        summary
    }
}

/// Outcome of testing a declared parent -> child edge against the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The data points from parent to child.
    Agrees,
    /// The data points from child to parent.
    Reversed,
    Undetermined,
    Skipped,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Agrees => "agrees",
            Self::Reversed => "reversed",
            Self::Undetermined => "undetermined",
            Self::Skipped => "skipped",
        }
    }
}

/// Direction score for one declared edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDirection {
    pub parent: String,
    pub child: String,
    /// Positive when the data favours parent -> child.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Non-fatal finding raised while loading or evaluating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningItem {
    pub code: String,
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Timings for evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub load_ms: u128,
    pub evaluate_ms: u128,
    pub total_ms: u128,
}

pub fn collect_column_stats(dataset: &Dataset) -> Vec<ColumnStats> {
    dataset
        .columns()
        .iter()
        .filter_map(|name| {
            let values = dataset.column(name)?;
            Some(ColumnStats {
                name: name.clone(),
                count: values.len() as u64,
                mean: mean(values),
                std_dev: std_dev(values),
                min: values.iter().copied().fold(f64::INFINITY, f64::min),
                max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            })
        })
        .collect()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    let center = mean(values);
    let variance =
        values.iter().map(|v| (v - center).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Pearson correlation; `None` when either series is constant.
pub fn correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    let (mean_a, mean_b) = (mean(a), mean(b));
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let (dx, dy) = (x - mean_a, y - mean_b);
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    let denom = (var_a * var_b).sqrt();
    (denom > 0.0).then(|| cov / denom)
}

/// Zero mean, unit variance copy; `None` for a constant series.
pub fn standardize(values: &[f64]) -> Option<Vec<f64>> {
    let center = mean(values);
    let spread = std_dev(values);
    (spread > 0.0).then(|| values.iter().map(|v| (v - center) / spread).collect())
}
