use thiserror::Error;

/// Errors emitted by the evaluation engine.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),
    #[error("not enough data: {0}")]
    InsufficientData(String),
    #[error("sensitivity {0} is outside the range [1, 10]")]
    SensitivityRange(f64),
    #[error(transparent)]
    Model(#[from] semgen_core::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
