use thiserror::Error;

/// Core error type shared across semgen crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The model violates structural invariants.
    #[error("invalid model: {0}")]
    InvalidModel(String),
    /// A model document could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results returned by semgen crates.
pub type Result<T> = std::result::Result<T, Error>;
