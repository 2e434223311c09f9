use thiserror::Error;

use crate::expr::{CompilationError, EvalError};

/// Errors emitted by the generation engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Core(#[from] semgen_core::Error),
    #[error(transparent)]
    Compilation(#[from] CompilationError),
    #[error("equation for '{variable}' failed: {source} (equation: {equation})")]
    Equation {
        variable: String,
        equation: String,
        #[source]
        source: EvalError,
    },
    #[error("variable '{0}' was never assigned by any equation")]
    Unassigned(String),
    #[error("no parameters drawn yet; sample at least once first")]
    NotSampled,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
