use thiserror::Error;

/// An equation could not be compiled.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid equation '{equation}' at offset {position}: {message}")]
pub struct CompilationError {
    pub equation: String,
    pub position: usize,
    pub message: String,
}

impl CompilationError {
    pub fn new(equation: &str, position: usize, message: impl Into<String>) -> Self {
        Self {
            equation: equation.to_string(),
            position,
            message: message.into(),
        }
    }
}

/// Failure while evaluating a compiled equation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("name '{0}' is not defined")]
    UndefinedVariable(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("math domain error in {function}")]
    MathDomain { function: &'static str },
    #[error("numerical result out of range in {function}")]
    Overflow { function: &'static str },
    #[error("parameter draw failed: {0}")]
    Hook(String),
}
