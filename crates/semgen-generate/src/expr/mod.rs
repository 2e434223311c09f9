//! Equation micro-language: lexing, parsing and evaluation.
//!
//! Equations are arithmetic expressions over earlier variables, numeric
//! literals, a math function namespace and the parameter hooks `noise()`,
//! `coef()` and `data()`. Each equation is parsed once into an [`Expr`] tree
//! which is then evaluated once per sample against an explicit environment.

mod ast;
mod error;
mod functions;
mod lexer;
mod parser;

pub use ast::{BinaryOp, Expr, HookKind, HookSite, Hooks, Span, UnaryOp};
pub use error::{CompilationError, EvalError};
pub use functions::MathFunction;
pub use lexer::{Token, TokenKind, tokenize};
pub use parser::{HookOrdinals, ParsedEquation, Scope, parse_equation, split_assignment};
