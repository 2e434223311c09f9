//! Synthetic data generation from structural equation models.
//!
//! A model pairs each declared variable with an equation in a small
//! arithmetic language. Equations are compiled once; every sample is one
//! evaluation pass in declaration order. The hooks `noise()`, `coef()` and
//! `data()` draw random parameters the first time each occurrence is reached
//! and reuse them for every later sample until a reset.

pub mod compiler;
pub mod engine;
pub mod errors;
pub mod expr;
pub mod introspect;
pub mod model;
pub mod output;
pub mod params;

pub use compiler::{CompiledModel, compile_model};
pub use engine::{Generator, GeneratorBuilder, Sample, SampleStream};
pub use errors::GenerationError;
pub use model::{DatasetReport, GenerateOptions, TuningConfig};
pub use output::{WriteSummary, write_samples_csv};
pub use params::{CoefDraw, DistributionKind, NoiseDraw, ParameterStore, RunStatistics};
