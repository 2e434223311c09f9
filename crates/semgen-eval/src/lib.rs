//! Evaluation of generated SEM datasets: column statistics and pairwise
//! causal direction checks against the model's declared edges.

pub mod dataset;
pub mod direction;
pub mod engine;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod report;

pub use dataset::Dataset;
pub use direction::{
    DirectionTest, IndependenceOutcome, IndependenceTest, NonLinearDirection, PairwiseLingam,
    RandomFourierTest, direction_test, knn_residuals,
};
pub use engine::{EvaluationEngine, evaluate_model_directions};
pub use errors::EvalError;
pub use metrics::{ColumnStats, EdgeDirection, MetricsReport, Verdict, collect_column_stats};
pub use model::{EvaluateOptions, EvaluationResult};
pub use report::render_report;
