use std::fs::File;
use std::path::Path;
use std::time::Instant;

use semgen_core::{DataType, ModelDefinition};
use tracing::{info, warn};

use crate::dataset::Dataset;
use crate::direction::{DirectionTest, UNDETERMINED_THRESHOLD, direction_test};
use crate::errors::EvalError;
use crate::metrics::{
    DirectionMethod, DirectionSummary, EdgeDirection, METRICS_VERSION, MetricsReport,
    PerformanceMetrics, Verdict, WarningItem, collect_column_stats,
};
use crate::model::{EvaluateOptions, EvaluationResult};
use crate::report::render_report;

/// Score generated datasets against the causal structure of their model.
#[derive(Debug, Clone)]
pub struct EvaluationEngine {
    options: EvaluateOptions,
}

impl EvaluationEngine {
    pub fn new(options: EvaluateOptions) -> Self {
        Self { options }
    }

    pub fn run(
        &self,
        model: &ModelDefinition,
        model_name: Option<&str>,
        dataset_path: &Path,
    ) -> Result<EvaluationResult, EvalError> {
        let test = direction_test(&self.options)?;
        let total_start = Instant::now();
        let load_start = Instant::now();

        let mut warnings = Vec::new();
        let dataset = Dataset::parse(
            File::open(dataset_path)?,
            self.options.strict,
            &mut warnings,
        )?;
        let load_ms = load_start.elapsed().as_millis();

        info!(
            dataset = %dataset_path.display(),
            rows = dataset.rows(),
            columns = dataset.columns().len(),
            "evaluation started"
        );

        let evaluate_start = Instant::now();
        let directions = evaluate_model_directions(&dataset, model, test.as_ref())?;
        for edge in &directions {
            if let (Verdict::Skipped, Some(note)) = (edge.verdict, &edge.note) {
                warnings.push(WarningItem {
                    code: "edge_skipped".to_string(),
                    path: format!("{}->{}", edge.parent, edge.child),
                    message: note.clone(),
                    hint: None,
                });
            }
        }
        let evaluate_ms = evaluate_start.elapsed().as_millis();

        warnings.sort_by(|a, b| (&a.path, &a.code).cmp(&(&b.path, &b.code)));

        let metrics = MetricsReport {
            metrics_version: METRICS_VERSION.to_string(),
            dataset: dataset_path.display().to_string(),
            model_name: model_name.map(str::to_string),
            rows: dataset.rows() as u64,
            method: DirectionMethod {
                name: test.name().to_string(),
                power: self.options.power,
                n_train: self.options.n_train,
                sensitivity: self.options.sensitivity,
            },
            column_stats: collect_column_stats(&dataset),
            directions: DirectionSummary::from_edges(&directions),
            warnings,
            performance: PerformanceMetrics {
                load_ms,
                evaluate_ms,
                total_ms: total_start.elapsed().as_millis(),
            },
        };

        let report = render_report(&metrics, &directions);
        let out_dir = match &self.options.out_dir {
            Some(dir) => dir.clone(),
            None => dataset_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };
        std::fs::create_dir_all(&out_dir)?;

        let metrics_path = out_dir.join("metrics.json");
        std::fs::write(&metrics_path, serde_json::to_vec_pretty(&metrics)?)?;

        let directions_path = out_dir.join("directions.json");
        std::fs::write(&directions_path, serde_json::to_vec_pretty(&directions)?)?;

        let report_path = out_dir.join("report.md");
        std::fs::write(&report_path, report.as_bytes())?;

        info!(
            edges = metrics.directions.edges,
            agree = metrics.directions.agree,
            reversed = metrics.directions.reversed,
            "evaluation finished"
        );

        Ok(EvaluationResult {
            out_dir,
            metrics_path,
            report_path,
            directions_path,
            metrics,
            directions,
            report,
        })
    }
}

/// Score every declared parent -> child edge whose endpoints are numeric
/// columns of the dataset. Edges that cannot be scored are kept as
/// [`Verdict::Skipped`] with a note. A sensitivity outside its range is
/// fatal rather than a per-edge skip.
pub fn evaluate_model_directions(
    dataset: &Dataset,
    model: &ModelDefinition,
    test: &dyn DirectionTest,
) -> Result<Vec<EdgeDirection>, EvalError> {
    let mut edges = Vec::new();
    for child in &model.variables {
        for parent in &child.parents {
            let skipped = |note: String| EdgeDirection {
                parent: parent.clone(),
                child: child.name.clone(),
                score: None,
                verdict: Verdict::Skipped,
                note: Some(note),
            };

            let categorical = [parent.as_str(), child.name.as_str()]
                .into_iter()
                .find(|name| {
                    model
                        .variable(name)
                        .is_some_and(|spec| spec.data_type == Some(DataType::Categorical))
                });
            if let Some(name) = categorical {
                edges.push(skipped(format!("'{name}' is categorical")));
                continue;
            }

            let (Some(a), Some(b)) = (dataset.column(parent), dataset.column(&child.name)) else {
                edges.push(skipped("endpoint is not a dataset column".to_string()));
                continue;
            };

            match test.score(a, b) {
                Ok(score) => edges.push(EdgeDirection {
                    parent: parent.clone(),
                    child: child.name.clone(),
                    score: Some(score),
                    verdict: classify(score),
                    note: None,
                }),
                Err(err @ EvalError::SensitivityRange(_)) => return Err(err),
                Err(err) => {
                    warn!(parent = %parent, child = %child.name, error = %err, "edge not scored");
                    edges.push(skipped(err.to_string()));
                }
            }
        }
    }
    Ok(edges)
}

fn classify(score: f64) -> Verdict {
    if !score.is_finite() || score.abs() < UNDETERMINED_THRESHOLD {
        Verdict::Undetermined
    } else if score > 0.0 {
        Verdict::Agrees
    } else {
        Verdict::Reversed
    }
}
