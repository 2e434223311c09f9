use crate::metrics::{EdgeDirection, MetricsReport, Verdict};

/// Render a deterministic markdown report from metrics and edge directions.
pub fn render_report(metrics: &MetricsReport, directions: &[EdgeDirection]) -> String {
    let mut lines = Vec::new();

    lines.push("# SEM Dataset Evaluation Report".to_string());
    lines.push(String::new());
    lines.push("## Run summary".to_string());
    lines.push(format!("- dataset: {}", metrics.dataset));
    if let Some(name) = &metrics.model_name {
        lines.push(format!("- model: {name}"));
    }
    lines.push(format!("- rows: {}", metrics.rows));
    lines.push(format!(
        "- method: {} (power {})",
        metrics.method.name, metrics.method.power
    ));
    if let Some(sensitivity) = metrics.method.sensitivity {
        lines.push(format!("- sensitivity: {sensitivity}"));
    }
    lines.push(String::new());

    lines.push("## Column statistics".to_string());
    lines.push("| column | count | mean | std_dev | min | max |".to_string());
    lines.push("| --- | --- | --- | --- | --- | --- |".to_string());
    for stats in &metrics.column_stats {
        lines.push(format!(
            "| {} | {} | {:.4} | {:.4} | {:.4} | {:.4} |",
            stats.name, stats.count, stats.mean, stats.std_dev, stats.min, stats.max
        ));
    }
    lines.push(String::new());

    lines.push("## Edge directions".to_string());
    lines.push("| edge | score | verdict |".to_string());
    lines.push("| --- | --- | --- |".to_string());
    for edge in directions {
        let score = edge
            .score
            .map(|score| format!("{score:.6e}"))
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!(
            "| {} -> {} | {} | {} |",
            edge.parent,
            edge.child,
            score,
            edge.verdict.as_str()
        ));
    }
    lines.push(String::new());

    if !metrics.warnings.is_empty() {
        lines.push("## Warnings".to_string());
        for warning in &metrics.warnings {
            let hint = warning
                .hint
                .as_ref()
                .map(|hint| format!(" (hint: {hint})"))
                .unwrap_or_default();
            lines.push(format!("- {}: {}{}", warning.path, warning.message, hint));
        }
        lines.push(String::new());
    }

    lines.push("## Recommendations".to_string());
    lines.extend(recommendations(metrics, directions));
    lines.join("\n")
}

fn recommendations(metrics: &MetricsReport, directions: &[EdgeDirection]) -> Vec<String> {
    let mut lines = Vec::new();
    if metrics.directions.reversed > 0 {
        lines.push(
            "- reversed edges: check noise distributions; Gaussian noise hides direction."
                .to_string(),
        );
    }
    if metrics.directions.undetermined > 0 {
        lines.push(
            "- undetermined edges: generate more samples or raise coefficients.".to_string(),
        );
    }
    if directions
        .iter()
        .any(|edge| edge.verdict == Verdict::Skipped)
    {
        lines.push("- skipped edges involve latent or categorical variables.".to_string());
    }
    if lines.is_empty() {
        lines.push("- every scored edge agrees with the model.".to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{DirectionMethod, DirectionSummary, PerformanceMetrics};

    fn metrics(directions: &[EdgeDirection]) -> MetricsReport {
        MetricsReport {
            metrics_version: "0.1".to_string(),
            dataset: "data.csv".to_string(),
            model_name: Some("chain".to_string()),
            rows: 10,
            method: DirectionMethod {
                name: "pairwise_lingam".to_string(),
                power: 1.0,
                n_train: 100,
                sensitivity: None,
            },
            column_stats: Vec::new(),
            directions: DirectionSummary::from_edges(directions),
            warnings: Vec::new(),
            performance: PerformanceMetrics {
                load_ms: 0,
                evaluate_ms: 0,
                total_ms: 0,
            },
        }
    }

    #[test]
    fn renders_edges_and_recommendations() {
        let directions = vec![EdgeDirection {
            parent: "A".to_string(),
            child: "B".to_string(),
            score: Some(-0.25),
            verdict: Verdict::Reversed,
            note: None,
        }];
        let report = render_report(&metrics(&directions), &directions);

        assert!(report.starts_with("# SEM Dataset Evaluation Report"));
        assert!(report.contains("- model: chain"));
        assert!(report.contains("| A -> B | -2.500000e-1 | reversed |"));
        assert!(report.contains("- reversed edges:"));
    }

    #[test]
    fn clean_run_gets_single_recommendation() {
        let report = render_report(&metrics(&[]), &[]);
        assert!(report.ends_with("- every scored edge agrees with the model."));
    }
}
