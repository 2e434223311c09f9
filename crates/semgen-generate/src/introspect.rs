use crate::compiler::{CompiledEquation, CompiledModel, Unit};
use crate::expr::{HookKind, HookSite};
use crate::model::TuningConfig;
use crate::params::{ParameterStore, RunStatistics};

/// Render every equation with its hooks replaced by the parameters currently
/// held in `store`, then a statistics block when anything was drawn.
pub fn render_realized_model(
    compiled: &CompiledModel,
    store: &ParameterStore,
    tuning: &TuningConfig,
) -> String {
    let mut lines: Vec<String> = compiled
        .equations()
        .iter()
        .map(|equation| realize_equation(equation, store, tuning))
        .collect();

    lines.extend(stats_lines(store.statistics()));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn realize_equation(
    equation: &CompiledEquation,
    store: &ParameterStore,
    tuning: &TuningConfig,
) -> String {
    let source = equation.source.as_str();
    let (body, assignment) = match &equation.unit {
        Unit::Ready(unit) => (splice_hooks(source, &unit.hooks, store, tuning), unit.assignment),
        // Not compiled, so there is nothing to substitute.
        Unit::Invalid(_) => (source.to_string(), false),
    };

    if assignment {
        body.trim().to_string()
    } else {
        format!("{} = {}", equation.target, body.trim())
    }
}

fn splice_hooks(
    source: &str,
    hooks: &[HookSite],
    store: &ParameterStore,
    tuning: &TuningConfig,
) -> String {
    let mut sites: Vec<&HookSite> = hooks.iter().collect();
    sites.sort_by_key(|site| site.span.start);

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for site in sites {
        let Some(written) = source.get(site.span.start..site.span.end) else {
            continue;
        };
        out.push_str(&source[cursor..site.span.start]);
        match replacement(site, store, tuning) {
            Some(text) => out.push_str(&text),
            None => out.push_str(written),
        }
        cursor = site.span.end;
    }
    out.push_str(&source[cursor..]);
    out
}

fn replacement(site: &HookSite, store: &ParameterStore, tuning: &TuningConfig) -> Option<String> {
    match site.kind {
        HookKind::Noise => store.noise_draw(site.ordinal).map(ToString::to_string),
        HookKind::Data => store
            .noise_draw(site.ordinal)
            .map(|draw| format!("({} + {})", tuning.data_offset, draw)),
        HookKind::Coef => store.coef_draw(site.ordinal).map(|draw| draw.value.to_string()),
    }
}

fn stats_lines(stats: &RunStatistics) -> Vec<String> {
    if stats.coef_draws == 0 && stats.noise_draws == 0 {
        return Vec::new();
    }

    let show = |range: Option<f64>| range.map_or_else(|| "n/a".to_string(), |r| r.to_string());
    let mut lines = vec![
        "Stats:".to_string(),
        format!("  Coef Range = {}", show(stats.coef_range())),
        format!("  Std Range = {}", show(stats.std_range())),
    ];
    if let Some(total) = stats.total_range() {
        lines.push(format!("  Total Scale Range = {total}"));
    }
    lines
}
