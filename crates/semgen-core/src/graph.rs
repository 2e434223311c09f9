use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::ModelDefinition;

/// Summary of parent graph structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentGraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Parent reference that points at a variable declared later (or itself).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardReference {
    pub variable: String,
    pub parent: String,
}

/// Report for parent dependency ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentGraphReport {
    pub summary: ParentGraphSummary,
    pub topo_order: Option<Vec<String>>,
    pub cycle: Option<Vec<String>>,
    pub forward_references: Vec<ForwardReference>,
}

/// Build a deterministic parent dependency report for a model.
pub fn build_parent_graph_report(model: &ModelDefinition) -> ParentGraphReport {
    let graph = build_adjacency(model);
    let nodes = graph.len();
    let edges = graph.values().map(|targets| targets.len()).sum();
    let summary = ParentGraphSummary { nodes, edges };
    let forward_references = collect_forward_references(model);

    match toposort(&graph) {
        Ok(order) => ParentGraphReport {
            summary,
            topo_order: Some(order),
            cycle: None,
            forward_references,
        },
        Err(cycle) => ParentGraphReport {
            summary,
            topo_order: None,
            cycle: Some(cycle),
            forward_references,
        },
    }
}

fn build_adjacency(model: &ModelDefinition) -> BTreeMap<String, BTreeSet<String>> {
    let declared: BTreeSet<&str> = model.variables.iter().map(|var| var.name.as_str()).collect();
    let mut graph: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for variable in &model.variables {
        graph.entry(variable.name.clone()).or_default();
        for parent in &variable.parents {
            if !declared.contains(parent.as_str()) {
                continue;
            }
            graph
                .entry(parent.clone())
                .or_default()
                .insert(variable.name.clone());
        }
    }

    graph
}

fn collect_forward_references(model: &ModelDefinition) -> Vec<ForwardReference> {
    let mut references = Vec::new();
    for (idx, variable) in model.variables.iter().enumerate() {
        for parent in &variable.parents {
            if let Some(position) = model.position(parent)
                && position >= idx
            {
                references.push(ForwardReference {
                    variable: variable.name.clone(),
                    parent: parent.clone(),
                });
            }
        }
    }
    references
}

fn toposort(graph: &BTreeMap<String, BTreeSet<String>>) -> Result<Vec<String>, Vec<String>> {
    let mut indegree: BTreeMap<String, usize> = BTreeMap::new();

    for node in graph.keys() {
        indegree.entry(node.clone()).or_insert(0);
    }

    for targets in graph.values() {
        for target in targets {
            *indegree.entry(target.clone()).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<String> = indegree
        .iter()
        .filter_map(|(node, count)| if *count == 0 { Some(node.clone()) } else { None })
        .collect();

    let mut order = Vec::with_capacity(graph.len());

    while let Some(node) = ready.pop_first() {
        order.push(node.clone());

        if let Some(targets) = graph.get(&node) {
            for target in targets {
                if let Some(count) = indegree.get_mut(target) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(target.clone());
                    }
                }
            }
        }
    }

    if order.len() == graph.len() {
        Ok(order)
    } else {
        let cycle_nodes: Vec<String> = indegree
            .into_iter()
            .filter_map(|(node, count)| if count > 0 { Some(node) } else { None })
            .collect();
        Err(cycle_nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VariableSpec;

    #[test]
    fn toposort_orders_parents_first() {
        let model = ModelDefinition::from_pairs(vec![
            (VariableSpec::new("Z", &[]), "noise()"),
            (VariableSpec::new("A", &["Z"]), "Z + noise()"),
            (VariableSpec::new("B", &["A", "Z"]), "A * Z"),
        ]);

        let report = build_parent_graph_report(&model);
        assert_eq!(report.summary.nodes, 3);
        assert_eq!(report.summary.edges, 3);
        let order = report.topo_order.expect("expected toposort");
        let position = |name: &str| order.iter().position(|item| item == name).unwrap();
        assert!(position("Z") < position("A"));
        assert!(position("A") < position("B"));
        assert!(report.forward_references.is_empty());
    }

    #[test]
    fn toposort_reports_cycle() {
        let model = ModelDefinition::from_pairs(vec![
            (VariableSpec::new("A", &["B"]), "B"),
            (VariableSpec::new("B", &["A"]), "A"),
        ]);

        let report = build_parent_graph_report(&model);
        assert!(report.topo_order.is_none());
        let cycle = report.cycle.expect("expected cycle");
        assert!(cycle.contains(&"A".to_string()));
        assert!(cycle.contains(&"B".to_string()));
        assert_eq!(
            report.forward_references,
            vec![ForwardReference {
                variable: "A".to_string(),
                parent: "B".to_string(),
            }]
        );
    }
}
