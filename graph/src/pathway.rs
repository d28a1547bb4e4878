//! Reach statistics for a drug or hand-picked set of entry points.
//!
//! Traversal is breadth-first in both directions over the full static
//! network. Results are sets, so visiting order never changes the counts.

use crate::cycles::detect_back_edges;
use crate::index::AdjacencyGraph;
use mechanet_core::model::{DrugEntry, NodeCategory, NodeRole};
use mechanet_core::Catalog;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    pub node_id: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl EntryPoint {
    pub fn enabled(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            enabled: true,
        }
    }

    pub fn disabled(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            enabled: false,
        }
    }
}

const fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PathwayConfig {
    #[serde(default)]
    pub entry_points: Vec<EntryPoint>,
    /// Hop limit in each direction; `None` walks the whole component.
    #[serde(default)]
    pub max_depth: Option<usize>,
}

impl PathwayConfig {
    pub fn new(entry_points: impl IntoIterator<Item = EntryPoint>) -> Self {
        Self {
            entry_points: entry_points.into_iter().collect(),
            max_depth: None,
        }
    }

    pub fn for_drug(drug: &DrugEntry) -> Self {
        Self::new(drug.targets.iter().cloned().map(EntryPoint::enabled))
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PathwayStats {
    pub entry_points: Vec<String>,
    pub downstream: Vec<String>,
    pub upstream: Vec<String>,
    pub downstream_reach: usize,
    pub upstream_reach: usize,
    pub by_role: BTreeMap<NodeRole, usize>,
    pub by_category: BTreeMap<NodeCategory, usize>,
    pub by_module: BTreeMap<String, usize>,
    /// Feedback edges whose endpoints both lie in the reached region.
    pub feedback_loops_touched: usize,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Downstream,
    Upstream,
}

pub fn compute_pathway_stats(
    graph: &AdjacencyGraph,
    catalog: &Catalog,
    config: &PathwayConfig,
) -> PathwayStats {
    let mut entries = BTreeSet::new();
    for entry in config.entry_points.iter().filter(|entry| entry.enabled) {
        if graph.contains(&entry.node_id) {
            entries.insert(entry.node_id.as_str());
        } else {
            tracing::warn!(node = %entry.node_id, "skipping unknown pathway entry point");
        }
    }

    if entries.is_empty() {
        return PathwayStats::default();
    }

    let downstream = reach(graph, &entries, config.max_depth, Direction::Downstream);
    let upstream = reach(graph, &entries, config.max_depth, Direction::Upstream);

    let mut by_role = BTreeMap::new();
    let mut by_category = BTreeMap::new();
    let mut by_module = BTreeMap::new();
    for node in downstream.iter().filter_map(|id| catalog.node(id)) {
        for role in &node.roles {
            *by_role.entry(*role).or_insert(0) += 1;
        }
        *by_category.entry(node.category).or_insert(0) += 1;
        *by_module.entry(node.module.clone()).or_insert(0) += 1;
    }

    let region: BTreeSet<&str> = entries
        .iter()
        .copied()
        .chain(downstream.iter().copied())
        .chain(upstream.iter().copied())
        .collect();
    let back_edges = detect_back_edges(graph);
    let feedback_loops_touched = graph
        .edges()
        .iter()
        .filter(|edge| back_edges.contains(&edge.id))
        .filter(|edge| {
            region.contains(edge.source.as_str()) && region.contains(edge.target.as_str())
        })
        .count();

    tracing::debug!(
        entries = entries.len(),
        downstream = downstream.len(),
        upstream = upstream.len(),
        "pathway statistics computed"
    );

    PathwayStats {
        entry_points: entries.iter().map(|id| id.to_string()).collect(),
        downstream_reach: downstream.len(),
        upstream_reach: upstream.len(),
        downstream: downstream.into_iter().map(str::to_string).collect(),
        upstream: upstream.into_iter().map(str::to_string).collect(),
        by_role,
        by_category,
        by_module,
        feedback_loops_touched,
    }
}

/// Nodes reachable from `entries`, excluding the entries themselves.
fn reach<'a>(
    graph: &'a AdjacencyGraph,
    entries: &BTreeSet<&'a str>,
    max_depth: Option<usize>,
    direction: Direction,
) -> BTreeSet<&'a str> {
    let mut visited: BTreeSet<&str> = entries.clone();
    let mut reached = BTreeSet::new();
    let mut queue: VecDeque<(&str, usize)> = entries.iter().map(|id| (*id, 0)).collect();

    while let Some((node_id, depth)) = queue.pop_front() {
        if max_depth.is_some_and(|max| depth >= max) {
            continue;
        }
        let neighbors: Vec<&str> = match direction {
            Direction::Downstream => graph.successors(node_id).map(|(id, _)| id).collect(),
            Direction::Upstream => graph.predecessors(node_id).map(|(id, _)| id).collect(),
        };
        for neighbor in neighbors {
            if visited.insert(neighbor) {
                reached.insert(neighbor);
                queue.push_back((neighbor, depth + 1));
            }
        }
    }

    reached
}

#[cfg(test)]
mod tests {
    use super::*;
    use mechanet_core::model::{EdgeRelation, MechanisticEdge, MechanisticNode, NodeModule};

    fn chain_catalog() -> Catalog {
        let node = |id: &str| MechanisticNode::new(id, id.to_uppercase(), NodeCategory::State, "m");
        Catalog::new(
            vec![NodeModule::new("m", "M")],
            vec![node("a"), node("b"), node("c"), node("d")],
            vec![
                MechanisticEdge::new("ab", "a", "b", EdgeRelation::Increases),
                MechanisticEdge::new("bc", "b", "c", EdgeRelation::Increases),
                MechanisticEdge::new("cd", "c", "d", EdgeRelation::Increases),
            ],
            Vec::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_max_depth_limits_reach() {
        let catalog = chain_catalog();
        let graph = AdjacencyGraph::from_catalog(&catalog);
        let config = PathwayConfig::new([EntryPoint::enabled("a")]).with_max_depth(1);

        let stats = compute_pathway_stats(&graph, &catalog, &config);
        assert_eq!(stats.downstream, ["b"]);
        assert_eq!(stats.upstream_reach, 0);
    }

    #[test]
    fn test_disabled_entries_are_ignored() {
        let catalog = chain_catalog();
        let graph = AdjacencyGraph::from_catalog(&catalog);
        let config = PathwayConfig::new([EntryPoint::disabled("a")]);

        assert_eq!(compute_pathway_stats(&graph, &catalog, &config), PathwayStats::default());
    }
}
