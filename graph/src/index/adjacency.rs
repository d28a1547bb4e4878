use mechanet_core::Catalog;
use std::collections::{BTreeMap, BTreeSet};

/// Directed edge keyed by its id; ordering is (source, target, id).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub id: String,
}

/// Ordered adjacency list graph over string ids.
///
/// Every iteration order is ascending by id so traversals are reproducible.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyGraph {
    vertices: BTreeSet<String>,
    outgoing: BTreeMap<String, BTreeSet<(String, String)>>,
    incoming: BTreeMap<String, BTreeSet<(String, String)>>,
}

impl AdjacencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full static network. Edges naming unknown nodes are dropped with a warning.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut graph = Self::new();
        for node in catalog.nodes() {
            graph.add_vertex(node.id.clone());
        }
        for edge in catalog.edges() {
            if !catalog.contains_node(&edge.source) || !catalog.contains_node(&edge.target) {
                tracing::warn!(
                    edge = %edge.id,
                    source = %edge.source,
                    target = %edge.target,
                    "dropping edge with unknown endpoint"
                );
                continue;
            }
            graph.add_edge(edge.id.clone(), edge.source.clone(), edge.target.clone());
        }
        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "adjacency index built"
        );
        graph
    }

    pub fn add_vertex(&mut self, id: impl Into<String>) {
        self.vertices.insert(id.into());
    }

    pub fn add_edge(
        &mut self,
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) {
        let (id, source, target) = (id.into(), source.into(), target.into());
        self.vertices.insert(source.clone());
        self.vertices.insert(target.clone());
        self.outgoing
            .entry(source.clone())
            .or_default()
            .insert((target.clone(), id.clone()));
        self.incoming.entry(target).or_default().insert((source, id));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.vertices.contains(id)
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = &str> {
        self.vertices.iter().map(String::as_str)
    }

    /// Outgoing `(target, edge_id)` pairs, ascending.
    pub fn successors(&self, id: &str) -> impl Iterator<Item = (&str, &str)> {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .map(|(target, edge)| (target.as_str(), edge.as_str()))
    }

    /// Incoming `(source, edge_id)` pairs, ascending.
    pub fn predecessors(&self, id: &str) -> impl Iterator<Item = (&str, &str)> {
        self.incoming
            .get(id)
            .into_iter()
            .flatten()
            .map(|(source, edge)| (source.as_str(), edge.as_str()))
    }

    pub fn edges(&self) -> Vec<GraphEdge> {
        let mut edges: Vec<GraphEdge> = self
            .outgoing
            .iter()
            .flat_map(|(source, targets)| {
                targets.iter().map(move |(target, id)| GraphEdge {
                    source: source.clone(),
                    target: target.clone(),
                    id: id.clone(),
                })
            })
            .collect();
        edges.sort();
        edges
    }

    pub fn edge_count(&self) -> usize {
        self.outgoing.values().map(|v| v.len()).sum()
    }

    pub fn node_count(&self) -> usize {
        self.vertices.len()
    }
}
