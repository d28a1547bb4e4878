use crate::convert::NodeConversion;
use crate::layering::Position;
use crate::view::ViewState;
use mechanet_core::model::{EdgeId, EdgeRelation, PSEUDO_PREFIX};
use mechanet_core::Catalog;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStyle {
    Direct,
    /// One end is a collapsed module.
    Aggregated,
    /// Closes a cycle; drawn curved and dashed through a side lane.
    Feedback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderEdge {
    pub id: EdgeId,
    pub edge_ids: Vec<EdgeId>,
    pub source: String,
    pub target: String,
    /// Distinct relations of the bundled catalog edges, ascending.
    pub relations: Vec<EdgeRelation>,
    pub style: EdgeStyle,
    pub highlighted: bool,
    pub waypoints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointNode {
    pub id: String,
    pub edge_id: EdgeId,
    pub index: usize,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EdgeConversion {
    pub edges: Vec<RenderEdge>,
    pub waypoint_nodes: Vec<WaypointNode>,
}

impl EdgeConversion {
    pub fn edge(&self, id: &str) -> Option<&RenderEdge> {
        self.edges.iter().find(|edge| edge.id == id)
    }
}

pub fn convert_edges(
    catalog: &Catalog,
    view: &ViewState,
    conversion: &NodeConversion,
) -> EdgeConversion {
    let mut edges = Vec::with_capacity(conversion.routes.len());
    let mut waypoint_nodes = Vec::new();

    for route in &conversion.routes {
        let relations: BTreeSet<EdgeRelation> = route
            .edge_ids
            .iter()
            .filter_map(|id| catalog.edge(id))
            .map(|edge| edge.relation)
            .collect();

        let style = if route.back {
            EdgeStyle::Feedback
        } else if route.source.starts_with(PSEUDO_PREFIX) || route.target.starts_with(PSEUDO_PREFIX)
        {
            EdgeStyle::Aggregated
        } else {
            EdgeStyle::Direct
        };

        let highlighted = view.selection.touches_node(&route.source)
            || view.selection.touches_node(&route.target);

        for (index, (id, position)) in route.waypoints.iter().enumerate() {
            waypoint_nodes.push(WaypointNode {
                id: id.clone(),
                edge_id: route.id.clone(),
                index,
                position: *position,
            });
        }

        edges.push(RenderEdge {
            id: route.id.clone(),
            edge_ids: route.edge_ids.clone(),
            source: route.source.clone(),
            target: route.target.clone(),
            relations: relations.into_iter().collect(),
            style,
            highlighted,
            waypoints: route.waypoints.iter().map(|(id, _)| id.clone()).collect(),
        });
    }

    tracing::debug!(
        edges = edges.len(),
        waypoints = waypoint_nodes.len(),
        "edge conversion finished"
    );

    EdgeConversion {
        edges,
        waypoint_nodes,
    }
}
