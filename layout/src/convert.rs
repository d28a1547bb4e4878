//! Node conversion: visibility filtering, module contraction and placement.

use crate::layering::{self, Position};
use crate::view::{ModuleVisibility, ViewState};
use mechanet_core::config::LayoutConfig;
use mechanet_core::model::{
    BoundaryDirection, EdgeId, EffectDirection, EffectMagnitude, MechanisticNode, NodeCategory,
    NodeId, NodeRole, VariantKey, PSEUDO_PREFIX, WAYPOINT_PREFIX,
};
use mechanet_core::Catalog;
use mechanet_graph::{detect_back_edges, AdjacencyGraph};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    Normal,
    Muted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderNode {
    pub id: NodeId,
    pub label: String,
    pub category: NodeCategory,
    pub module: String,
    pub roles: Vec<NodeRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundary: Option<BoundaryDirection>,
    pub emphasis: Emphasis,
    /// Owns the selected or hovered variant.
    pub highlighted: bool,
    pub expanded: bool,
}

/// Stand-in for a module switched off, wired to the visible nodes it touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PseudoNode {
    pub id: String,
    pub module: String,
    pub label: String,
    pub members: Vec<NodeId>,
    pub connects_from: Vec<NodeId>,
    pub connects_to: Vec<NodeId>,
}

/// Child of an expanded boundary node, stacked below its parent in a
/// `node_width` by `variant_gap` box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantNode {
    pub key: VariantKey,
    pub label: String,
    pub effect: EffectDirection,
    pub magnitude: EffectMagnitude,
    pub selected: bool,
    pub hovered: bool,
    pub position: Position,
}

/// A rendered edge before styling: endpoints after contraction plus its waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRoute {
    /// Smallest id among the bundled catalog edges.
    pub id: EdgeId,
    pub edge_ids: Vec<EdgeId>,
    pub source: String,
    pub target: String,
    pub back: bool,
    pub waypoints: Vec<(String, Position)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NodeConversion {
    pub nodes: Vec<RenderNode>,
    pub pseudo_nodes: Vec<PseudoNode>,
    pub variant_nodes: Vec<VariantNode>,
    pub excluded_edges: Vec<EdgeId>,
    /// Real and pseudo nodes only; waypoints carry their own positions.
    pub node_positions: BTreeMap<String, Position>,
    pub back_edges: Vec<EdgeId>,
    pub routes: Vec<EdgeRoute>,
}

impl NodeConversion {
    pub fn layer_of(&self, id: &str) -> Option<usize> {
        self.node_positions.get(id).map(|position| position.layer)
    }

    pub fn pseudo_node(&self, module_id: &str) -> Option<&PseudoNode> {
        self.pseudo_nodes.iter().find(|pseudo| pseudo.module == module_id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|node| node.id == id)
    }
}

pub fn pseudo_id(module_id: &str) -> String {
    format!("{PSEUDO_PREFIX}{module_id}")
}

fn waypoint_id(edge_id: &str, index: usize) -> String {
    format!("{WAYPOINT_PREFIX}{edge_id}:{index}")
}

/// What an edge endpoint becomes after module contraction.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Endpoint {
    Rendered(String),
    Pseudo(String),
    Hidden,
}

impl Endpoint {
    fn render_id(&self) -> Option<String> {
        match self {
            Endpoint::Rendered(id) => Some(id.clone()),
            Endpoint::Pseudo(module) => Some(pseudo_id(module)),
            Endpoint::Hidden => None,
        }
    }
}

pub fn convert_nodes(catalog: &Catalog, view: &ViewState, config: &LayoutConfig) -> NodeConversion {
    let visibility = |node: &MechanisticNode| view.visibility(&node.module);

    // Pass 1: boundary crossings of hidden modules.
    let mut crossings: BTreeMap<&str, (BTreeSet<&str>, BTreeSet<&str>)> = BTreeMap::new();
    let mut live_edges = Vec::new();
    for edge in catalog.edges() {
        let (Some(source), Some(target)) = (catalog.node(&edge.source), catalog.node(&edge.target))
        else {
            tracing::warn!(
                edge = %edge.id,
                source = %edge.source,
                target = %edge.target,
                "dropping edge with unknown endpoint"
            );
            continue;
        };
        live_edges.push((edge, source, target));

        match (visibility(source).is_rendered(), visibility(target).is_rendered()) {
            (true, false) => {
                crossings
                    .entry(target.module.as_str())
                    .or_default()
                    .0
                    .insert(source.id.as_str());
            }
            (false, true) => {
                crossings
                    .entry(source.module.as_str())
                    .or_default()
                    .1
                    .insert(target.id.as_str());
            }
            _ => {}
        }
    }

    let endpoint = |node: &MechanisticNode| {
        if visibility(node).is_rendered() {
            Endpoint::Rendered(node.id.clone())
        } else if crossings.contains_key(node.module.as_str()) {
            Endpoint::Pseudo(node.module.clone())
        } else {
            Endpoint::Hidden
        }
    };

    // Pass 2: map edges onto rendered endpoints, bundling parallels.
    let mut bundles: BTreeMap<(String, String), Vec<EdgeId>> = BTreeMap::new();
    let mut excluded_edges = Vec::new();
    for (edge, source, target) in live_edges {
        let (from, to) = (endpoint(source), endpoint(target));
        let same_pseudo = matches!((&from, &to), (Endpoint::Pseudo(a), Endpoint::Pseudo(b)) if a == b);
        match (from.render_id(), to.render_id()) {
            (Some(from), Some(to)) if !same_pseudo => {
                bundles.entry((from, to)).or_default().push(edge.id.clone());
            }
            _ => excluded_edges.push(edge.id.clone()),
        }
    }
    excluded_edges.sort();

    let nodes: Vec<RenderNode> = {
        let mut nodes: Vec<RenderNode> = catalog
            .nodes()
            .iter()
            .filter(|node| visibility(node).is_rendered())
            .map(|node| render_node(node, view))
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    };

    let pseudo_nodes: Vec<PseudoNode> = crossings
        .iter()
        .map(|(module_id, (from, to))| PseudoNode {
            id: pseudo_id(module_id),
            module: module_id.to_string(),
            label: catalog
                .module(module_id)
                .map(|module| module.label.clone())
                .unwrap_or_else(|| module_id.to_string()),
            members: catalog.module_members(module_id).to_vec(),
            connects_from: from.iter().map(|id| id.to_string()).collect(),
            connects_to: to.iter().map(|id| id.to_string()).collect(),
        })
        .collect();

    // Routing graph over rendered ids.
    let mut graph = AdjacencyGraph::new();
    for node in &nodes {
        graph.add_vertex(node.id.clone());
    }
    for pseudo in &pseudo_nodes {
        graph.add_vertex(pseudo.id.clone());
    }
    let mut routes: Vec<EdgeRoute> = bundles
        .into_iter()
        .map(|((source, target), mut edge_ids)| {
            edge_ids.sort();
            EdgeRoute {
                id: edge_ids[0].clone(),
                edge_ids,
                source,
                target,
                back: false,
                waypoints: Vec::new(),
            }
        })
        .collect();
    routes.sort_by(|a, b| a.id.cmp(&b.id));
    for route in &routes {
        graph.add_edge(route.id.clone(), route.source.clone(), route.target.clone());
    }

    let back_edges = detect_back_edges(&graph);
    let mut layer_of = layering::longest_path_layers(&graph, &back_edges);

    // Long skeleton edges get one waypoint per intermediate layer.
    let mut links: Vec<(String, String)> = Vec::new();
    let mut chains: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for route in routes.iter_mut() {
        route.back = back_edges.contains(&route.id);
        if route.back {
            continue;
        }
        let (Some(&from), Some(&to)) = (layer_of.get(&route.source), layer_of.get(&route.target))
        else {
            continue;
        };
        let mut previous = route.source.clone();
        let mut chain = Vec::new();
        for (index, layer) in (from + 1..to).enumerate() {
            let id = waypoint_id(&route.id, index);
            layer_of.insert(id.clone(), layer);
            links.push((previous, id.clone()));
            previous = id.clone();
            chain.push(id);
        }
        links.push((previous, route.target.clone()));
        chains.insert(route.id.clone(), chain);
    }

    // Expanded boundary nodes keep room under their box for the variant stack.
    let stacked: BTreeMap<String, f64> = nodes
        .iter()
        .filter(|node| node.expanded)
        .filter_map(|node| {
            let variants = catalog.node(&node.id)?.variants.len();
            Some((node.id.clone(), config.variant_gap * variants as f64))
        })
        .collect();

    let ordered = layering::order_layers(&layer_of, &links, config.crossing_sweeps);
    let layering::Coordinates {
        mut positions,
        extent,
        layer_offsets,
    } = layering::assign_coordinates(&ordered, config, &stacked);
    let (node_main, _) = layering::box_spans(config);

    let mut lane = 0usize;
    for route in routes.iter_mut() {
        if route.back {
            let (Some(&from), Some(&to)) =
                (layer_of.get(&route.source), layer_of.get(&route.target))
            else {
                continue;
            };
            lane += 1;
            let cross = extent + config.lane_gap * lane as f64;
            let layers: Vec<usize> = if from >= to {
                (to..=from).rev().collect()
            } else {
                (from..=to).collect()
            };
            route.waypoints = layers
                .into_iter()
                .enumerate()
                .map(|(index, layer)| {
                    let main =
                        layer_offsets.get(layer).copied().unwrap_or(0.0) + node_main / 2.0;
                    // Lanes sit after the last slot of every layer they pass.
                    let order = ordered.get(layer).map_or(0, Vec::len);
                    (
                        waypoint_id(&route.id, index),
                        layering::place(config.direction, main, cross, layer, order),
                    )
                })
                .collect();
        } else if let Some(chain) = chains.get(&route.id) {
            route.waypoints = chain
                .iter()
                .filter_map(|id| positions.remove(id).map(|position| (id.clone(), position)))
                .collect();
        }
    }
    positions.retain(|id, _| !id.starts_with(WAYPOINT_PREFIX));

    let variant_nodes = variant_children(catalog, view, config, &nodes, &positions);

    tracing::debug!(
        nodes = nodes.len(),
        pseudo_nodes = pseudo_nodes.len(),
        excluded = excluded_edges.len(),
        back_edges = back_edges.len(),
        layers = ordered.len(),
        "node conversion finished"
    );

    NodeConversion {
        nodes,
        pseudo_nodes,
        variant_nodes,
        excluded_edges,
        node_positions: positions,
        back_edges: back_edges.into_iter().collect(),
        routes,
    }
}

fn render_node(node: &MechanisticNode, view: &ViewState) -> RenderNode {
    let emphasis = match view.visibility(&node.module) {
        ModuleVisibility::Partial => Emphasis::Muted,
        _ => Emphasis::Normal,
    };
    RenderNode {
        id: node.id.clone(),
        label: node.label.clone(),
        category: node.category,
        module: node.module.clone(),
        roles: node.roles.clone(),
        boundary: node.boundary,
        emphasis,
        highlighted: view.selection.touches_node(&node.id),
        expanded: is_expanded(node, view),
    }
}

fn is_expanded(node: &MechanisticNode, view: &ViewState) -> bool {
    if !node.is_boundary() || node.variants.is_empty() {
        return false;
    }
    match node.boundary {
        Some(BoundaryDirection::Input) => view.expand_inputs,
        Some(BoundaryDirection::Output) => view.expand_outputs,
        None => false,
    }
}

fn variant_children(
    catalog: &Catalog,
    view: &ViewState,
    config: &LayoutConfig,
    nodes: &[RenderNode],
    positions: &BTreeMap<String, Position>,
) -> Vec<VariantNode> {
    let mut children = Vec::new();
    for render in nodes.iter().filter(|node| node.expanded) {
        let (Some(node), Some(parent)) = (catalog.node(&render.id), positions.get(&render.id))
        else {
            continue;
        };
        for (index, variant) in node.variants.iter().enumerate() {
            let key = VariantKey::new(node.id.clone(), variant.id.clone());
            children.push(VariantNode {
                selected: view.selection.is_selected(&key),
                hovered: view.selection.is_hovered(&key),
                key,
                label: variant.label.clone(),
                effect: variant.effect,
                magnitude: variant.magnitude,
                position: Position {
                    x: parent.x,
                    y: parent.y + config.node_height + config.variant_gap * index as f64,
                    layer: parent.layer,
                    order: parent.order,
                },
            });
        }
    }
    children
}

#[cfg(test)]
mod tests {
    use super::*;
    use mechanet_core::model::{EdgeRelation, MechanisticEdge, NodeModule};

    fn node(id: &str, module: &str) -> MechanisticNode {
        MechanisticNode::new(id, id.to_uppercase(), NodeCategory::State, module)
    }

    fn edge(id: &str, source: &str, target: &str) -> MechanisticEdge {
        MechanisticEdge::new(id, source, target, EdgeRelation::Increases)
    }

    #[test]
    fn test_long_edge_gets_intermediate_waypoints() {
        let catalog = Catalog::new(
            vec![NodeModule::new("m", "M")],
            vec![node("a", "m"), node("b", "m"), node("c", "m"), node("d", "m")],
            vec![edge("ab", "a", "b"), edge("bc", "b", "c"), edge("cd", "c", "d"), edge("ad", "a", "d")],
            Vec::new(),
        )
        .unwrap();

        let conversion = convert_nodes(&catalog, &ViewState::default(), &LayoutConfig::default());
        let long = conversion.routes.iter().find(|r| r.id == "ad").unwrap();
        assert_eq!(long.waypoints.len(), 2);
        assert_eq!(long.waypoints[0].1.layer, 1);
        assert_eq!(long.waypoints[1].1.layer, 2);
        assert!(conversion.node_positions.keys().all(|id| !id.starts_with(WAYPOINT_PREFIX)));
    }

    #[test]
    fn test_back_edge_routed_through_side_lane() {
        let catalog = Catalog::new(
            vec![NodeModule::new("m", "M")],
            vec![node("a", "m"), node("b", "m"), node("c", "m")],
            vec![edge("ab", "a", "b"), edge("bc", "b", "c"), edge("ca", "c", "a")],
            Vec::new(),
        )
        .unwrap();
        let config = LayoutConfig::default();

        let conversion = convert_nodes(&catalog, &ViewState::default(), &config);
        let back = conversion.routes.iter().find(|r| r.back).unwrap();
        assert_eq!(back.id, "ca");
        assert_eq!(back.waypoints.len(), 3);
        let layers: Vec<usize> = back.waypoints.iter().map(|(_, p)| p.layer).collect();
        assert_eq!(layers, [2, 1, 0]);
        let max_x = conversion
            .node_positions
            .values()
            .map(|p| p.x + config.node_width)
            .fold(0.0_f64, f64::max);
        assert!(back.waypoints.iter().all(|(_, p)| p.x > max_x));
    }

    #[test]
    fn test_partial_module_renders_muted() {
        let catalog = Catalog::new(
            vec![NodeModule::new("m", "M"), NodeModule::new("p", "P")],
            vec![node("a", "m"), node("b", "p")],
            vec![edge("ab", "a", "b")],
            Vec::new(),
        )
        .unwrap();
        let view = ViewState::default().with_visibility("p", ModuleVisibility::Partial);

        let conversion = convert_nodes(&catalog, &view, &LayoutConfig::default());
        let b = conversion.nodes.iter().find(|n| n.id == "b").unwrap();
        assert_eq!(b.emphasis, Emphasis::Muted);
        assert!(conversion.pseudo_nodes.is_empty());
        assert_eq!(conversion.routes.len(), 1);
    }
}
