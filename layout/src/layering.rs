//! Layered placement primitives.
//!
//! 1. Layer assignment by longest path over the acyclic skeleton
//! 2. Ordering within layers (barycenter sweeps, crossing count as tie-break)
//! 3. Coordinate assignment, each layer centred against the widest
//!
//! All functions are deterministic: ties fall back to ascending id.

use mechanet_core::config::{LayoutConfig, LayoutDirection};
use mechanet_graph::AdjacencyGraph;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Top-left corner of a node box, with the layer/order slot it was placed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub layer: usize,
    pub order: usize,
}

/// Longest-path layering, ignoring `back_edges`.
///
/// Sources sit on layer 0 and every other vertex one below its deepest
/// skeleton predecessor, so `layer(u) < layer(v)` for each kept edge.
pub fn longest_path_layers(
    graph: &AdjacencyGraph,
    back_edges: &BTreeSet<String>,
) -> BTreeMap<String, usize> {
    let mut in_degree: BTreeMap<&str, usize> = graph.vertex_ids().map(|id| (id, 0)).collect();
    for (id, _) in in_degree.clone() {
        for (target, edge_id) in graph.successors(id) {
            if !back_edges.contains(edge_id) {
                *in_degree.entry(target).or_insert(0) += 1;
            }
        }
    }

    let mut layers: BTreeMap<String, usize> = BTreeMap::new();
    let mut queue: Vec<&str> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(id, _)| *id)
        .collect();

    let mut head = 0;
    while head < queue.len() {
        let u = queue[head];
        head += 1;
        let layer_u = *layers.entry(u.to_string()).or_insert(0);

        for (v, edge_id) in graph.successors(u) {
            if back_edges.contains(edge_id) {
                continue;
            }
            let layer_v = layers.entry(v.to_string()).or_insert(0);
            *layer_v = (*layer_v).max(layer_u + 1);
            if let Some(degree) = in_degree.get_mut(v) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push(v);
                }
            }
        }
    }

    // Only reachable when the caller passed an incomplete back-edge set.
    if queue.len() < in_degree.len() {
        let max_layer = layers.values().copied().max().unwrap_or(0);
        let placed: BTreeSet<&str> = queue.iter().copied().collect();
        for id in in_degree.keys().filter(|id| !placed.contains(*id)) {
            tracing::warn!(vertex = %id, "vertex left on a cycle; placing below all layers");
            layers.insert(id.to_string(), max_layer + 1);
        }
    }

    layers
}

/// Groups vertices by layer, each layer initially sorted by id, then refines
/// the order with `sweeps` down/up barycenter passes over `links`.
///
/// `links` connect a vertex to a vertex exactly one layer below.
pub fn order_layers(
    layer_of: &BTreeMap<String, usize>,
    links: &[(String, String)],
    sweeps: usize,
) -> Vec<Vec<String>> {
    let Some(max_layer) = layer_of.values().copied().max() else {
        return Vec::new();
    };
    let mut layers: Vec<Vec<String>> = vec![Vec::new(); max_layer + 1];
    for (id, layer) in layer_of {
        layers[*layer].push(id.clone());
    }

    let mut below: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut above: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (upper, lower) in links {
        below.entry(upper.as_str()).or_default().push(lower.as_str());
        above.entry(lower.as_str()).or_default().push(upper.as_str());
    }

    let mut best = layers.clone();
    let mut best_crossings = total_crossings(&layers, &below);

    for _ in 0..sweeps {
        if best_crossings == 0 {
            break;
        }
        for r in 1..layers.len() {
            reorder_by_barycenter(&mut layers, r, r - 1, &above);
        }
        for r in (0..layers.len().saturating_sub(1)).rev() {
            reorder_by_barycenter(&mut layers, r, r + 1, &below);
        }

        let crossings = total_crossings(&layers, &below);
        if crossings < best_crossings {
            best_crossings = crossings;
            best = layers.clone();
        }
    }

    best
}

fn reorder_by_barycenter(
    layers: &mut [Vec<String>],
    free: usize,
    fixed: usize,
    neighbours: &BTreeMap<&str, Vec<&str>>,
) {
    let fixed_pos: HashMap<&str, usize> = layers[fixed]
        .iter()
        .enumerate()
        .map(|(idx, id)| (id.as_str(), idx))
        .collect();

    let mut scored: Vec<(f64, String)> = layers[free]
        .iter()
        .enumerate()
        .map(|(idx, id)| {
            let positions: Vec<usize> = neighbours
                .get(id.as_str())
                .into_iter()
                .flatten()
                .filter_map(|nb| fixed_pos.get(nb).copied())
                .collect();
            let barycenter = if positions.is_empty() {
                idx as f64
            } else {
                positions.iter().sum::<usize>() as f64 / positions.len() as f64
            };
            (barycenter, id.clone())
        })
        .collect();

    scored.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    layers[free] = scored.into_iter().map(|(_, id)| id).collect();
}

fn total_crossings(layers: &[Vec<String>], below: &BTreeMap<&str, Vec<&str>>) -> usize {
    layers
        .windows(2)
        .map(|pair| count_crossings(&pair[0], &pair[1], below))
        .sum()
}

/// Crossings between two adjacent layers: inverted (upper, lower) position pairs.
pub fn count_crossings(
    upper: &[String],
    lower: &[String],
    below: &BTreeMap<&str, Vec<&str>>,
) -> usize {
    let lower_pos: HashMap<&str, usize> = lower
        .iter()
        .enumerate()
        .map(|(idx, id)| (id.as_str(), idx))
        .collect();

    let mut pairs = Vec::new();
    for (i, u) in upper.iter().enumerate() {
        for v in below.get(u.as_str()).into_iter().flatten() {
            if let Some(j) = lower_pos.get(v) {
                pairs.push((i, *j));
            }
        }
    }

    let mut crossings = 0;
    for a in 0..pairs.len() {
        for b in (a + 1)..pairs.len() {
            let (i1, j1) = pairs[a];
            let (i2, j2) = pairs[b];
            if (i1 < i2 && j1 > j2) || (i1 > i2 && j1 < j2) {
                crossings += 1;
            }
        }
    }
    crossings
}

/// Result of the coordinate pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    pub positions: BTreeMap<String, Position>,
    /// Cross-axis extent of the widest layer.
    pub extent: f64,
    /// Main-axis offset of each layer.
    pub layer_offsets: Vec<f64>,
}

/// Places ordered layers, each centred against the widest.
///
/// `stacked` reserves room below a node's box (along y) for children drawn
/// under it. Depending on the direction that room widens the node's slot
/// or deepens its layer, so stacked children never meet another box.
pub fn assign_coordinates(
    layers: &[Vec<String>],
    config: &LayoutConfig,
    stacked: &BTreeMap<String, f64>,
) -> Coordinates {
    let (node_main, cross_span) = box_spans(config);
    let room = |id: &str| stacked.get(id).copied().unwrap_or(0.0);
    let left_right = config.direction == LayoutDirection::LeftRight;
    let main_room = |id: &str| if left_right { 0.0 } else { room(id) };
    let cross_room = |id: &str| if left_right { room(id) } else { 0.0 };

    let widths: Vec<f64> = layers
        .iter()
        .map(|layer| {
            let boxes: f64 = layer.iter().map(|id| cross_span + cross_room(id)).sum();
            boxes + layer.len().saturating_sub(1) as f64 * config.node_gap
        })
        .collect();
    let extent = widths.iter().copied().fold(0.0_f64, f64::max);

    let mut layer_offsets = Vec::with_capacity(layers.len());
    let mut main = 0.0;
    for layer in layers {
        layer_offsets.push(main);
        let depth = layer
            .iter()
            .map(|id| main_room(id))
            .fold(0.0_f64, f64::max);
        main += node_main + depth + config.layer_gap;
    }

    let mut positions = BTreeMap::new();
    for (r, layer) in layers.iter().enumerate() {
        let mut cross = (extent - widths[r]) / 2.0;
        for (order, id) in layer.iter().enumerate() {
            positions.insert(
                id.clone(),
                place(config.direction, layer_offsets[r], cross, r, order),
            );
            cross += cross_span + cross_room(id) + config.node_gap;
        }
    }

    Coordinates {
        positions,
        extent,
        layer_offsets,
    }
}

/// Node box size as (along the main axis, along the cross axis).
pub fn box_spans(config: &LayoutConfig) -> (f64, f64) {
    match config.direction {
        LayoutDirection::TopBottom => (config.node_height, config.node_width),
        LayoutDirection::LeftRight => (config.node_width, config.node_height),
    }
}

pub fn place(
    direction: LayoutDirection,
    main: f64,
    cross: f64,
    layer: usize,
    order: usize,
) -> Position {
    let (x, y) = match direction {
        LayoutDirection::TopBottom => (cross, main),
        LayoutDirection::LeftRight => (main, cross),
    };
    Position { x, y, layer, order }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer_map(entries: &[(&str, usize)]) -> BTreeMap<String, usize> {
        entries.iter().map(|(id, l)| (id.to_string(), *l)).collect()
    }

    fn links(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    #[test]
    fn test_longest_path_uses_deepest_predecessor() {
        let mut graph = AdjacencyGraph::new();
        graph.add_edge("ab", "a", "b");
        graph.add_edge("bc", "b", "c");
        graph.add_edge("ac", "a", "c");

        let layers = longest_path_layers(&graph, &BTreeSet::new());
        assert_eq!(layers["a"], 0);
        assert_eq!(layers["b"], 1);
        assert_eq!(layers["c"], 2);
    }

    #[test]
    fn test_back_edges_are_ignored() {
        let mut graph = AdjacencyGraph::new();
        graph.add_edge("ab", "a", "b");
        graph.add_edge("ba", "b", "a");

        let back: BTreeSet<String> = ["ba".to_string()].into_iter().collect();
        let layers = longest_path_layers(&graph, &back);
        assert_eq!(layers["a"], 0);
        assert_eq!(layers["b"], 1);
    }

    #[test]
    fn test_barycenter_removes_simple_crossing() {
        // a->y and b->x cross when both layers are in id order.
        let layer_of = layer_map(&[("a", 0), ("b", 0), ("x", 1), ("y", 1)]);
        let ordered = order_layers(&layer_of, &links(&[("a", "y"), ("b", "x")]), 2);

        let mut below: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        below.insert("a", vec!["y"]);
        below.insert("b", vec!["x"]);
        assert_eq!(count_crossings(&ordered[0], &ordered[1], &below), 0);
    }

    #[test]
    fn test_coordinates_center_narrow_layers() {
        let config = LayoutConfig::default();
        let layers = vec![
            vec!["a".to_string()],
            vec!["b".to_string(), "c".to_string()],
        ];
        let placed = assign_coordinates(&layers, &config, &BTreeMap::new());
        let (positions, width) = (placed.positions, placed.extent);

        assert_eq!(width, 2.0 * config.node_width + config.node_gap);
        let a = positions["a"];
        let b = positions["b"];
        let c = positions["c"];
        assert_eq!(a.y, 0.0);
        assert_eq!(b.y, config.node_height + config.layer_gap);
        assert_eq!(a.x, (width - config.node_width) / 2.0);
        assert_eq!(c.x - b.x, config.node_width + config.node_gap);
        assert_eq!((c.layer, c.order), (1, 1));
    }

    #[test]
    fn test_left_right_swaps_axes() {
        let config = LayoutConfig {
            direction: LayoutDirection::LeftRight,
            ..LayoutConfig::default()
        };
        let layers = vec![vec!["a".to_string()], vec!["b".to_string()]];
        let positions = assign_coordinates(&layers, &config, &BTreeMap::new()).positions;
        assert_eq!(positions["b"].x, config.node_width + config.layer_gap);
        assert_eq!(positions["b"].y, 0.0);
    }

    #[test]
    fn test_stacked_room_widens_slot_left_right() {
        let config = LayoutConfig {
            direction: LayoutDirection::LeftRight,
            ..LayoutConfig::default()
        };
        let layers = vec![vec!["a".to_string(), "b".to_string()]];
        let stacked: BTreeMap<String, f64> = [("a".to_string(), 72.0)].into_iter().collect();

        let placed = assign_coordinates(&layers, &config, &stacked);
        let (a, b) = (placed.positions["a"], placed.positions["b"]);
        assert_eq!(b.y - a.y, config.node_height + 72.0 + config.node_gap);
        assert_eq!(placed.layer_offsets, [0.0]);
    }

    #[test]
    fn test_stacked_room_deepens_layer_top_bottom() {
        let config = LayoutConfig::default();
        let layers = vec![vec!["a".to_string()], vec!["b".to_string()]];
        let stacked: BTreeMap<String, f64> = [("a".to_string(), 72.0)].into_iter().collect();

        let placed = assign_coordinates(&layers, &config, &stacked);
        assert_eq!(
            placed.positions["b"].y,
            config.node_height + 72.0 + config.layer_gap
        );
        assert_eq!(placed.positions["a"].x, placed.positions["b"].x);
    }
}
