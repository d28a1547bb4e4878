use crate::index::AdjacencyGraph;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnStack,
    Done,
}

/// Edge ids that close a cycle under a depth-first traversal.
///
/// Roots and successors are visited in ascending id order, so the result is a
/// pure function of the graph. Removing the returned edges leaves a DAG.
/// Self-loops are always reported.
pub fn detect_back_edges(graph: &AdjacencyGraph) -> BTreeSet<String> {
    let mut marks: BTreeMap<&str, Mark> = BTreeMap::new();
    let mut back_edges = BTreeSet::new();

    for root in graph.vertex_ids() {
        if marks.contains_key(root) {
            continue;
        }

        // (vertex, successors, next successor index)
        let mut stack: Vec<(&str, Vec<(&str, &str)>, usize)> = Vec::new();
        marks.insert(root, Mark::OnStack);
        stack.push((root, graph.successors(root).collect(), 0));

        while let Some((vertex, successors, cursor)) = stack.last_mut() {
            let Some(&(next, edge_id)) = successors.get(*cursor) else {
                marks.insert(*vertex, Mark::Done);
                stack.pop();
                continue;
            };
            *cursor += 1;

            match marks.get(next) {
                Some(Mark::OnStack) => {
                    back_edges.insert(edge_id.to_string());
                }
                Some(Mark::Done) => {}
                None => {
                    marks.insert(next, Mark::OnStack);
                    stack.push((next, graph.successors(next).collect(), 0));
                }
            }
        }
    }

    tracing::debug!(back_edges = back_edges.len(), "back-edge detection finished");
    back_edges
}
