pub mod adjacency;

pub use adjacency::{AdjacencyGraph, GraphEdge};
