pub mod cycles;
pub mod index;
pub mod pathway;

pub use cycles::detect_back_edges;
pub use index::{AdjacencyGraph, GraphEdge};
pub use pathway::{compute_pathway_stats, EntryPoint, PathwayConfig, PathwayStats};
