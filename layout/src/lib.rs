//! Graph conversion and layered layout for the mechanistic network view.
//!
//! `convert_nodes` turns the static catalog plus a [`ViewState`] into
//! rendered nodes, module stand-ins and positions; `convert_edges` turns the
//! routed edges of that result into drawable edges and waypoints.

pub mod cache;
pub mod convert;
pub mod edges;
pub mod error;
pub mod layering;
pub mod selection;
pub mod session;
pub mod view;

pub use convert::{
    convert_nodes, EdgeRoute, Emphasis, NodeConversion, PseudoNode, RenderNode, VariantNode,
};
pub use edges::{convert_edges, EdgeConversion, EdgeStyle, RenderEdge, WaypointNode};
pub use error::LayoutError;
pub use layering::Position;
pub use selection::{
    RecordingListener, SelectionController, SelectionError, SelectionEvent, SelectionListener,
};
pub use session::{GraphLayout, LayoutSession};
pub use view::{ModuleVisibility, VariantSelection, ViewError, ViewState};

use mechanet_core::config::LayoutConfig;
use mechanet_core::Catalog;

/// Node conversion followed by edge conversion.
pub fn layout(catalog: &Catalog, view: &ViewState, config: &LayoutConfig) -> GraphLayout {
    let nodes = convert_nodes(catalog, view, config);
    let edges = convert_edges(catalog, view, &nodes);
    GraphLayout { nodes, edges }
}
