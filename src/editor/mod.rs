//! Interactive editing core for function-block diagrams.
//!
//! - **Block catalog**: block types with their port counts and default parameters
//! - **Graph operations**: adding, removing, moving and resizing nodes and edges, port geometry
//! - **Routing**: orthogonal polylines through an edge's anchors
//! - **Connection state machine**: starting, extending, branching, detaching and finalizing wires
//! - **Splice**: collapsing a chain of junctions back to its real source
//! - **Selection** and a read-only **render snapshot**

pub mod block_catalog;
pub mod operations;
pub mod routing;
pub mod selection;
pub mod splice;
pub mod state;
pub mod view;

pub use block_catalog::{
    BlockCatalog, BlockCatalogCategory, BlockCatalogEntry, BuiltinCatalog, get_block_catalog,
    get_block_catalog_by_category,
};
pub use operations::{
    EdgeInsert, NodeOverrides, add_edge, add_node, delete_node, move_node, port_position,
    remove_edge, remove_node, resize_node,
};
pub use routing::{route, route_with};
pub use selection::EditorSelection;
pub use splice::{SpliceResult, apply_splice, collapse_chain_ending_at};
pub use state::{EditorEvent, EditorState, IgnoreReason, Outcome, PendingWire};
pub use view::{RenderSnapshot, RoutedEdge, snapshot};
