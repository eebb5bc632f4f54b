//! Editing core for function-block diagrams.
//!
//! Blocks with typed ports are connected by directional wires. This crate
//! holds the parts of such an editor that carry real invariants: the graph
//! model, the pointer-driven connection state machine, the junction splice
//! algorithm and orthogonal wire routing. Rendering, hit-testing and
//! persistence transports are left to the host.
//!
//! The binary `wirelink` inspects diagram documents and replays event
//! scripts against them.

pub mod config;
pub mod editor;
pub mod error;
pub mod model;

pub use config::EditorConfig;
pub use error::{EditorError, EditorResult};
pub use model::{Diagram, DiagramDoc};
