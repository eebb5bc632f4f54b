//! Editor state and the connection state machine.
//!
//! [`EditorState`] owns the diagram, the single pending-wire slot, the
//! selection and the resolved configuration. Every pointer or keyboard
//! gesture arrives as an [`EditorEvent`] and goes through
//! [`EditorState::dispatch`], which returns what happened as an [`Outcome`].
//!
//! The machine has two states: *Idle* (no pending wire) and *Drawing*.
//!
//! | gesture                                   | Idle                | Drawing                       |
//! |-------------------------------------------|---------------------|-------------------------------|
//! | activate block output                     | start               | ignored (already drawing)     |
//! | activate input                            | ignored             | finalize                      |
//! | click canvas                              | ignored             | add waypoint                  |
//! | double-click canvas                       | ignored             | branch through a new junction |
//! | double-activate a connected port          | detach and resume   | detach and resume             |
//! | double-activate a junction with an input  | splice and resume   | splice and resume             |
//! | cancel                                    | ignored             | drop the wire                 |
//!
//! A double activation that matches neither detach nor splice is handled
//! like a single one. After detaching the *output* end of an edge the wire
//! is anchored at the edge's input and drawn backwards; activating an output
//! then finalizes it.
//!
//! Mutating transitions run against a copy of the diagram and the pending
//! slot and are committed only when they succeed, so an error or an ignored
//! event never leaves a partial change behind.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};
use crate::model::{
    Diagram, Direction, EdgeId, JUNCTION, NodeId, NodeKind, ParamValue, Point, PortRef, Size,
};

use super::block_catalog::{BlockCatalog, BuiltinCatalog};
use super::operations::{
    NodeOverrides, add_edge, add_node, delete_node, move_node, remove_edge, resize_node,
};
use super::selection::EditorSelection;
use super::splice::{apply_splice, collapse_chain_ending_at};

// ────────────────────────────────────────────────────────────────────────────
// Pending wire
// ────────────────────────────────────────────────────────────────────────────

/// The wire currently being drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingWire {
    /// The fixed end of the wire.
    pub anchor: PortRef,
    /// `Out` for a wire drawn from an output towards an input, `In` for one
    /// drawn backwards from an input.
    pub anchor_direction: Direction,
    /// Bend points in drawing order, starting at the anchor.
    pub waypoints: Vec<Point>,
}

impl PendingWire {
    pub fn from_output(source: PortRef, waypoints: Vec<Point>) -> Self {
        Self {
            anchor: source,
            anchor_direction: Direction::Out,
            waypoints,
        }
    }

    pub fn from_input(target: PortRef, waypoints: Vec<Point>) -> Self {
        Self {
            anchor: target,
            anchor_direction: Direction::In,
            waypoints,
        }
    }

    /// Turn the wire into `(source, target, waypoints)` once the free end
    /// lands on `other`.
    fn into_edge_parts(self, other: PortRef) -> (PortRef, PortRef, Vec<Point>) {
        match self.anchor_direction {
            Direction::Out => (self.anchor, other, self.waypoints),
            Direction::In => {
                let mut waypoints = self.waypoints;
                waypoints.reverse();
                (other, self.anchor, waypoints)
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Events and outcomes
// ────────────────────────────────────────────────────────────────────────────

/// Input gestures, as delivered by the host UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EditorEvent {
    ActivatePort {
        node: NodeId,
        direction: Direction,
        index: u32,
        #[serde(default)]
        double: bool,
    },
    ClickCanvas {
        point: Point,
    },
    DoubleClickCanvas {
        point: Point,
    },
    PointerMoved {
        point: Point,
    },
    Cancel,
    /// Delete one edge outright.
    DeleteSelection {
        edge: EdgeId,
    },
    /// Delete every selected edge, then every selected node with its edges.
    DeleteSelected,
    DeleteNode {
        node: NodeId,
    },
    SelectEdge {
        edge: EdgeId,
        #[serde(default)]
        toggle: bool,
    },
    SelectNode {
        node: NodeId,
        #[serde(default)]
        toggle: bool,
    },
    ClearSelection,
    ResizeNode {
        node: NodeId,
        size: Size,
    },
    MoveNode {
        node: NodeId,
        position: Point,
    },
    /// Instantiate a catalog block.
    AddNode {
        kind: String,
        position: Point,
        #[serde(default)]
        parameters: IndexMap<String, ParamValue>,
    },
}

/// Why an event was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    AlreadyDrawing,
    NotDrawing,
    /// A junction output needs a double activation to start a wire.
    JunctionNeedsDoubleActivation,
    NothingToCollapse,
    NothingSelected,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            IgnoreReason::AlreadyDrawing => "a wire is already being drawn",
            IgnoreReason::NotDrawing => "no wire is being drawn",
            IgnoreReason::JunctionNeedsDoubleActivation => "junction outputs start on double activation",
            IgnoreReason::NothingToCollapse => "junction chain has no upstream source",
            IgnoreReason::NothingSelected => "selection is empty",
        };
        f.write_str(text)
    }
}

/// What a dispatched event did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Started { from: PortRef },
    WaypointAdded(Point),
    Branched { junction: NodeId, edge: EdgeId },
    Finalized { edge: EdgeId, replaced: Option<EdgeId> },
    Detached { edge: EdgeId, resumed_from: PortRef },
    Spliced {
        source: PortRef,
        removed_nodes: Vec<NodeId>,
        removed_edges: Vec<EdgeId>,
    },
    Cancelled,
    Deleted { nodes: Vec<NodeId>, edges: Vec<EdgeId> },
    SelectionChanged,
    NodeAdded(NodeId),
    NodeMoved(NodeId),
    NodeResized(NodeId),
    PointerMoved,
    Ignored(IgnoreReason),
}

impl Outcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Outcome::Ignored(_))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// EditorState
// ────────────────────────────────────────────────────────────────────────────

/// The complete interactive state of the editor.
///
/// # Example
///
/// ```rust
/// use wirelink::editor::{EditorEvent, EditorState, Outcome};
/// use wirelink::model::{Diagram, Direction, Point};
///
/// let mut state = EditorState::new(Diagram::new());
/// state.dispatch(EditorEvent::AddNode { kind: "INPUT".into(), position: Point::new(0.0, 0.0), parameters: Default::default() }).unwrap();
/// state.dispatch(EditorEvent::AddNode { kind: "NOT".into(), position: Point::new(300.0, 0.0), parameters: Default::default() }).unwrap();
/// state.dispatch(EditorEvent::ActivatePort { node: "1".into(), direction: Direction::Out, index: 0, double: false }).unwrap();
/// let done = state.dispatch(EditorEvent::ActivatePort { node: "2".into(), direction: Direction::In, index: 0, double: false }).unwrap();
/// assert!(matches!(done, Outcome::Finalized { .. }));
/// assert_eq!(state.diagram().edge_count(), 1);
/// ```
#[derive(Clone)]
pub struct EditorState {
    diagram: Diagram,
    pending: Option<PendingWire>,
    pointer: Option<Point>,
    pub selection: EditorSelection,
    config: EditorConfig,
    catalog: Arc<dyn BlockCatalog>,
}

impl fmt::Debug for EditorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorState")
            .field("nodes", &self.diagram.node_count())
            .field("edges", &self.diagram.edge_count())
            .field("pending", &self.pending)
            .field("selection", &self.selection)
            .finish()
    }
}

/// Borrowed context handed to transitions.
struct Ctx<'a> {
    config: &'a EditorConfig,
    catalog: &'a dyn BlockCatalog,
}

impl EditorState {
    /// Editor over `diagram` with the default configuration and the built-in catalog.
    pub fn new(diagram: Diagram) -> Self {
        Self::with_config(diagram, EditorConfig::default(), Arc::new(BuiltinCatalog))
    }

    pub fn with_config(diagram: Diagram, config: EditorConfig, catalog: Arc<dyn BlockCatalog>) -> Self {
        Self {
            diagram,
            pending: None,
            pointer: None,
            selection: EditorSelection::new(),
            config,
            catalog,
        }
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn into_diagram(self) -> Diagram {
        self.diagram
    }

    pub fn pending(&self) -> Option<&PendingWire> {
        self.pending.as_ref()
    }

    pub fn is_drawing(&self) -> bool {
        self.pending.is_some()
    }

    /// Last known pointer position, if any.
    pub fn pointer(&self) -> Option<Point> {
        self.pointer
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Apply one event.
    ///
    /// Errors are `InvalidReference`-style contract violations (unknown ids,
    /// out-of-range ports) or a `StructuralAmbiguity` found while splicing;
    /// in both cases nothing changes.
    pub fn dispatch(&mut self, event: EditorEvent) -> EditorResult<Outcome> {
        log::trace!("dispatch {:?}", event);
        let outcome = match event {
            EditorEvent::PointerMoved { point } => {
                self.pointer = Some(point);
                Ok(Outcome::PointerMoved)
            }
            EditorEvent::ClickCanvas { point } => {
                self.pointer = Some(point);
                match self.pending.as_mut() {
                    Some(wire) => {
                        wire.waypoints.push(point);
                        Ok(Outcome::WaypointAdded(point))
                    }
                    None => Ok(Outcome::Ignored(IgnoreReason::NotDrawing)),
                }
            }
            EditorEvent::Cancel => match self.pending.take() {
                Some(_) => Ok(Outcome::Cancelled),
                None => Ok(Outcome::Ignored(IgnoreReason::NotDrawing)),
            },
            EditorEvent::SelectEdge { edge, toggle } => {
                self.diagram.edge(&edge)?;
                if toggle {
                    self.selection.toggle_edge(edge);
                } else {
                    self.selection.select_edge(edge);
                }
                Ok(Outcome::SelectionChanged)
            }
            EditorEvent::SelectNode { node, toggle } => {
                self.diagram.node(&node)?;
                if toggle {
                    self.selection.toggle_node(node);
                } else {
                    self.selection.select_node(node);
                }
                Ok(Outcome::SelectionChanged)
            }
            EditorEvent::ClearSelection => {
                self.selection.clear();
                Ok(Outcome::SelectionChanged)
            }
            EditorEvent::ActivatePort {
                node,
                direction,
                index,
                double,
            } => self.transact(|ctx, d, pending, _| {
                activate_port(ctx, d, pending, node, direction, index, double)
            }),
            EditorEvent::DoubleClickCanvas { point } => {
                self.pointer = Some(point);
                self.transact(|ctx, d, pending, _| branch_via_junction(ctx, d, pending, point))
            }
            EditorEvent::DeleteSelection { edge } => self.transact(|_, d, _, _| {
                remove_edge(d, &edge)?;
                Ok(Outcome::Deleted {
                    nodes: Vec::new(),
                    edges: vec![edge],
                })
            }),
            EditorEvent::DeleteSelected => {
                self.transact(|_, d, pending, selection| delete_selected(d, pending, selection))
            }
            EditorEvent::DeleteNode { node } => self.transact(|_, d, pending, _| {
                let (_, removed) = delete_node(d, &node)?;
                drop_pending_on(pending, &node);
                Ok(Outcome::Deleted {
                    nodes: vec![node],
                    edges: removed.into_iter().map(|e| e.id).collect(),
                })
            }),
            EditorEvent::ResizeNode { node, size } => self.transact(|ctx, d, _, _| {
                resize_node(d, &ctx.config.layout, &node, size)?;
                Ok(Outcome::NodeResized(node))
            }),
            EditorEvent::MoveNode { node, position } => self.transact(|_, d, _, _| {
                move_node(d, &node, position)?;
                Ok(Outcome::NodeMoved(node))
            }),
            EditorEvent::AddNode {
                kind,
                position,
                parameters,
            } => self.transact(|ctx, d, _, _| {
                if kind == JUNCTION {
                    return Err(EditorError::InvalidReference(
                        "junctions are created by the editor, not the palette".to_string(),
                    ));
                }
                let overrides = NodeOverrides {
                    parameters,
                    ..Default::default()
                };
                let node = add_node(d, ctx.catalog, &ctx.config.layout, NodeKind::from(kind), position, overrides)?;
                Ok(Outcome::NodeAdded(node.id))
            }),
        };

        match &outcome {
            Ok(Outcome::Ignored(reason)) => log::debug!("event ignored: {}", reason),
            Ok(Outcome::PointerMoved) => {}
            Ok(done) => log::debug!("{:?}", done),
            Err(err) => log::warn!("event rejected: {}", err),
        }
        outcome
    }

    /// Run a transition on copies of the diagram and pending slot and commit
    /// them only if it succeeds and is not ignored.
    fn transact<F>(&mut self, f: F) -> EditorResult<Outcome>
    where
        F: FnOnce(&Ctx<'_>, &mut Diagram, &mut Option<PendingWire>, &EditorSelection) -> EditorResult<Outcome>,
    {
        let ctx = Ctx {
            config: &self.config,
            catalog: self.catalog.as_ref(),
        };
        let mut diagram = self.diagram.clone();
        let mut pending = self.pending.clone();
        let outcome = f(&ctx, &mut diagram, &mut pending, &self.selection)?;
        if !outcome.is_ignored() {
            self.diagram = diagram;
            self.pending = pending;
            self.selection.retain_existing(&self.diagram);
        }
        Ok(outcome)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Transitions
// ────────────────────────────────────────────────────────────────────────────

fn activate_port(
    ctx: &Ctx<'_>,
    d: &mut Diagram,
    pending: &mut Option<PendingWire>,
    node: NodeId,
    direction: Direction,
    index: u32,
    double: bool,
) -> EditorResult<Outcome> {
    let is_junction = d.check_port(&node, direction, index)?.is_junction();
    let port = PortRef::new(node, index);

    if double {
        if is_junction {
            if d.incoming_edge(&PortRef::new(port.node.clone(), 0)).is_some() {
                return splice_resume(ctx, d, pending, &port.node);
            }
        } else if let Some(outcome) = detach_and_resume(d, pending, &port, direction)? {
            return Ok(outcome);
        }
    }

    let Some(wire) = pending.clone() else {
        return match direction {
            Direction::In => Ok(Outcome::Ignored(IgnoreReason::NotDrawing)),
            Direction::Out if is_junction && !double => {
                Ok(Outcome::Ignored(IgnoreReason::JunctionNeedsDoubleActivation))
            }
            Direction::Out => {
                *pending = Some(PendingWire::from_output(port.clone(), Vec::new()));
                Ok(Outcome::Started { from: port })
            }
        };
    };

    if wire.anchor_direction == direction {
        return Ok(Outcome::Ignored(IgnoreReason::AlreadyDrawing));
    }
    let (source, target, waypoints) = wire.into_edge_parts(port);
    let inserted = add_edge(d, source, target, waypoints)?;
    *pending = None;
    Ok(Outcome::Finalized {
        edge: inserted.edge.id,
        replaced: inserted.replaced.map(|e| e.id),
    })
}

/// Remove the edge attached to `port` and resume drawing from its other end.
/// For an output that fans out, the most recent edge is taken.
fn detach_and_resume(
    d: &mut Diagram,
    pending: &mut Option<PendingWire>,
    port: &PortRef,
    direction: Direction,
) -> EditorResult<Option<Outcome>> {
    let edge = match direction {
        Direction::In => d.incoming_edge(port).cloned(),
        Direction::Out => d.outgoing_edges(port).last().cloned(),
    };
    let Some(edge) = edge else {
        return Ok(None);
    };
    remove_edge(d, &edge.id)?;

    let resumed = match direction {
        Direction::In => PendingWire::from_output(edge.source, edge.waypoints),
        Direction::Out => {
            let mut waypoints = edge.waypoints;
            waypoints.reverse();
            PendingWire::from_input(edge.target, waypoints)
        }
    };
    let resumed_from = resumed.anchor.clone();
    if let Some(previous) = pending.replace(resumed) {
        log::debug!("discarding pending wire from {}", previous.anchor.node);
    }
    Ok(Some(Outcome::Detached {
        edge: edge.id,
        resumed_from,
    }))
}

fn splice_resume(
    ctx: &Ctx<'_>,
    d: &mut Diagram,
    pending: &mut Option<PendingWire>,
    junction: &NodeId,
) -> EditorResult<Outcome> {
    let Some(result) = collapse_chain_ending_at(d, &ctx.config.layout, junction)? else {
        return Ok(Outcome::Ignored(IgnoreReason::NothingToCollapse));
    };
    apply_splice(d, &result)?;
    if let Some(previous) = pending.replace(PendingWire::from_output(result.source.clone(), result.waypoints)) {
        log::debug!("discarding pending wire from {}", previous.anchor.node);
    }
    Ok(Outcome::Spliced {
        source: result.source,
        removed_nodes: result.removed_nodes,
        removed_edges: result.removed_edges,
    })
}

/// Drop a junction at `point`, wire the pending path into it and keep
/// drawing from its other side.
fn branch_via_junction(
    ctx: &Ctx<'_>,
    d: &mut Diagram,
    pending: &mut Option<PendingWire>,
    point: Point,
) -> EditorResult<Outcome> {
    let Some(wire) = pending.clone() else {
        return Ok(Outcome::Ignored(IgnoreReason::NotDrawing));
    };
    let junction = add_node(d, ctx.catalog, &ctx.config.layout, NodeKind::Junction, point, NodeOverrides::default())?;
    let relay = PortRef::new(junction.id.clone(), 0);
    let anchor_direction = wire.anchor_direction;

    let (source, target, waypoints) = wire.into_edge_parts(relay.clone());
    let inserted = add_edge(d, source, target, waypoints)?;
    *pending = Some(match anchor_direction {
        Direction::Out => PendingWire::from_output(relay, Vec::new()),
        Direction::In => PendingWire::from_input(relay, Vec::new()),
    });
    Ok(Outcome::Branched {
        junction: junction.id,
        edge: inserted.edge.id,
    })
}

fn delete_selected(
    d: &mut Diagram,
    pending: &mut Option<PendingWire>,
    selection: &EditorSelection,
) -> EditorResult<Outcome> {
    if selection.is_empty() {
        return Ok(Outcome::Ignored(IgnoreReason::NothingSelected));
    }
    let mut edges = Vec::new();
    for id in &selection.selected_edges {
        // may already be gone with an earlier selected node
        if d.contains_edge(id) {
            edges.push(remove_edge(d, id)?.id);
        }
    }
    let mut nodes = Vec::new();
    for id in &selection.selected_nodes {
        let (node, removed) = delete_node(d, id)?;
        edges.extend(removed.into_iter().map(|e| e.id));
        drop_pending_on(pending, &node.id);
        nodes.push(node.id);
    }
    Ok(Outcome::Deleted { nodes, edges })
}

fn drop_pending_on(pending: &mut Option<PendingWire>, node: &NodeId) {
    if pending.as_ref().is_some_and(|w| w.anchor.node == *node) {
        log::debug!("pending wire anchored on deleted node {} dropped", node);
        *pending = None;
    }
}
