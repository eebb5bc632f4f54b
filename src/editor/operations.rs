//! Graph model operations.
//!
//! Low-level mutations of a [`Diagram`] plus port geometry. Each function
//! either applies fully or returns an error without touching the diagram.
//! Removal never cascades on its own: [`remove_node`] leaves incident edges
//! in place so that callers can pick plain-delete ([`delete_node`]) or
//! splice semantics.

use indexmap::IndexMap;

use crate::config::LayoutConfig;
use crate::error::{EditorError, EditorResult};
use crate::model::{
    Diagram, Direction, Edge, EdgeId, Node, NodeId, NodeKind, ParamValue, Point, PortRef, Size,
};

use super::block_catalog::BlockCatalog;

// ────────────────────────────────────────────────────────────────────────────
// Geometry
// ────────────────────────────────────────────────────────────────────────────

/// Clamp a requested size to the minimum that fits the node's ports.
pub fn clamp_size(layout: &LayoutConfig, inputs: u32, outputs: u32, size: Size) -> Size {
    Size {
        width: size.width.max(layout.min_width),
        height: size.height.max(layout.min_height(inputs, outputs)),
    }
}

/// The size a node is drawn at: its explicit size, or one derived from its
/// port counts.
pub fn node_size(layout: &LayoutConfig, node: &Node) -> Size {
    let requested = node.size.unwrap_or(Size {
        width: layout.default_width,
        height: 0.0,
    });
    clamp_size(layout, node.input_count, node.output_count, requested)
}

/// Anchor point of a port in model coordinates.
///
/// Block inputs sit on the left edge and outputs on the right edge, spaced
/// `port_spacing` apart below the header. Both junction ports resolve to the
/// junction center plus `junction_port_offset`.
pub fn port_position(
    diagram: &Diagram,
    layout: &LayoutConfig,
    node: &NodeId,
    direction: Direction,
    index: u32,
) -> EditorResult<Point> {
    let node = diagram.check_port(node, direction, index)?;
    Ok(node_port_position(layout, node, direction, index))
}

/// Same as [`port_position`] for a node that is already resolved. `index` is
/// not range-checked.
pub fn node_port_position(layout: &LayoutConfig, node: &Node, direction: Direction, index: u32) -> Point {
    if node.is_junction() {
        return node.position.offset(layout.junction_port_offset);
    }
    let y = node.position.y + layout.header_height + layout.top_margin + index as f32 * layout.port_spacing;
    let x = match direction {
        Direction::In => node.position.x,
        Direction::Out => node.position.x + node_size(layout, node).width,
    };
    Point::new(x, y)
}

// ────────────────────────────────────────────────────────────────────────────
// Nodes
// ────────────────────────────────────────────────────────────────────────────

/// Optional per-node values applied on top of the catalog template.
#[derive(Debug, Clone, Default)]
pub struct NodeOverrides {
    /// Use this id instead of allocating the next free one.
    pub id: Option<NodeId>,
    pub size: Option<Size>,
    /// Merged over the catalog's default parameters.
    pub parameters: IndexMap<String, ParamValue>,
}

/// Create a node from a catalog entry (or a junction) and insert it.
///
/// Nothing is connected yet. Junctions always get one input and one output
/// and ignore size overrides.
pub fn add_node(
    diagram: &mut Diagram,
    catalog: &dyn BlockCatalog,
    layout: &LayoutConfig,
    kind: NodeKind,
    position: Point,
    overrides: NodeOverrides,
) -> EditorResult<Node> {
    let id = overrides.id.unwrap_or_else(|| diagram.next_node_id());
    if diagram.contains_node(&id) {
        return Err(EditorError::InvalidReference(format!("node id '{}' already in use", id)));
    }

    let node = match kind {
        NodeKind::Junction => Node {
            id,
            kind: NodeKind::Junction,
            position,
            size: None,
            input_count: 1,
            output_count: 1,
            parameters: overrides.parameters,
        },
        NodeKind::Block(block_type) => {
            let template = catalog
                .lookup(&block_type)
                .ok_or_else(|| EditorError::UnknownBlockType(block_type.clone()))?;
            let (ins, outs) = (template.default_inputs, template.default_outputs);
            let mut parameters = template.default_parameters.clone();
            parameters.extend(overrides.parameters);
            Node {
                id,
                kind: NodeKind::Block(block_type),
                position,
                size: overrides.size.map(|s| clamp_size(layout, ins, outs, s)),
                input_count: ins,
                output_count: outs,
                parameters,
            }
        }
    };

    log::trace!("add node {} ({}) at {:?}", node.id, node.kind, node.position);
    diagram.nodes.insert(node.id.clone(), node.clone());
    Ok(node)
}

/// Remove a node only. Incident edges stay and must be handled by the caller.
pub fn remove_node(diagram: &mut Diagram, id: &NodeId) -> EditorResult<Node> {
    diagram
        .nodes
        .shift_remove(id)
        .ok_or_else(|| EditorError::UnknownNode(id.clone()))
}

/// Remove a node together with every edge touching it.
pub fn delete_node(diagram: &mut Diagram, id: &NodeId) -> EditorResult<(Node, Vec<Edge>)> {
    diagram.node(id)?;
    let incident: Vec<EdgeId> = diagram.edges_touching(id).map(|e| e.id.clone()).collect();
    let mut removed = Vec::with_capacity(incident.len());
    for edge_id in incident {
        removed.push(remove_edge(diagram, &edge_id)?);
    }
    let node = remove_node(diagram, id)?;
    Ok((node, removed))
}

/// Change a block's size, clamped to its minimum. Junctions are returned
/// unchanged.
pub fn resize_node(diagram: &mut Diagram, layout: &LayoutConfig, id: &NodeId, size: Size) -> EditorResult<Node> {
    let node = diagram
        .nodes
        .get_mut(id)
        .ok_or_else(|| EditorError::UnknownNode(id.clone()))?;
    if !node.is_junction() {
        node.size = Some(clamp_size(layout, node.input_count, node.output_count, size));
    }
    Ok(node.clone())
}

/// Move a node to a new anchor position. Edge waypoints are left as they are.
pub fn move_node(diagram: &mut Diagram, id: &NodeId, position: Point) -> EditorResult<Node> {
    let node = diagram
        .nodes
        .get_mut(id)
        .ok_or_else(|| EditorError::UnknownNode(id.clone()))?;
    node.position = position;
    Ok(node.clone())
}

// ────────────────────────────────────────────────────────────────────────────
// Edges
// ────────────────────────────────────────────────────────────────────────────

/// Result of [`add_edge`].
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeInsert {
    pub edge: Edge,
    /// The edge that previously fed the same input port, now removed.
    pub replaced: Option<Edge>,
}

/// Connect an output port to an input port.
///
/// An input port accepts one edge: an existing edge into `target` is
/// removed and returned in [`EdgeInsert::replaced`]. Self-loops are allowed.
pub fn add_edge(
    diagram: &mut Diagram,
    source: PortRef,
    target: PortRef,
    waypoints: Vec<Point>,
) -> EditorResult<EdgeInsert> {
    diagram.check_port(&source.node, Direction::Out, source.port)?;
    diagram.check_port(&target.node, Direction::In, target.port)?;

    let replaced = match diagram.incoming_edge(&target).map(|e| e.id.clone()) {
        Some(old) => diagram.edges.shift_remove(&old),
        None => None,
    };
    if let Some(old) = &replaced {
        log::debug!("edge {} replaced on input {}#in:{}", old.id, target.node, target.port);
    }

    let edge = Edge::new(source, target, waypoints);
    diagram.edges.insert(edge.id.clone(), edge.clone());
    Ok(EdgeInsert { edge, replaced })
}

pub fn remove_edge(diagram: &mut Diagram, id: &EdgeId) -> EditorResult<Edge> {
    diagram
        .edges
        .shift_remove(id)
        .ok_or_else(|| EditorError::UnknownEdge(id.clone()))
}
