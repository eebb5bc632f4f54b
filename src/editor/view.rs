//! Read-only render snapshot.
//!
//! Everything a renderer needs in one value: nodes with their resolved size
//! and port anchors, every edge with its routed polyline, and the live
//! polyline of the wire being drawn.

use serde::Serialize;

use crate::config::EditorConfig;
use crate::error::EditorResult;
use crate::model::{Diagram, Direction, Edge, Node, Point, Size};

use super::operations::{node_port_position, node_size, port_position};
use super::routing::route_with;
use super::state::{EditorState, PendingWire};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub node: Node,
    pub size: Size,
    pub inputs: Vec<Point>,
    pub outputs: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutedEdge {
    pub edge: Edge,
    pub polyline: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderSnapshot {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<RoutedEdge>,
    /// Polyline of the pending wire, source side first.
    pub pending: Option<Vec<Point>>,
}

/// Source port, waypoints, target port.
pub fn edge_anchors(diagram: &Diagram, config: &EditorConfig, edge: &Edge) -> EditorResult<Vec<Point>> {
    let layout = &config.layout;
    let mut anchors = Vec::with_capacity(edge.waypoints.len() + 2);
    anchors.push(port_position(diagram, layout, &edge.source.node, Direction::Out, edge.source.port)?);
    anchors.extend_from_slice(&edge.waypoints);
    anchors.push(port_position(diagram, layout, &edge.target.node, Direction::In, edge.target.port)?);
    Ok(anchors)
}

pub fn route_edge(diagram: &Diagram, config: &EditorConfig, edge: &Edge) -> EditorResult<Vec<Point>> {
    Ok(route_with(&edge_anchors(diagram, config, edge)?, &config.routing))
}

/// Routed polyline of a pending wire ending at `pointer`.
pub fn pending_polyline(
    diagram: &Diagram,
    config: &EditorConfig,
    wire: &PendingWire,
    pointer: Option<Point>,
) -> EditorResult<Vec<Point>> {
    let anchor = port_position(
        diagram,
        &config.layout,
        &wire.anchor.node,
        wire.anchor_direction,
        wire.anchor.port,
    )?;
    let mut points = Vec::with_capacity(wire.waypoints.len() + 2);
    points.push(anchor);
    points.extend_from_slice(&wire.waypoints);
    points.extend(pointer);
    if wire.anchor_direction == Direction::In {
        points.reverse();
    }
    Ok(route_with(&points, &config.routing))
}

/// Snapshot of a diagram with no wire in progress.
pub fn diagram_snapshot(diagram: &Diagram, config: &EditorConfig) -> EditorResult<RenderSnapshot> {
    let layout = &config.layout;
    let nodes = diagram
        .nodes()
        .map(|node| NodeView {
            size: node_size(layout, node),
            inputs: (0..node.input_count)
                .map(|i| node_port_position(layout, node, Direction::In, i))
                .collect(),
            outputs: (0..node.output_count)
                .map(|i| node_port_position(layout, node, Direction::Out, i))
                .collect(),
            node: node.clone(),
        })
        .collect();
    let edges = diagram
        .edges()
        .map(|edge| {
            Ok(RoutedEdge {
                polyline: route_edge(diagram, config, edge)?,
                edge: edge.clone(),
            })
        })
        .collect::<EditorResult<Vec<_>>>()?;
    Ok(RenderSnapshot {
        nodes,
        edges,
        pending: None,
    })
}

/// Snapshot of the editor, including the live pending wire.
pub fn snapshot(state: &EditorState) -> EditorResult<RenderSnapshot> {
    let mut snap = diagram_snapshot(state.diagram(), state.config())?;
    snap.pending = state
        .pending()
        .map(|wire| pending_polyline(state.diagram(), state.config(), wire, state.pointer()))
        .transpose()?;
    Ok(snap)
}
