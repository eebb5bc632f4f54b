//! Junction chain collapse ("vanish-and-resume").
//!
//! Grabbing a junction that sits in the middle of a routed wire re-opens the
//! whole wire from its real origin. [`collapse_chain_ending_at`] walks
//! upstream from the grabbed junction through every junction feeding it
//! until it reaches a regular block, collecting the path it passes through.
//! [`apply_splice`] then removes the walked junctions and their edges.
//!
//! The walk is an iterative loop bounded by the chain length. A junction
//! visited twice means the chain loops back on itself and is reported as
//! [`EditorError::StructuralAmbiguity`].

use std::collections::HashSet;

use crate::config::LayoutConfig;
use crate::error::{EditorError, EditorResult};
use crate::model::{Diagram, Direction, Edge, EdgeId, NodeId, Point, PortRef};

use super::operations::{node_port_position, remove_edge, remove_node};

/// What a collapsed chain resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct SpliceResult {
    /// Output port of the first non-junction node upstream.
    pub source: PortRef,
    /// Full path from `source` to the grabbed junction, upstream first.
    pub waypoints: Vec<Point>,
    /// Junctions to remove, upstream first. The last one is the grabbed node.
    pub removed_nodes: Vec<NodeId>,
    /// Chain edges to remove, upstream first.
    pub removed_edges: Vec<EdgeId>,
}

struct Link {
    edge: EdgeId,
    node: NodeId,
    path: Vec<Point>,
}

/// Walk upstream from the junction `node` and describe the chain it ends.
///
/// Returns `Ok(None)` when there is nothing to collapse: `node` is not a
/// junction, its input is unconnected, or some junction further up has an
/// unconnected input.
pub fn collapse_chain_ending_at(
    diagram: &Diagram,
    layout: &LayoutConfig,
    node: &NodeId,
) -> EditorResult<Option<SpliceResult>> {
    if !diagram.node(node)?.is_junction() {
        return Ok(None);
    }

    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut links: Vec<Link> = Vec::new();
    let mut current = node.clone();

    let source = loop {
        if !visited.insert(current.clone()) {
            return Err(EditorError::StructuralAmbiguity(format!(
                "junction chain ending at '{}' loops back through '{}'",
                node, current
            )));
        }

        let input = PortRef::new(current.clone(), 0);
        let mut incoming = diagram.edges().filter(|e| e.target == input);
        let Some(edge) = incoming.next() else {
            if !links.is_empty() {
                log::warn!("junction chain ending at {} is open at {}", node, current);
            }
            return Ok(None);
        };
        if incoming.next().is_some() {
            return Err(EditorError::StructuralAmbiguity(format!(
                "junction '{}' has more than one incoming edge",
                current
            )));
        }

        let anchor = node_port_position(layout, diagram.node(&current)?, Direction::In, 0);
        let mut path = edge.waypoints.clone();
        path.push(anchor);
        links.push(Link {
            edge: edge.id.clone(),
            node: current.clone(),
            path,
        });

        let upstream = diagram.node(&edge.source.node)?;
        if !upstream.is_junction() {
            break edge.source.clone();
        }
        current = upstream.id.clone();
    };

    links.reverse();
    let mut result = SpliceResult {
        source,
        waypoints: Vec::new(),
        removed_nodes: Vec::with_capacity(links.len()),
        removed_edges: Vec::with_capacity(links.len()),
    };
    for link in links {
        result.waypoints.extend(link.path);
        result.removed_nodes.push(link.node);
        result.removed_edges.push(link.edge);
    }
    Ok(Some(result))
}

/// Remove everything a collapsed chain covers: the chain edges, every edge
/// leaving one of the removed junctions, and the junctions themselves.
/// Returns the removed edges.
pub fn apply_splice(diagram: &mut Diagram, result: &SpliceResult) -> EditorResult<Vec<Edge>> {
    let mut removed = Vec::new();
    for id in &result.removed_edges {
        removed.push(remove_edge(diagram, id)?);
    }

    let removed_nodes: HashSet<&NodeId> = result.removed_nodes.iter().collect();
    let dangling: Vec<EdgeId> = diagram
        .edges()
        .filter(|e| removed_nodes.contains(&e.source.node))
        .map(|e| e.id.clone())
        .collect();
    for id in &dangling {
        removed.push(remove_edge(diagram, id)?);
    }

    for id in &result.removed_nodes {
        remove_node(diagram, id)?;
    }
    log::debug!(
        "spliced {} junction(s) back to {}#out:{}, {} edge(s) removed",
        result.removed_nodes.len(),
        result.source.node,
        result.source.port,
        removed.len()
    );
    Ok(removed)
}
