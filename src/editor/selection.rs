//! Selection management for the editor.
//!
//! The selection is a set of node and edge ids, kept in selection order.
//! Ids are stable across removals, so the selection is simply pruned after
//! each transition instead of being re-indexed.

use crate::model::{Diagram, EdgeId, NodeId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorSelection {
    pub selected_nodes: Vec<NodeId>,
    pub selected_edges: Vec<EdgeId>,
}

impl EditorSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.selected_nodes.clear();
        self.selected_edges.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.selected_nodes.is_empty() && self.selected_edges.is_empty()
    }

    pub fn is_node_selected(&self, id: &NodeId) -> bool {
        self.selected_nodes.contains(id)
    }

    pub fn is_edge_selected(&self, id: &EdgeId) -> bool {
        self.selected_edges.contains(id)
    }

    /// Add if not selected, remove if selected.
    pub fn toggle_node(&mut self, id: NodeId) {
        if let Some(pos) = self.selected_nodes.iter().position(|n| *n == id) {
            self.selected_nodes.remove(pos);
        } else {
            self.selected_nodes.push(id);
        }
    }

    /// Add if not selected, remove if selected.
    pub fn toggle_edge(&mut self, id: EdgeId) {
        if let Some(pos) = self.selected_edges.iter().position(|e| *e == id) {
            self.selected_edges.remove(pos);
        } else {
            self.selected_edges.push(id);
        }
    }

    /// Select a single node, clearing any previous selection.
    pub fn select_node(&mut self, id: NodeId) {
        self.clear();
        self.selected_nodes.push(id);
    }

    /// Select a single edge, clearing any previous selection.
    pub fn select_edge(&mut self, id: EdgeId) {
        self.clear();
        self.selected_edges.push(id);
    }

    /// Drop ids that no longer exist in `diagram`.
    pub fn retain_existing(&mut self, diagram: &Diagram) {
        self.selected_nodes.retain(|id| diagram.contains_node(id));
        self.selected_edges.retain(|id| diagram.contains_edge(id));
    }
}
