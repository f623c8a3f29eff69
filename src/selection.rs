//! Selection management for the canvas.
//!
//! Tracks selected nodes and, separately, selected junctions. Both are plain
//! sets in selection order; nothing here is persisted.
//!
//! # Usage
//!
//! ```rust,ignore
//! use mindcanvas::selection::Selection;
//!
//! let mut sel = Selection::new();
//! sel.click(&"root-0".into(), false);
//! sel.click(&"root-1".into(), true);
//! assert_eq!(sel.count(), 2);
//! ```

use indexmap::IndexSet;

use crate::geometry::{Rect, Vec2};
use crate::model::NodeId;

/// A rubber-band rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRect {
    pub start: Vec2,
    pub end: Vec2,
}

impl SelectionRect {
    pub fn new(start: Vec2) -> Self {
        Self { start, end: start }
    }

    pub fn update(&mut self, end: Vec2) {
        self.end = end;
    }

    /// Normalized (min-max) bounds.
    pub fn rect(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }

    pub fn width(&self) -> f32 {
        (self.end.x - self.start.x).abs()
    }

    pub fn height(&self) -> f32 {
        (self.end.y - self.start.y).abs()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    nodes: IndexSet<NodeId>,
    junctions: IndexSet<NodeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.junctions.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.junctions.is_empty()
    }

    /// Selected nodes plus selected junctions.
    pub fn count(&self) -> usize {
        self.nodes.len() + self.junctions.len()
    }

    pub fn nodes(&self) -> &IndexSet<NodeId> {
        &self.nodes
    }

    pub fn junctions(&self) -> &IndexSet<NodeId> {
        &self.junctions
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().cloned().collect()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.nodes.contains(id)
    }

    pub fn is_junction_selected(&self, id: &str) -> bool {
        self.junctions.contains(id)
    }

    pub fn toggle(&mut self, id: &NodeId) {
        if !self.nodes.shift_remove(id) {
            self.nodes.insert(id.clone());
        }
    }

    pub fn toggle_junction(&mut self, id: &NodeId) {
        if !self.junctions.shift_remove(id) {
            self.junctions.insert(id.clone());
        }
    }

    /// Select a single node, clearing everything else.
    pub fn select_only(&mut self, id: &NodeId) {
        self.clear();
        self.nodes.insert(id.clone());
    }

    pub fn select_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a NodeId>) {
        self.nodes.extend(ids.into_iter().cloned());
    }

    /// Replace the whole selection.
    pub fn set(
        &mut self,
        nodes: impl IntoIterator<Item = NodeId>,
        junctions: impl IntoIterator<Item = NodeId>,
    ) {
        self.nodes = nodes.into_iter().collect();
        self.junctions = junctions.into_iter().collect();
    }

    /// Apply a pointer click on a node body.
    ///
    /// - additive (shift/ctrl): toggle membership, leave the rest alone
    /// - plain click on an unselected node: select only that node
    /// - plain click on an already selected node: keep the selection so a
    ///   multi-drag can start
    pub fn click(&mut self, id: &NodeId, additive: bool) {
        if additive {
            self.toggle(id);
        } else if !self.nodes.contains(id) {
            self.select_only(id);
        }
    }

    /// Drop every node and junction the predicates reject.
    pub fn retain(
        &mut self,
        mut keep_node: impl FnMut(&NodeId) -> bool,
        mut keep_junction: impl FnMut(&NodeId) -> bool,
    ) {
        self.nodes.retain(|id| keep_node(id));
        self.junctions.retain(|id| keep_junction(id));
    }
}
