//! Entity store: the set of diagram nodes keyed by id.
//!
//! Insertion order doubles as draw order, so the last node is the topmost one
//! for hit-testing. The store performs no validation beyond id uniqueness;
//! callers keep tree invariants (junctions, links) consistent.

use indexmap::IndexMap;
use tracing::error;

use crate::geometry::{Rect, Vec2};
use crate::model::{Node, NodeId};

#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    nodes: IndexMap<NodeId, Node>,
    revision: u64,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let mut store = Self::new();
        for node in nodes {
            store.insert(node);
        }
        store
    }

    /// Monotonic counter bumped by every mutation. Renderers compare it with
    /// the value they last drew.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Mutable access. Counts as a mutation whether or not the caller
    /// actually changes anything.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        let node = self.nodes.get_mut(id)?;
        self.revision += 1;
        Some(node)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Insert or replace a node. A replaced node keeps its draw position.
    pub fn upsert(&mut self, node: Node) -> Option<Node> {
        self.revision += 1;
        self.nodes.insert(node.id.clone(), node)
    }

    /// Insert a node whose id must be new.
    ///
    /// A duplicate id means the id source is broken; debug builds panic,
    /// release builds log and replace.
    pub fn insert(&mut self, node: Node) {
        debug_assert!(
            !self.nodes.contains_key(&node.id),
            "duplicate node id {}",
            node.id
        );
        if self.nodes.contains_key(&node.id) {
            error!(id = %node.id, "duplicate node id on insert, replacing existing node");
        }
        self.upsert(node);
    }

    /// Remove a node, keeping the draw order of the rest.
    pub fn remove(&mut self, id: &str) -> Option<Node> {
        let removed = self.nodes.shift_remove(id)?;
        self.revision += 1;
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.revision += 1;
    }

    /// All nodes in draw order (bottom first).
    pub fn all(&self) -> impl DoubleEndedIterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Present nodes whose parent is `id`, in draw order.
    pub fn children_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes
            .values()
            .filter(move |n| n.parent.as_ref().is_some_and(|p| p.as_str() == id))
    }

    pub fn has_children(&self, id: &str) -> bool {
        self.children_of(id).next().is_some()
    }

    /// Ancestor ids of `id`, nearest first, following parent links.
    ///
    /// Stops at a missing ancestor (that id is still reported) and bails out
    /// after `len()` steps so a corrupted parent cycle cannot loop forever.
    pub fn ancestors(&self, id: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.nodes.get(id).and_then(|n| n.parent.clone());
        while let Some(parent) = current {
            if out.len() > self.nodes.len() {
                error!(id, "parent cycle detected");
                break;
            }
            current = self.nodes.get(&parent).and_then(|n| n.parent.clone());
            out.push(parent);
        }
        out
    }

    /// World bounding box of every node box, given the box size.
    pub fn bounds(&self, node_size: Vec2) -> Option<Rect> {
        self.nodes
            .values()
            .map(|n| Rect::from_center_size(n.position, node_size))
            .reduce(|a, b| a.union(b))
    }
}

/// Hands out node ids that are unique within one canvas session.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id of the form `{prefix}-{n}` not present in `store`.
    pub fn fresh(&mut self, store: &EntityStore, prefix: &str) -> NodeId {
        loop {
            self.next += 1;
            let candidate = format!("{}-{}", prefix, self.next);
            if !store.contains(&candidate) {
                return NodeId::from(candidate);
            }
        }
    }
}
