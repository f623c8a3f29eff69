//! Discrete entity commands.
//!
//! The free functions in this module mutate an [`EntityStore`] directly and
//! keep link and junction bookkeeping consistent. [`Command`] is the value
//! form dispatched by [`crate::canvas::Canvas::dispatch`], which also takes
//! care of selection, the expanded set and the "appear" flag.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::geometry::Vec2;
use crate::model::{ContentMode, Node, NodeId, Swatch};
use crate::store::{EntityStore, IdGenerator};

// ────────────────────────────────────────────────────────────────────────────
// Command
// ────────────────────────────────────────────────────────────────────────────

/// A one-shot action from a context menu, toolbar or script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Command {
    /// New unconnected node at a world position.
    Create { at: Vec2 },
    /// Detached copies of the listed nodes.
    Duplicate { ids: Vec<NodeId> },
    /// Remove nodes. Descendants are not removed.
    Delete { ids: Vec<NodeId> },
    SetContent { id: NodeId, text: String },
    SetColor { id: NodeId, swatch: Swatch },
    TogglePin { id: NodeId },
    ToggleExpanded { id: NodeId },
    /// Shift nodes by a world delta. Pinned nodes stay put.
    MoveBy { ids: Vec<NodeId>, delta: Vec2 },
    SelectAll,
    ClearSelection,
}

// ────────────────────────────────────────────────────────────────────────────
// Operations
// ────────────────────────────────────────────────────────────────────────────

/// Insert a new unconnected node at `at` with a random swatch. Sticky notes
/// also get a small random tilt.
pub fn create_node<R: Rng + ?Sized>(
    store: &mut EntityStore,
    ids: &mut IdGenerator,
    mode: ContentMode,
    at: Vec2,
    max_rotation: f32,
    rng: &mut R,
) -> NodeId {
    let (prefix, content) = match mode {
        ContentMode::MindMap => ("node", "New idea"),
        ContentMode::StickyNotes => ("note", "New note"),
    };
    let id = ids.fresh(store, prefix);
    let mut node = Node::new(id.clone(), at, content).with_color(Swatch::random(rng));
    if mode == ContentMode::StickyNotes && max_rotation > 0.0 {
        node.rotation = Some(rng.random_range(-max_rotation..=max_rotation));
    }
    store.insert(node);
    debug!(%id, "created node");
    id
}

/// Clone each listed node at `offset` from the original.
///
/// Copies keep color, title, content, pin state and tilt. They are detached:
/// no parent, no connections, no junction. Returns the new ids in input
/// order; unknown ids are skipped.
pub fn duplicate_nodes(
    store: &mut EntityStore,
    ids: &mut IdGenerator,
    targets: &[NodeId],
    offset: Vec2,
) -> Vec<NodeId> {
    let mut created = Vec::new();
    for target in targets {
        let Some(original) = store.get(target.as_str()) else {
            continue;
        };
        let mut copy = original.clone();
        let id = ids.fresh(store, "copy");
        copy.id = id.clone();
        copy.parent = None;
        copy.depth = 0;
        copy.connections.clear();
        copy.junction = None;
        copy.appearing = None;
        copy.position = original.position + offset;
        store.insert(copy);
        created.push(id);
    }
    debug!(count = created.len(), "duplicated nodes");
    created
}

/// Remove the listed nodes without cascading.
///
/// Survivors drop their links to removed nodes, and a parent left without
/// children loses its junction. Children of a removed node keep their
/// dangling parent id and become unreachable. Returns the removed nodes.
pub fn delete_nodes(store: &mut EntityStore, targets: &[NodeId]) -> Vec<Node> {
    let mut removed = Vec::new();
    for target in targets {
        if let Some(node) = store.remove(target.as_str()) {
            removed.push(node);
        }
    }
    if removed.is_empty() {
        return removed;
    }

    let gone: HashSet<&NodeId> = removed.iter().map(|n| &n.id).collect();
    let affected: Vec<NodeId> = store
        .all()
        .filter(|n| n.connections.iter().any(|c| gone.contains(c)))
        .map(|n| n.id.clone())
        .collect();
    for id in affected {
        let has_children = store.has_children(id.as_str());
        if let Some(node) = store.get_mut(id.as_str()) {
            node.connections.retain(|c| !gone.contains(c));
            if !has_children {
                node.junction = None;
            }
        }
    }
    debug!(count = removed.len(), "deleted nodes");
    removed
}

/// Shift the listed nodes (and their junctions) by `delta`, skipping pinned
/// ones. Returns how many nodes moved.
pub fn move_nodes(store: &mut EntityStore, targets: &[NodeId], delta: Vec2) -> usize {
    let mut moved = 0;
    for target in targets {
        let Some(node) = store.get_mut(target.as_str()) else {
            continue;
        };
        if node.pinned {
            continue;
        }
        node.translate(delta);
        moved += 1;
    }
    moved
}

pub fn set_content(store: &mut EntityStore, id: &str, text: &str) -> bool {
    match store.get_mut(id) {
        Some(node) => {
            node.content = text.to_string();
            true
        }
        None => false,
    }
}

pub fn set_color(store: &mut EntityStore, id: &str, swatch: Swatch) -> bool {
    match store.get_mut(id) {
        Some(node) => {
            node.color = swatch;
            true
        }
        None => false,
    }
}

/// Flip the pin flag, returning the new state.
pub fn toggle_pin(store: &mut EntityStore, id: &str) -> Option<bool> {
    let node = store.get_mut(id)?;
    node.pinned = !node.pinned;
    Some(node.pinned)
}
