//! Expand/collapse visibility over the node tree.
//!
//! A node is visible when every ancestor on its parent chain is present in
//! the store and a member of the expanded set. Top-level nodes (roots, notes,
//! detached copies) are always visible. A collapsed node stays visible itself
//! but hides its whole subtree and its own outgoing lines.
//!
//! The result is recomputed from scratch whenever it is needed; the walk is
//! memoized per call so it stays linear in the node count.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::model::{Node, NodeId};
use crate::store::EntityStore;

pub type ExpandedSet = BTreeSet<NodeId>;

/// A parent → child connector as the renderer draws it.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorLine {
    pub parent: NodeId,
    pub child: NodeId,
    /// True only when the parent is visible and expanded.
    pub visible: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Visibility {
    nodes: HashSet<NodeId>,
    junctions: HashSet<NodeId>,
    lines: Vec<ConnectorLine>,
}

impl Visibility {
    /// Compute visibility for every node in `store`.
    pub fn resolve(store: &EntityStore, expanded: &ExpandedSet) -> Self {
        let mut memo: HashMap<&str, bool> = HashMap::with_capacity(store.len());
        let mut out = Visibility::default();

        for node in store.all() {
            if node_visible(store, expanded, node, &mut memo) {
                out.nodes.insert(node.id.clone());
                if node.junction.is_some() {
                    out.junctions.insert(node.id.clone());
                }
            }
        }

        // Child-only edges: links whose far end names this node as parent.
        for node in store.all() {
            for link in &node.connections {
                let Some(child) = store.get(link.as_str()) else { continue };
                if child.parent.as_ref() != Some(&node.id) {
                    continue;
                }
                let visible = out.nodes.contains(&node.id) && expanded.contains(&node.id);
                out.lines.push(ConnectorLine {
                    parent: node.id.clone(),
                    child: child.id.clone(),
                    visible,
                });
            }
        }

        out
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.nodes.contains(id)
    }

    /// The junction of `id` is drawn and hit-testable.
    pub fn is_junction_visible(&self, id: &str) -> bool {
        self.junctions.contains(id)
    }

    pub fn visible_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn lines(&self) -> &[ConnectorLine] {
        &self.lines
    }

    pub fn visible_lines(&self) -> impl Iterator<Item = &ConnectorLine> {
        self.lines.iter().filter(|l| l.visible)
    }
}

fn node_visible<'a>(
    store: &'a EntityStore,
    expanded: &ExpandedSet,
    node: &'a Node,
    memo: &mut HashMap<&'a str, bool>,
) -> bool {
    if let Some(&v) = memo.get(node.id.as_str()) {
        return v;
    }
    let visible = match &node.parent {
        None => true,
        Some(parent_id) => match store.get(parent_id.as_str()) {
            // Orphans of a deleted parent cannot be reached anymore.
            None => false,
            Some(parent) => {
                expanded.contains(parent_id)
                    && parent.depth < node.depth
                    && node_visible(store, expanded, parent, memo)
            }
        },
    };
    memo.insert(node.id.as_str(), visible);
    visible
}

/// Standalone check for a single node; same rule as [`Visibility::resolve`].
pub fn is_visible(store: &EntityStore, expanded: &ExpandedSet, id: &str) -> bool {
    let Some(node) = store.get(id) else {
        return false;
    };
    let mut memo = HashMap::new();
    node_visible(store, expanded, node, &mut memo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec2;

    fn chain() -> EntityStore {
        let mut root = Node::new("root", Vec2::ZERO, "Topic");
        let mut a = Node::child_of(&root, "root-0", Vec2::ZERO, "A");
        let mut b = Node::child_of(&a, "root-0-0", Vec2::ZERO, "B");
        let c = Node::child_of(&b, "root-0-0-0", Vec2::ZERO, "C");
        root.connect(&a.id);
        root.junction = Some(Vec2::ZERO);
        a.connect(&b.id);
        a.junction = Some(Vec2::ZERO);
        b.connect(&c.id);
        b.junction = Some(Vec2::ZERO);
        EntityStore::from_nodes([root, a, b, c])
    }

    fn expanded(ids: &[&str]) -> ExpandedSet {
        ids.iter().map(|s| NodeId::from(*s)).collect()
    }

    #[test]
    fn test_root_always_visible() {
        let store = chain();
        let vis = Visibility::resolve(&store, &ExpandedSet::new());
        assert!(vis.is_visible("root"));
        assert_eq!(vis.visible_count(), 1);
        assert!(vis.lines().iter().all(|l| !l.visible));
    }

    #[test]
    fn test_collapsing_middle_hides_subtree() {
        let store = chain();
        let vis = Visibility::resolve(&store, &expanded(&["root", "root-0-0"]));
        assert!(vis.is_visible("root-0"));
        assert!(!vis.is_visible("root-0-0"));
        assert!(!vis.is_visible("root-0-0-0"));
        assert!(vis.is_junction_visible("root-0"));
        assert!(!vis.is_junction_visible("root-0-0"));
    }

    #[test]
    fn test_lines_follow_parent_expansion() {
        let store = chain();
        let vis = Visibility::resolve(&store, &expanded(&["root", "root-0"]));
        let visible: Vec<(&str, &str)> = vis
            .visible_lines()
            .map(|l| (l.parent.as_str(), l.child.as_str()))
            .collect();
        assert_eq!(visible, vec![("root", "root-0"), ("root-0", "root-0-0")]);
        // Parent links on children are not reported as separate lines.
        assert_eq!(vis.lines().len(), 3);
    }

    #[test]
    fn test_orphan_is_hidden() {
        let mut store = chain();
        store.remove("root-0");
        let vis = Visibility::resolve(&store, &expanded(&["root", "root-0", "root-0-0"]));
        assert!(!vis.is_visible("root-0-0"));
        assert!(!is_visible(&store, &expanded(&["root"]), "root-0-0"));
    }
}
