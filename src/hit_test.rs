//! Point and rectangle queries against the projected canvas.
//!
//! Everything here works in screen space: node boxes and junction handles are
//! projected through the viewport first. Hidden nodes and junctions are never
//! hit. Junction handles keep a fixed pixel radius regardless of zoom.

use crate::geometry::{Rect, Vec2};
use crate::model::NodeId;
use crate::store::EntityStore;
use crate::viewport::Viewport;
use crate::visibility::Visibility;

/// Result of a point query.
#[derive(Debug, Clone, PartialEq)]
pub enum Hit {
    /// The expand/collapse handle of a node.
    Junction(NodeId),
    /// A node body.
    Node(NodeId),
    /// Empty canvas.
    Canvas,
}

/// Result of a rectangle query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RectHit {
    pub nodes: Vec<NodeId>,
    pub junctions: Vec<NodeId>,
}

impl RectHit {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.junctions.is_empty()
    }
}

/// Borrowed view of the state a query needs.
pub struct HitTester<'a> {
    pub store: &'a EntityStore,
    pub visibility: &'a Visibility,
    pub viewport: &'a Viewport,
    /// World-space node box size for the current content mode.
    pub node_size: Vec2,
    /// Junction handle radius in screen pixels.
    pub junction_radius: f32,
}

impl HitTester<'_> {
    /// Screen-space box of a node centered on `position`.
    pub fn node_rect(&self, position: Vec2) -> Rect {
        self.viewport
            .rect_to_screen(Rect::from_center_size(position, self.node_size))
    }

    /// Screen-space square around a junction handle.
    pub fn junction_rect(&self, junction: Vec2) -> Rect {
        let c = self.viewport.to_screen(junction);
        Rect::from_center_size(c, Vec2::new(self.junction_radius, self.junction_radius) * 2.0)
    }

    /// Topmost hit under `p`. Junctions win over node bodies.
    pub fn point_hit(&self, p: Vec2) -> Hit {
        for node in self.store.all().rev() {
            let Some(j) = node.junction else { continue };
            if !self.visibility.is_junction_visible(node.id.as_str()) {
                continue;
            }
            if self.viewport.to_screen(j).distance(p) <= self.junction_radius {
                return Hit::Junction(node.id.clone());
            }
        }
        for node in self.store.all().rev() {
            if !self.visibility.is_visible(node.id.as_str()) {
                continue;
            }
            if self.node_rect(node.position).contains(p) {
                return Hit::Node(node.id.clone());
            }
        }
        Hit::Canvas
    }

    /// Every visible node and junction whose box overlaps `rect`, in draw
    /// order. Partial overlap counts.
    pub fn rect_hit(&self, rect: Rect) -> RectHit {
        let mut out = RectHit::default();
        for node in self.store.all() {
            if !self.visibility.is_visible(node.id.as_str()) {
                continue;
            }
            if self.node_rect(node.position).intersects(rect) {
                out.nodes.push(node.id.clone());
            }
            if let Some(j) = node.junction {
                if self.visibility.is_junction_visible(node.id.as_str())
                    && self.junction_rect(j).intersects(rect)
                {
                    out.junctions.push(node.id.clone());
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Node;
    use crate::visibility::ExpandedSet;

    fn setup() -> (EntityStore, Viewport) {
        let mut root = Node::new("root", Vec2::new(0.0, 0.0), "Topic");
        let child = Node::child_of(&root, "root-0", Vec2::new(200.0, 0.0), "Branch");
        root.connect(&child.id);
        root.junction = Some(Vec2::new(60.0, 0.0));
        (EntityStore::from_nodes([root, child]), Viewport::default())
    }

    fn tester<'a>(store: &'a EntityStore, vis: &'a Visibility, vp: &'a Viewport) -> HitTester<'a> {
        HitTester {
            store,
            visibility: vis,
            viewport: vp,
            node_size: Vec2::new(140.0, 40.0),
            junction_radius: 10.0,
        }
    }

    #[test]
    fn test_junction_beats_node_body() {
        let (store, vp) = setup();
        let expanded: ExpandedSet = [NodeId::from("root")].into_iter().collect();
        let vis = Visibility::resolve(&store, &expanded);
        let t = tester(&store, &vis, &vp);
        // (62, 3) is inside the root box (half width 70) and on the junction.
        assert_eq!(t.point_hit(Vec2::new(62.0, 3.0)), Hit::Junction("root".into()));
        assert_eq!(t.point_hit(Vec2::new(0.0, 0.0)), Hit::Node("root".into()));
        assert_eq!(t.point_hit(Vec2::new(0.0, 500.0)), Hit::Canvas);
    }

    #[test]
    fn test_hidden_node_not_hit() {
        let (store, vp) = setup();
        let vis = Visibility::resolve(&store, &ExpandedSet::new());
        let t = tester(&store, &vis, &vp);
        assert_eq!(t.point_hit(Vec2::new(200.0, 0.0)), Hit::Canvas);
        let hit = t.rect_hit(Rect::from_min_max(Vec2::new(-500.0, -500.0), Vec2::new(500.0, 500.0)));
        assert_eq!(hit.nodes, vec![NodeId::from("root")]);
    }

    #[test]
    fn test_rect_hit_partial_overlap() {
        let (store, vp) = setup();
        let expanded: ExpandedSet = [NodeId::from("root")].into_iter().collect();
        let vis = Visibility::resolve(&store, &expanded);
        let t = tester(&store, &vis, &vp);
        // Clips only the left edge of the child box (130..270).
        let hit = t.rect_hit(Rect::from_min_max(Vec2::new(120.0, -5.0), Vec2::new(135.0, 5.0)));
        assert_eq!(hit.nodes, vec![NodeId::from("root-0")]);
        assert!(hit.junctions.is_empty());
        let hit = t.rect_hit(Rect::from_min_max(Vec2::new(55.0, -2.0), Vec2::new(65.0, 2.0)));
        assert_eq!(hit.junctions, vec![NodeId::from("root")]);
    }

    #[test]
    fn test_hit_respects_zoom_and_pan() {
        let (store, mut vp) = setup();
        vp.set_zoom(2.0);
        vp.set_pan(Vec2::new(100.0, 100.0));
        let expanded: ExpandedSet = [NodeId::from("root")].into_iter().collect();
        let vis = Visibility::resolve(&store, &expanded);
        let t = tester(&store, &vis, &vp);
        // World (200, 0) → screen (500, 100).
        assert_eq!(t.point_hit(Vec2::new(500.0, 100.0)), Hit::Node("root-0".into()));
    }
}
