//! Pointer interaction state.
//!
//! [`InteractionState`] is the single active interaction session. Every
//! non-idle variant owns the data its mode needs, including the snapshot of
//! pre-drag positions that all deltas are computed against. The transition
//! logic lives on [`crate::canvas::Canvas`], which owns the state together
//! with the store and viewport it mutates.

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;
use crate::model::NodeId;
use crate::selection::{Selection, SelectionRect};
use crate::store::EntityStore;

// ────────────────────────────────────────────────────────────────────────────
// Pointer input
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    /// Select / drag.
    #[default]
    Primary,
    /// Pan.
    Secondary,
    /// Pan as well.
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
    };
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
    };

    /// Shift or ctrl: toggle selection instead of replacing it.
    pub fn additive(self) -> bool {
        self.shift || self.ctrl
    }
}

/// A pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerEvent {
    pub position: Vec2,
    #[serde(default)]
    pub button: PointerButton,
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Event timestamp in milliseconds, monotonic.
    #[serde(default)]
    pub time_ms: u64,
}

impl PointerEvent {
    pub fn primary(position: Vec2, time_ms: u64) -> Self {
        Self {
            position,
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
            time_ms,
        }
    }

    pub fn secondary(position: Vec2, time_ms: u64) -> Self {
        Self {
            button: PointerButton::Secondary,
            ..Self::primary(position, time_ms)
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Snapshots
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEntry {
    pub id: NodeId,
    pub position: Vec2,
    pub junction: Option<Vec2>,
}

/// Pre-drag positions of every entity a session moves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    entries: Vec<SnapshotEntry>,
}

impl Snapshot {
    /// Record the current position of each listed node that exists and is
    /// not pinned.
    pub fn capture<'a>(store: &EntityStore, ids: impl IntoIterator<Item = &'a NodeId>) -> Self {
        let entries = ids
            .into_iter()
            .filter_map(|id| store.get(id.as_str()))
            .filter(|n| !n.pinned)
            .map(|n| SnapshotEntry {
                id: n.id.clone(),
                position: n.position,
                junction: n.junction,
            })
            .collect();
        Self { entries }
    }

    /// Record the junction of each listed node that has one. Pinning only
    /// fixes the node body, so pinned owners are included.
    pub fn capture_junctions<'a>(
        store: &EntityStore,
        ids: impl IntoIterator<Item = &'a NodeId>,
    ) -> Self {
        let entries = ids
            .into_iter()
            .filter_map(|id| store.get(id.as_str()))
            .filter(|n| n.junction.is_some())
            .map(|n| SnapshotEntry {
                id: n.id.clone(),
                position: n.position,
                junction: n.junction,
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id.as_str() == id)
    }

    /// Place every node (and its junction) at snapshot + `delta`.
    pub fn apply_node_delta(&self, store: &mut EntityStore, delta: Vec2) {
        for entry in &self.entries {
            if let Some(node) = store.get_mut(entry.id.as_str()) {
                node.position = entry.position + delta;
                node.junction = entry.junction.map(|j| j + delta);
            }
        }
    }

    /// Place every junction at snapshot + `delta`; node bodies stay put.
    pub fn apply_junction_delta(&self, store: &mut EntityStore, delta: Vec2) {
        for entry in &self.entries {
            let Some(junction) = entry.junction else { continue };
            if let Some(node) = store.get_mut(entry.id.as_str()) {
                if node.junction.is_some() {
                    node.junction = Some(junction + delta);
                }
            }
        }
    }

    /// Put everything back where it was captured.
    pub fn restore(&self, store: &mut EntityStore) {
        self.apply_node_delta(store, Vec2::ZERO);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sessions
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    /// World point under the pointer at drag start.
    pub anchor_world: Vec2,
    pub snapshot: Snapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JunctionSession {
    pub owner: NodeId,
    pub start_screen: Vec2,
    pub anchor_world: Vec2,
    /// Set once the pointer travels past the drag threshold; a release
    /// without it is a click.
    pub moved: bool,
    pub snapshot: Snapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanSession {
    pub start_screen: Vec2,
    pub pan_start: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RubberBandSession {
    pub rect: SelectionRect,
    /// Union the band's hits with `base` instead of replacing.
    pub additive: bool,
    /// Selection at session start, for additive mode and cancel.
    pub base: Selection,
}

/// The one active interaction. A new session can only start from `Idle`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InteractionState {
    #[default]
    Idle,
    DraggingNode(DragSession),
    DraggingMulti(DragSession),
    DraggingJunction(JunctionSession),
    Panning(PanSession),
    RubberBandSelecting(RubberBandSession),
}

/// Fieldless mirror of [`InteractionState`] for callers that only need to
/// know which mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionMode {
    Idle,
    DraggingNode,
    DraggingMulti,
    DraggingJunction,
    Panning,
    RubberBandSelecting,
}

impl InteractionState {
    pub fn mode(&self) -> InteractionMode {
        match self {
            InteractionState::Idle => InteractionMode::Idle,
            InteractionState::DraggingNode(_) => InteractionMode::DraggingNode,
            InteractionState::DraggingMulti(_) => InteractionMode::DraggingMulti,
            InteractionState::DraggingJunction(_) => InteractionMode::DraggingJunction,
            InteractionState::Panning(_) => InteractionMode::Panning,
            InteractionState::RubberBandSelecting(_) => InteractionMode::RubberBandSelecting,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }

    /// The active rubber band, for drawing.
    pub fn rubber_band(&self) -> Option<&SelectionRect> {
        match self {
            InteractionState::RubberBandSelecting(s) => Some(&s.rect),
            _ => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Frame throttle
// ────────────────────────────────────────────────────────────────────────────

/// Caps processed pointer moves to one per frame interval.
///
/// A move inside the interval is parked as the pending position, replacing
/// any older pending one. There is never more than one queued position.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameThrottle {
    interval_ms: f64,
    last_applied: Option<u64>,
    pending: Option<Vec2>,
}

impl FrameThrottle {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            last_applied: None,
            pending: None,
        }
    }

    fn due(&self, now_ms: u64) -> bool {
        match self.last_applied {
            None => true,
            Some(last) => now_ms.saturating_sub(last) as f64 >= self.interval_ms,
        }
    }

    /// Offer a new pointer position. Returns it when it should be applied
    /// right away; otherwise it becomes the pending position.
    pub fn offer(&mut self, position: Vec2, now_ms: u64) -> Option<Vec2> {
        if self.due(now_ms) {
            self.last_applied = Some(now_ms);
            self.pending = None;
            Some(position)
        } else {
            self.pending = Some(position);
            None
        }
    }

    /// Animation-frame callback: hand out the pending position if its frame
    /// has come.
    pub fn frame(&mut self, now_ms: u64) -> Option<Vec2> {
        if self.pending.is_some() && self.due(now_ms) {
            self.last_applied = Some(now_ms);
            return self.pending.take();
        }
        None
    }

    /// Take the pending position regardless of timing (session end).
    pub fn flush(&mut self) -> Option<Vec2> {
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn reset(&mut self) {
        self.last_applied = None;
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Node;

    #[test]
    fn test_throttle_last_write_wins() {
        let mut t = FrameThrottle::new(8.0);
        assert_eq!(t.offer(Vec2::new(1.0, 0.0), 0), Some(Vec2::new(1.0, 0.0)));
        assert_eq!(t.offer(Vec2::new(2.0, 0.0), 2), None);
        assert_eq!(t.offer(Vec2::new(3.0, 0.0), 4), None);
        assert_eq!(t.frame(5), None);
        assert_eq!(t.frame(8), Some(Vec2::new(3.0, 0.0)));
        assert!(!t.has_pending());
    }

    #[test]
    fn test_throttle_flush() {
        let mut t = FrameThrottle::new(8.0);
        t.offer(Vec2::ZERO, 0);
        t.offer(Vec2::new(9.0, 9.0), 1);
        assert_eq!(t.flush(), Some(Vec2::new(9.0, 9.0)));
        assert_eq!(t.flush(), None);
    }

    #[test]
    fn test_snapshot_skips_pinned_and_missing() {
        let mut pinned = Node::new("b", Vec2::ZERO, "");
        pinned.pinned = true;
        let store = EntityStore::from_nodes([Node::new("a", Vec2::ZERO, ""), pinned]);
        let ids = [NodeId::from("a"), NodeId::from("b"), NodeId::from("c")];
        let snap = Snapshot::capture(&store, &ids);
        assert_eq!(snap.len(), 1);
        assert!(snap.contains("a"));
    }

    #[test]
    fn test_junction_snapshot_keeps_pinned_owners() {
        let mut pinned = Node::new("a", Vec2::ZERO, "");
        pinned.pinned = true;
        pinned.junction = Some(Vec2::new(90.0, 0.0));
        let store = EntityStore::from_nodes([pinned, Node::new("b", Vec2::ZERO, "")]);
        let snap = Snapshot::capture_junctions(&store, &[NodeId::from("a"), NodeId::from("b")]);
        assert_eq!(snap.len(), 1);
        assert!(snap.contains("a"));
    }

    #[test]
    fn test_snapshot_delta_is_absolute() {
        let mut store = EntityStore::from_nodes([Node::new("a", Vec2::new(10.0, 10.0), "")]);
        let snap = Snapshot::capture(&store, &[NodeId::from("a")]);
        snap.apply_node_delta(&mut store, Vec2::new(5.0, 0.0));
        snap.apply_node_delta(&mut store, Vec2::new(7.0, 1.0));
        assert_eq!(store.get("a").unwrap().position, Vec2::new(17.0, 11.0));
        snap.restore(&mut store);
        assert_eq!(store.get("a").unwrap().position, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_state_mode_mirror() {
        assert_eq!(InteractionState::default().mode(), InteractionMode::Idle);
        let pan = InteractionState::Panning(PanSession {
            start_screen: Vec2::ZERO,
            pan_start: Vec2::ZERO,
        });
        assert_eq!(pan.mode(), InteractionMode::Panning);
        assert!(!pan.is_idle());
    }
}
