//! The canvas controller.
//!
//! [`Canvas`] owns everything a session needs: the entity store, viewport,
//! expanded set, selection and the single [`InteractionState`]. The renderer
//! reads from it after each call; all mutation goes through `&mut self`, so
//! two interaction sessions can never overlap.
//!
//! # Example
//!
//! ```rust,ignore
//! use mindcanvas::{Canvas, CanvasConfig, ContentMode, PointerEvent, Vec2};
//!
//! let mut canvas = Canvas::new(ContentMode::MindMap, CanvasConfig::default());
//! canvas.load_raw(r#"{ "rootLabel": "Cells", "branches": [] }"#);
//! canvas.pointer_down(PointerEvent::primary(Vec2::new(400.0, 300.0), 0));
//! canvas.pointer_up(PointerEvent::primary(Vec2::new(420.0, 300.0), 16));
//! ```

use std::io::Write;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::commands::{self, Command};
use crate::config::CanvasConfig;
use crate::content::Content;
use crate::export::{self, ExportFormat};
use crate::geometry::{Rect, Vec2};
use crate::hit_test::{Hit, HitTester, RectHit};
use crate::interaction::{
    DragSession, FrameThrottle, InteractionMode, InteractionState, JunctionSession, PanSession,
    PointerButton, PointerEvent, RubberBandSession, Snapshot,
};
use crate::layout::{self, Seeded};
use crate::model::{ContentMode, Node, NodeId};
use crate::selection::{Selection, SelectionRect};
use crate::store::{EntityStore, IdGenerator};
use crate::viewport::Viewport;
use crate::visibility::{ExpandedSet, Visibility};

pub struct Canvas {
    mode: ContentMode,
    config: CanvasConfig,
    store: EntityStore,
    viewport: Viewport,
    expanded: ExpandedSet,
    selection: Selection,
    state: InteractionState,
    throttle: FrameThrottle,
    ids: IdGenerator,
    rng: StdRng,
    canvas_size: Vec2,
    /// Whether the current content is the built-in placeholder.
    placeholder: bool,
    /// Layout of the last load, replayed by [`Canvas::reset_layout`].
    seeded: Option<Seeded>,
}

impl Canvas {
    /// An empty canvas. Call one of the `load` methods to seed content.
    pub fn new(mode: ContentMode, config: CanvasConfig) -> Self {
        Self::with_rng(mode, config, StdRng::from_os_rng())
    }

    /// Same as [`Canvas::new`] with a fixed random seed, for reproducible
    /// colors and tilts.
    pub fn with_seed(mode: ContentMode, config: CanvasConfig, seed: u64) -> Self {
        Self::with_rng(mode, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(mode: ContentMode, config: CanvasConfig, rng: StdRng) -> Self {
        let config = config.sanitized();
        Self {
            mode,
            viewport: Viewport::new(config.min_zoom, config.max_zoom),
            throttle: FrameThrottle::new(config.frame_interval_ms()),
            config,
            store: EntityStore::new(),
            expanded: ExpandedSet::new(),
            selection: Selection::new(),
            state: InteractionState::Idle,
            ids: IdGenerator::new(),
            rng,
            canvas_size: Vec2::new(1200.0, 800.0),
            placeholder: false,
            seeded: None,
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Accessors
    // ────────────────────────────────────────────────────────────────────

    pub fn mode(&self) -> ContentMode {
        self.mode
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.store.get(id)
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn expanded(&self) -> &ExpandedSet {
        &self.expanded
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn interaction_mode(&self) -> InteractionMode {
        self.state.mode()
    }

    /// The rubber band being dragged, in screen coordinates.
    pub fn rubber_band(&self) -> Option<Rect> {
        self.state.rubber_band().map(|r| r.rect())
    }

    pub fn canvas_size(&self) -> Vec2 {
        self.canvas_size
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Store revision; changes whenever a node changes.
    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    /// Fresh visibility for the current expanded set.
    pub fn visibility(&self) -> Visibility {
        Visibility::resolve(&self.store, &self.expanded)
    }

    pub fn is_visible(&self, id: &str) -> bool {
        crate::visibility::is_visible(&self.store, &self.expanded, id)
    }

    /// Set the on-screen canvas size used by "fit".
    pub fn set_canvas_size(&mut self, size: Vec2) {
        self.canvas_size = size;
    }

    // ────────────────────────────────────────────────────────────────────
    // Loading
    // ────────────────────────────────────────────────────────────────────

    /// Replace the canvas content. `None` loads the placeholder for the
    /// current mode.
    pub fn load(&mut self, content: Option<&Content>) {
        let seeded = layout::seed(content, self.mode, &self.config.layout);
        self.install(seeded);
    }

    /// Parse raw generator output and load it; unusable input loads the
    /// placeholder instead.
    pub fn load_raw(&mut self, raw: &str) {
        let seeded = layout::seed_raw(raw, self.mode, &self.config.layout);
        self.install(seeded);
    }

    /// Replace the canvas content with prebuilt nodes. Every node with
    /// children starts expanded.
    pub fn load_nodes(&mut self, mode: ContentMode, nodes: Vec<Node>) {
        let root = nodes.iter().find(|n| n.is_root()).map(|n| n.id.clone());
        self.install(Seeded {
            mode,
            nodes,
            root,
            placeholder: false,
        });
        let store = &self.store;
        self.expanded = store
            .ids()
            .filter(|id| store.has_children(id.as_str()))
            .cloned()
            .collect();
    }

    fn install(&mut self, seeded: Seeded) {
        self.viewport = seeded.fit(&self.config, self.canvas_size);
        self.mode = seeded.mode;
        self.placeholder = seeded.placeholder;
        self.expanded = seeded.root.iter().cloned().collect();
        self.selection.clear();
        self.state = InteractionState::Idle;
        self.throttle.reset();
        self.ids = IdGenerator::new();
        self.store = seeded.clone().into_store();
        self.seeded = Some(seeded);
        info!(
            mode = ?self.mode,
            nodes = self.store.len(),
            placeholder = self.placeholder,
            "loaded canvas content"
        );
    }

    /// Write the current content in `format`.
    pub fn export(&self, format: ExportFormat, out: impl Write) -> anyhow::Result<()> {
        export::export(&self.store, &self.viewport, format, out)
    }

    // ────────────────────────────────────────────────────────────────────
    // Viewport
    // ────────────────────────────────────────────────────────────────────

    pub fn zoom_at(&mut self, screen_point: Vec2, delta: f32) {
        self.viewport.zoom_at(screen_point, delta);
    }

    pub fn zoom_by_factor(&mut self, screen_point: Vec2, factor: f32) {
        self.viewport.zoom_by_factor(screen_point, factor);
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.viewport.pan_by(delta);
    }

    /// Put every node back where the last load placed it.
    ///
    /// Re-seeds the store from the loaded layout, so nodes created or
    /// edited since are discarded. Selection is cleared, only the root is
    /// expanded and the view is fitted again. No-op before the first load.
    pub fn reset_layout(&mut self) {
        let Some(seeded) = self.seeded.take() else {
            debug!("reset layout before any load");
            return;
        };
        self.install(seeded);
    }

    /// Reset the view: identity transform, or framed on all nodes when `fit`
    /// is set.
    pub fn reset_view(&mut self, fit: bool) {
        match (fit, self.store.bounds(self.node_size())) {
            (true, Some(bounds)) => self.viewport.fit(
                bounds,
                self.canvas_size,
                self.config.fit_margin,
                self.config.fit_min_zoom,
            ),
            _ => self.viewport.reset(),
        }
    }

    fn node_size(&self) -> Vec2 {
        self.config.node_size(self.mode)
    }

    // ────────────────────────────────────────────────────────────────────
    // Hit testing
    // ────────────────────────────────────────────────────────────────────

    pub fn point_hit(&self, screen: Vec2) -> Hit {
        let visibility = self.visibility();
        self.tester(&visibility).point_hit(screen)
    }

    pub fn rect_hit(&self, screen_rect: Rect) -> RectHit {
        let visibility = self.visibility();
        self.tester(&visibility).rect_hit(screen_rect)
    }

    fn tester<'a>(&'a self, visibility: &'a Visibility) -> HitTester<'a> {
        HitTester {
            store: &self.store,
            visibility,
            viewport: &self.viewport,
            node_size: self.node_size(),
            junction_radius: self.config.junction_hit_radius,
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Pointer events
    // ────────────────────────────────────────────────────────────────────

    /// Start an interaction. Ignored while another one is active.
    pub fn pointer_down(&mut self, ev: PointerEvent) {
        if !self.state.is_idle() {
            debug!(mode = ?self.state.mode(), "pointer down ignored, session active");
            return;
        }
        self.throttle.reset();
        match self.point_hit(ev.position) {
            Hit::Junction(owner) => self.begin_junction(owner, ev),
            Hit::Node(id) => self.begin_node(id, ev),
            Hit::Canvas => self.begin_canvas(ev),
        }
        debug!(mode = ?self.state.mode(), "pointer down");
    }

    fn begin_junction(&mut self, owner: NodeId, ev: PointerEvent) {
        if ev.modifiers.additive() {
            self.selection.toggle_junction(&owner);
            return;
        }
        let group: Vec<NodeId> =
            if self.selection.is_junction_selected(owner.as_str()) && self.selection.junctions().len() > 1 {
                self.selection.junctions().iter().cloned().collect()
            } else {
                vec![owner.clone()]
            };
        self.state = InteractionState::DraggingJunction(JunctionSession {
            owner,
            start_screen: ev.position,
            anchor_world: self.viewport.to_world(ev.position),
            moved: false,
            snapshot: Snapshot::capture_junctions(&self.store, &group),
        });
    }

    fn begin_node(&mut self, id: NodeId, ev: PointerEvent) {
        let Some(node) = self.store.get(id.as_str()) else {
            debug!(%id, "pointer down on unknown node");
            return;
        };
        let pinned = node.pinned;

        self.selection.click(&id, ev.modifiers.additive());
        if ev.button != PointerButton::Primary || !self.selection.is_selected(id.as_str()) {
            return;
        }

        let anchor_world = self.viewport.to_world(ev.position);
        if self.selection.nodes().len() > 1 {
            let snapshot = Snapshot::capture(&self.store, self.selection.nodes());
            self.state = InteractionState::DraggingMulti(DragSession {
                anchor_world,
                snapshot,
            });
        } else if pinned {
            debug!(%id, "pinned node not dragged");
        } else {
            let snapshot = Snapshot::capture(&self.store, [&id]);
            self.state = InteractionState::DraggingNode(DragSession {
                anchor_world,
                snapshot,
            });
        }
    }

    fn begin_canvas(&mut self, ev: PointerEvent) {
        match ev.button {
            PointerButton::Secondary | PointerButton::Middle => {
                self.state = InteractionState::Panning(PanSession {
                    start_screen: ev.position,
                    pan_start: self.viewport.pan(),
                });
            }
            PointerButton::Primary => {
                let additive = ev.modifiers.additive();
                let base = self.selection.clone();
                if !additive {
                    self.selection.clear();
                }
                self.state = InteractionState::RubberBandSelecting(RubberBandSession {
                    rect: SelectionRect::new(ev.position),
                    additive,
                    base,
                });
            }
        }
    }

    /// Pointer moved. Applied immediately or parked until the next frame.
    pub fn pointer_move(&mut self, ev: PointerEvent) {
        if self.state.is_idle() {
            return;
        }
        if let InteractionState::DraggingJunction(session) = &mut self.state {
            if !session.moved
                && session.start_screen.distance(ev.position) >= self.config.drag_threshold
            {
                session.moved = true;
            }
        }
        if let Some(position) = self.throttle.offer(ev.position, ev.time_ms) {
            self.apply_pointer(position);
        }
    }

    /// Animation-frame tick: apply a parked pointer move if one is due, and
    /// expire "appear" flags.
    pub fn frame(&mut self, now_ms: u64) {
        if let Some(position) = self.throttle.frame(now_ms) {
            self.apply_pointer(position);
        }
        self.expire_appear(now_ms);
    }

    /// End the active interaction at the release position.
    pub fn pointer_up(&mut self, ev: PointerEvent) {
        if self.state.is_idle() {
            return;
        }
        if let InteractionState::DraggingJunction(session) = &mut self.state {
            if session.start_screen.distance(ev.position) >= self.config.drag_threshold {
                session.moved = true;
            }
        }
        self.throttle.flush();
        self.apply_pointer(ev.position);
        self.finish();
    }

    /// Pointer capture was lost. Ends the session like a release at the
    /// last known pointer position.
    pub fn capture_lost(&mut self) {
        if self.state.is_idle() {
            return;
        }
        if let Some(position) = self.throttle.flush() {
            self.apply_pointer(position);
        }
        self.finish();
    }

    /// Abort the active interaction and restore what it changed.
    pub fn cancel(&mut self) {
        match std::mem::take(&mut self.state) {
            InteractionState::Idle => return,
            InteractionState::DraggingNode(s) | InteractionState::DraggingMulti(s) => {
                s.snapshot.restore(&mut self.store)
            }
            InteractionState::DraggingJunction(s) => {
                s.snapshot.apply_junction_delta(&mut self.store, Vec2::ZERO)
            }
            InteractionState::Panning(s) => self.viewport.set_pan(s.pan_start),
            InteractionState::RubberBandSelecting(s) => self.selection = s.base,
        }
        self.throttle.reset();
        debug!("interaction cancelled");
    }

    fn apply_pointer(&mut self, position: Vec2) {
        let world = self.viewport.to_world(position);
        match &mut self.state {
            InteractionState::Idle => {}
            InteractionState::DraggingNode(s) | InteractionState::DraggingMulti(s) => {
                s.snapshot.apply_node_delta(&mut self.store, world - s.anchor_world);
            }
            InteractionState::DraggingJunction(s) => {
                if s.moved {
                    s.snapshot
                        .apply_junction_delta(&mut self.store, world - s.anchor_world);
                }
            }
            InteractionState::Panning(s) => {
                self.viewport.set_pan(s.pan_start + (position - s.start_screen));
            }
            InteractionState::RubberBandSelecting(s) => {
                s.rect.update(position);
                let rect = s.rect.rect();
                let additive = s.additive;
                let base = s.base.clone();
                let hit = self.rect_hit(rect);
                if additive {
                    let nodes = base.nodes().iter().cloned().chain(hit.nodes);
                    let junctions = base.junctions().iter().cloned().chain(hit.junctions);
                    self.selection.set(nodes, junctions);
                } else {
                    self.selection.set(hit.nodes, hit.junctions);
                }
            }
        }
    }

    fn finish(&mut self) {
        let ended = std::mem::take(&mut self.state);
        if let InteractionState::DraggingJunction(s) = &ended {
            if !s.moved {
                self.toggle_expanded(&s.owner);
            }
        }
        self.throttle.reset();
        debug!(mode = ?ended.mode(), "interaction finished");
    }

    // ────────────────────────────────────────────────────────────────────
    // Commands
    // ────────────────────────────────────────────────────────────────────

    /// Apply a discrete command. Unknown ids are ignored.
    pub fn dispatch(&mut self, command: Command) {
        self.dispatch_at(command, 0);
    }

    /// [`Canvas::dispatch`] with a timestamp for the "appear" transition.
    pub fn dispatch_at(&mut self, command: Command, now_ms: u64) {
        debug!(?command, "dispatch");
        match command {
            Command::Create { at } => {
                let id = commands::create_node(
                    &mut self.store,
                    &mut self.ids,
                    self.mode,
                    at,
                    self.config.max_note_rotation,
                    &mut self.rng,
                );
                if let Some(node) = self.store.get_mut(id.as_str()) {
                    node.appearing = Some(now_ms);
                }
                self.selection.select_only(&id);
            }
            Command::Duplicate { ids } => {
                let copies = commands::duplicate_nodes(
                    &mut self.store,
                    &mut self.ids,
                    &ids,
                    self.config.duplicate_offset,
                );
                if !copies.is_empty() {
                    self.selection.set(copies, Vec::new());
                }
            }
            Command::Delete { ids } => {
                commands::delete_nodes(&mut self.store, &ids);
            }
            Command::SetContent { id, text } => {
                commands::set_content(&mut self.store, id.as_str(), &text);
            }
            Command::SetColor { id, swatch } => {
                commands::set_color(&mut self.store, id.as_str(), swatch);
            }
            Command::TogglePin { id } => {
                commands::toggle_pin(&mut self.store, id.as_str());
            }
            Command::ToggleExpanded { id } => self.toggle_expanded(&id),
            Command::MoveBy { ids, delta } => {
                commands::move_nodes(&mut self.store, &ids, delta);
            }
            Command::SelectAll => {
                let visibility = self.visibility();
                let visible: Vec<NodeId> = self
                    .store
                    .ids()
                    .filter(|id| visibility.is_visible(id.as_str()))
                    .cloned()
                    .collect();
                self.selection.select_all(&visible);
            }
            Command::ClearSelection => self.selection.clear(),
        }
        self.prune();
    }

    /// Flip `id` in the expanded set.
    pub fn toggle_expanded(&mut self, id: &NodeId) {
        if !self.store.contains(id.as_str()) {
            return;
        }
        if !self.expanded.remove(id) {
            self.expanded.insert(id.clone());
        }
        debug!(%id, expanded = self.expanded.contains(id), "toggled expansion");
        self.prune();
    }

    /// Drop hidden or deleted ids from the selection and expanded set.
    fn prune(&mut self) {
        let visibility = self.visibility();
        self.selection.retain(
            |id| visibility.is_visible(id.as_str()),
            |id| visibility.is_junction_visible(id.as_str()),
        );
        self.expanded
            .retain(|id| visibility.is_visible(id.as_str()));
    }

    /// Clear "appear" flags older than the configured duration.
    pub fn expire_appear(&mut self, now_ms: u64) {
        let duration = self.config.appear_duration_ms;
        let expired: Vec<NodeId> = self
            .store
            .all()
            .filter(|n| n.appearing.is_some_and(|t| now_ms.saturating_sub(t) >= duration))
            .map(|n| n.id.clone())
            .collect();
        for id in expired {
            if let Some(node) = self.store.get_mut(id.as_str()) {
                node.appearing = None;
            }
        }
    }
}
