//! One-time initial placement of generated content.
//!
//! This is not a layout engine: it runs once per content load, and its
//! result is replayed on "reset view" ([`crate::canvas::Canvas::reset_layout`]).
//! It never touches nodes afterwards.
//!
//! Mind-maps are laid out in four columns by depth. Leaves are stacked top to
//! bottom in visiting order and every parent sits at the midpoint of its
//! children's vertical span, so centering propagates bottom-up. Depth-1
//! branches are separated by an extra gap. Every node with children gets a
//! junction a fixed distance to its right.
//!
//! Notes are placed on a fixed-column grid.

use tracing::{debug, warn};

use crate::config::{CanvasConfig, LayoutConfig};
use crate::content::{Content, MindMapContent, NoteContent, NotesContent, Topic};
use crate::geometry::{Rect, Vec2};
use crate::model::{ContentMode, MAX_DEPTH, Node, NodeId, Swatch};
use crate::store::EntityStore;
use crate::viewport::Viewport;

/// Id of the mind-map root produced by the seeder.
pub const ROOT_ID: &str = "root";

/// Output of a seeding run.
#[derive(Debug, Clone)]
pub struct Seeded {
    pub mode: ContentMode,
    pub nodes: Vec<Node>,
    /// Mind-map root, expanded initially.
    pub root: Option<NodeId>,
    /// True when the built-in placeholder replaced missing content.
    pub placeholder: bool,
}

impl Seeded {
    pub fn into_store(self) -> EntityStore {
        EntityStore::from_nodes(self.nodes)
    }

    /// Viewport framing every seeded node inside `canvas_size`.
    pub fn fit(&self, config: &CanvasConfig, canvas_size: Vec2) -> Viewport {
        let mut viewport = Viewport::new(config.min_zoom, config.max_zoom);
        let size = config.node_size(self.mode);
        let bounds = self
            .nodes
            .iter()
            .map(|n| Rect::from_center_size(n.position, size))
            .reduce(|a, b| a.union(b));
        if let Some(bounds) = bounds {
            viewport.fit(bounds, canvas_size, config.fit_margin, config.fit_min_zoom);
        }
        viewport
    }
}

/// Lay out `content`, or the placeholder for `fallback_mode` when there is
/// none.
pub fn seed(content: Option<&Content>, fallback_mode: ContentMode, config: &LayoutConfig) -> Seeded {
    match content {
        Some(Content::MindMap(m)) => Seeded {
            mode: ContentMode::MindMap,
            nodes: seed_mind_map(m, config),
            root: Some(NodeId::from(ROOT_ID)),
            placeholder: false,
        },
        Some(Content::Notes(n)) => Seeded {
            mode: ContentMode::StickyNotes,
            nodes: seed_notes(n, config),
            root: None,
            placeholder: false,
        },
        None => {
            let mut seeded = match fallback_mode {
                ContentMode::MindMap => seed(
                    Some(&Content::MindMap(placeholder_mind_map())),
                    fallback_mode,
                    config,
                ),
                ContentMode::StickyNotes => seed(
                    Some(&Content::Notes(placeholder_notes())),
                    fallback_mode,
                    config,
                ),
            };
            seeded.placeholder = true;
            seeded
        }
    }
}

/// Parse raw generator output and lay it out, falling back to the
/// placeholder when it cannot be used.
pub fn seed_raw(raw: &str, fallback_mode: ContentMode, config: &LayoutConfig) -> Seeded {
    match Content::parse(raw) {
        Ok(content) => seed(Some(&content), fallback_mode, config),
        Err(err) => {
            warn!(error = %format!("{:#}", err), "unusable content, using placeholder");
            seed(None, fallback_mode, config)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Mind-map
// ────────────────────────────────────────────────────────────────────────────

pub fn seed_mind_map(content: &MindMapContent, config: &LayoutConfig) -> Vec<Node> {
    let mut nodes = vec![Node::new(ROOT_ID, Vec2::ZERO, non_empty(&content.root_label))];
    let mut cursor_y = 0.0;
    let mut branch_ys = Vec::with_capacity(content.branches.len());

    for (i, branch) in content.branches.iter().enumerate() {
        if i > 0 {
            cursor_y += config.branch_gap;
        }
        let id = format!("{}-{}", ROOT_ID, i);
        let y = place_topic(&mut nodes, 0, id, branch, Swatch::cycle(i), &mut cursor_y, config);
        branch_ys.push(y);
    }

    if let (Some(first), Some(last)) = (branch_ys.first(), branch_ys.last()) {
        let root = &mut nodes[0];
        root.position.y = (first + last) * 0.5;
        root.junction = Some(root.position + Vec2::new(config.junction_offset, 0.0));
    }
    debug!(nodes = nodes.len(), "seeded mind-map");
    nodes
}

/// Place `topic` below `nodes[parent]` and return its vertical center.
fn place_topic(
    nodes: &mut Vec<Node>,
    parent: usize,
    id: String,
    topic: &Topic,
    color: Swatch,
    cursor_y: &mut f32,
    config: &LayoutConfig,
) -> f32 {
    let mut node = Node::child_of(&nodes[parent], id.clone(), Vec2::ZERO, non_empty(&topic.title))
        .with_color(color);
    node.position.x = f32::from(node.depth) * config.column_spacing;
    let depth = node.depth;
    let index = nodes.len();
    nodes[parent].connect(&node.id);
    nodes.push(node);

    let children: &[Topic] = if depth < MAX_DEPTH {
        &topic.children
    } else {
        if !topic.children.is_empty() {
            debug!(%id, dropped = topic.children.len(), "topics deeper than the last column dropped");
        }
        &[]
    };

    let y = if children.is_empty() {
        let y = *cursor_y;
        *cursor_y += config.row_spacing;
        y
    } else {
        let ys: Vec<f32> = children
            .iter()
            .enumerate()
            .map(|(k, child)| {
                let child_id = format!("{}-{}", id, k);
                place_topic(nodes, index, child_id, child, color, cursor_y, config)
            })
            .collect();
        (ys[0] + ys[ys.len() - 1]) * 0.5
    };

    let node = &mut nodes[index];
    node.position.y = y;
    if !children.is_empty() {
        node.junction = Some(node.position + Vec2::new(config.junction_offset, 0.0));
    }
    y
}

fn non_empty(label: &str) -> String {
    let label = label.trim();
    if label.is_empty() {
        "Untitled".to_string()
    } else {
        label.to_string()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Notes
// ────────────────────────────────────────────────────────────────────────────

pub fn seed_notes(content: &NotesContent, config: &LayoutConfig) -> Vec<Node> {
    let columns = config.grid_columns.max(1);
    let nodes: Vec<Node> = content
        .notes
        .iter()
        .enumerate()
        .map(|(i, note)| {
            let col = (i % columns) as f32;
            let row = (i / columns) as f32;
            let position = Vec2::new(col * config.grid_spacing.x, row * config.grid_spacing.y);
            let color = note
                .color_tag
                .as_deref()
                .and_then(Swatch::from_tag)
                .unwrap_or_else(|| Swatch::cycle(i));
            let mut node = Node::new(format!("note-{}", i + 1), position, note.content.trim())
                .with_title(note.title.trim())
                .with_color(color);
            node.rotation = Some(seeded_tilt(i));
            node
        })
        .collect();
    debug!(nodes = nodes.len(), "seeded notes");
    nodes
}

/// Small deterministic tilt so a seeded board does not look machine-aligned.
fn seeded_tilt(index: usize) -> f32 {
    const TILTS: [f32; 5] = [-2.0, 1.0, -1.0, 2.0, 0.0];
    TILTS[index % TILTS.len()]
}

// ────────────────────────────────────────────────────────────────────────────
// Placeholders
// ────────────────────────────────────────────────────────────────────────────

pub fn placeholder_mind_map() -> MindMapContent {
    MindMapContent {
        root_label: "Study Topic".to_string(),
        branches: vec![
            Topic::with_children(
                "Key Concepts",
                vec![
                    Topic::with_children("Definitions", vec![Topic::leaf("Core terms")]),
                    Topic::with_children("Principles", vec![Topic::leaf("How it works")]),
                ],
            ),
            Topic::with_children(
                "Examples",
                vec![Topic::with_children("Worked example", vec![Topic::leaf("Step by step")])],
            ),
            Topic::with_children(
                "Review",
                vec![
                    Topic::leaf("Summary"),
                    Topic::leaf("Practice questions"),
                ],
            ),
        ],
    }
}

pub fn placeholder_notes() -> NotesContent {
    let note = |title: &str, content: &str, tag: &str| NoteContent {
        title: title.to_string(),
        content: content.to_string(),
        color_tag: Some(tag.to_string()),
    };
    NotesContent {
        notes: vec![
            note("Main idea", "Write the central idea here", "yellow"),
            note("Key fact", "Something worth remembering", "blue"),
            note("Question", "What is still unclear?", "pink"),
            note("Example", "A concrete case", "green"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(nodes: &'a [Node], id: &str) -> &'a Node {
        nodes.iter().find(|n| n.id.as_str() == id).unwrap()
    }

    fn sample() -> MindMapContent {
        MindMapContent {
            root_label: "Topic".into(),
            branches: vec![
                Topic::with_children("A", vec![Topic::leaf("A1"), Topic::leaf("A2")]),
                Topic::leaf("B"),
            ],
        }
    }

    #[test]
    fn test_columns_by_depth() {
        let cfg = LayoutConfig::default();
        let nodes = seed_mind_map(&sample(), &cfg);
        assert_eq!(find(&nodes, "root").position.x, 0.0);
        assert_eq!(find(&nodes, "root-0").position.x, cfg.column_spacing);
        assert_eq!(find(&nodes, "root-0-1").position.x, 2.0 * cfg.column_spacing);
        assert_eq!(find(&nodes, "root-0-1").depth, 2);
    }

    #[test]
    fn test_parent_centered_on_children() {
        let cfg = LayoutConfig::default();
        let nodes = seed_mind_map(&sample(), &cfg);
        let a1 = find(&nodes, "root-0-0").position.y;
        let a2 = find(&nodes, "root-0-1").position.y;
        assert_eq!(a2 - a1, cfg.row_spacing);
        assert_eq!(find(&nodes, "root-0").position.y, (a1 + a2) / 2.0);
        let b = find(&nodes, "root-1").position.y;
        assert_eq!(b, a2 + cfg.row_spacing + cfg.branch_gap);
        let root_y = find(&nodes, "root").position.y;
        assert_eq!(root_y, (find(&nodes, "root-0").position.y + b) / 2.0);
    }

    #[test]
    fn test_junctions_only_on_parents() {
        let cfg = LayoutConfig::default();
        let nodes = seed_mind_map(&sample(), &cfg);
        let a = find(&nodes, "root-0");
        assert_eq!(a.junction, Some(a.position + Vec2::new(cfg.junction_offset, 0.0)));
        assert!(find(&nodes, "root").junction.is_some());
        assert!(find(&nodes, "root-1").junction.is_none());
        assert!(find(&nodes, "root-0-0").junction.is_none());
    }

    #[test]
    fn test_connections_link_both_ways() {
        let nodes = seed_mind_map(&sample(), &LayoutConfig::default());
        let a = find(&nodes, "root-0");
        assert_eq!(
            a.connections,
            vec![NodeId::from("root"), NodeId::from("root-0-0"), NodeId::from("root-0-1")]
        );
    }

    #[test]
    fn test_depth_truncated_at_last_column() {
        let deep = MindMapContent {
            root_label: "R".into(),
            branches: vec![Topic::with_children(
                "1",
                vec![Topic::with_children(
                    "2",
                    vec![Topic::with_children("3", vec![Topic::leaf("4")])],
                )],
            )],
        };
        let nodes = seed_mind_map(&deep, &LayoutConfig::default());
        assert_eq!(nodes.len(), 4);
        assert!(nodes.iter().all(|n| n.depth <= MAX_DEPTH));
        assert!(find(&nodes, "root-0-0-0").junction.is_none());
    }

    #[test]
    fn test_notes_grid() {
        let cfg = LayoutConfig::default();
        let nodes = seed_notes(&placeholder_notes(), &cfg);
        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[3].position, Vec2::new(0.0, cfg.grid_spacing.y));
        assert_eq!(nodes[1].color, Swatch::Blue);
        assert!(nodes.iter().all(|n| n.parent.is_none() && n.rotation.is_some()));
    }

    #[test]
    fn test_garbage_falls_back_to_placeholder() {
        let seeded = seed_raw("definitely not json", ContentMode::MindMap, &LayoutConfig::default());
        assert!(seeded.placeholder);
        assert!(!seeded.nodes.is_empty());
        assert_eq!(seeded.root, Some(NodeId::from(ROOT_ID)));

        let seeded = seed_raw("", ContentMode::StickyNotes, &LayoutConfig::default());
        assert!(seeded.placeholder);
        assert_eq!(seeded.mode, ContentMode::StickyNotes);
    }

    #[test]
    fn test_fit_frames_seeded_content() {
        let cfg = CanvasConfig::default();
        let seeded = seed(None, ContentMode::MindMap, &cfg.layout);
        let canvas = Vec2::new(1200.0, 800.0);
        let vp = seeded.fit(&cfg, canvas);
        for n in &seeded.nodes {
            let p = vp.to_screen(n.position);
            assert!(p.x >= 0.0 && p.x <= canvas.x, "{} off screen at {:?}", n.id, p);
            assert!(p.y >= 0.0 && p.y <= canvas.y, "{} off screen at {:?}", n.id, p);
        }
    }
}
