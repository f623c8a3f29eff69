use rand::Rng;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

use crate::geometry::Vec2;

/// Deepest level a mind-map node may sit at (root = 0, leaf = 3).
pub const MAX_DEPTH: u8 = 3;

// ────────────────────────────────────────────────────────────────────────────
// NodeId
// ────────────────────────────────────────────────────────────────────────────

/// Unique identifier of a diagram node.
///
/// Seeded mind-map ids look like paths (`root`, `root-0`, `root-0-1`), but the
/// engine never parses them: ancestry comes from [`Node::parent`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Swatch / ContentMode
// ────────────────────────────────────────────────────────────────────────────

/// Categorical color of a node. Recoloring picks from this closed set; the
/// renderer maps each swatch to concrete fill and border colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Swatch {
    #[default]
    Yellow,
    Pink,
    Blue,
    Green,
    Purple,
    Orange,
}

impl Swatch {
    pub const ALL: [Swatch; 6] = [
        Swatch::Yellow,
        Swatch::Pink,
        Swatch::Blue,
        Swatch::Green,
        Swatch::Purple,
        Swatch::Orange,
    ];

    /// Resolve a color tag supplied by the content source. Accepts swatch
    /// names and a few loose aliases, case-insensitively.
    pub fn from_tag(tag: &str) -> Option<Swatch> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "yellow" | "amber" => Some(Swatch::Yellow),
            "pink" | "red" | "rose" => Some(Swatch::Pink),
            "blue" | "sky" | "cyan" => Some(Swatch::Blue),
            "green" | "lime" | "emerald" => Some(Swatch::Green),
            "purple" | "violet" | "indigo" => Some(Swatch::Purple),
            "orange" => Some(Swatch::Orange),
            _ => None,
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Swatch {
        Swatch::ALL[rng.random_range(0..Swatch::ALL.len())]
    }

    /// Swatch at position `index` when cycling through the palette.
    pub fn cycle(index: usize) -> Swatch {
        Swatch::ALL[index % Swatch::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            Swatch::Yellow => "yellow",
            Swatch::Pink => "pink",
            Swatch::Blue => "blue",
            Swatch::Green => "green",
            Swatch::Purple => "purple",
            Swatch::Orange => "orange",
        }
    }
}

/// Which kind of artifact the canvas is showing. Decides node hit size,
/// seeding strategy and whether new nodes get a tilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ContentMode {
    #[default]
    MindMap,
    StickyNotes,
}

// ────────────────────────────────────────────────────────────────────────────
// Node
// ────────────────────────────────────────────────────────────────────────────

/// A single draggable diagram element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    /// Parent in the mind-map tree. `None` for roots, notes and detached
    /// copies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    /// Tree depth, fixed at creation.
    #[serde(default)]
    pub depth: u8,
    /// World-space center of the node box.
    pub position: Vec2,
    /// Heading of a sticky note. Mind-map nodes leave this empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub color: Swatch,
    #[serde(default)]
    pub pinned: bool,
    /// Tilt in degrees, sticky notes only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    /// Linked node ids: the parent (if any) followed by children.
    #[serde(default)]
    pub connections: Vec<NodeId>,
    /// Bend point for outgoing child lines and expand/collapse handle.
    /// Present only while the node has at least one child.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub junction: Option<Vec2>,
    /// Timestamp (ms) of the pending "appear" transition.
    #[serde(skip)]
    pub appearing: Option<u64>,
}

impl Node {
    /// A top-level node with no parent and no links.
    pub fn new(id: impl Into<NodeId>, position: Vec2, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent: None,
            depth: 0,
            position,
            title: String::new(),
            content: content.into(),
            color: Swatch::default(),
            pinned: false,
            rotation: None,
            connections: Vec::new(),
            junction: None,
            appearing: None,
        }
    }

    /// A node hanging below `parent`. The parent link is recorded as the
    /// first connection; the caller adds the reverse link on the parent.
    pub fn child_of(
        parent: &Node,
        id: impl Into<NodeId>,
        position: Vec2,
        content: impl Into<String>,
    ) -> Self {
        let mut node = Node::new(id, position, content);
        node.parent = Some(parent.id.clone());
        node.depth = parent.depth.saturating_add(1);
        node.connections.push(parent.id.clone());
        node
    }

    pub fn with_color(mut self, color: Swatch) -> Self {
        self.color = color;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Add `id` to the connection list unless it is already there.
    pub fn connect(&mut self, id: &NodeId) {
        if !self.connections.contains(id) {
            self.connections.push(id.clone());
        }
    }

    /// Shift the node and its junction together.
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
        if let Some(j) = &mut self.junction {
            *j += delta;
        }
    }

    /// Text used by exporters: `title` and `content` joined for notes.
    pub fn label(&self) -> String {
        match (self.title.is_empty(), self.content.is_empty()) {
            (true, _) => self.content.clone(),
            (false, true) => self.title.clone(),
            (false, false) => format!("{}: {}", self.title, self.content),
        }
    }
}
