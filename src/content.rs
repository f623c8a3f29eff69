//! Generated study content as handed over by the content source.
//!
//! Two shapes are accepted:
//!
//! ```json
//! { "rootLabel": "Topic", "branches": [{ "title": "A", "children": [] }] }
//! { "notes": [{ "title": "T", "content": "C", "colorTag": "blue" }] }
//! ```
//!
//! Generators often wrap JSON in a Markdown code fence or surround it with
//! chatter; [`Content::parse`] strips both before decoding.

use anyhow::{Context, Result, bail};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

/// One labelled node of a generated mind-map, with nested children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub title: String,
    #[serde(default)]
    pub children: Vec<Topic>,
}

impl Topic {
    pub fn leaf(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(title: impl Into<String>, children: Vec<Topic>) -> Self {
        Self {
            title: title.into(),
            children,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MindMapContent {
    pub root_label: String,
    #[serde(default)]
    pub branches: Vec<Topic>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteContent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub color_tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotesContent {
    pub notes: Vec<NoteContent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    MindMap(MindMapContent),
    Notes(NotesContent),
}

impl Content {
    /// Decode a generation result.
    pub fn parse(raw: &str) -> Result<Content> {
        let json = extract_json(raw).context("No JSON object found in content")?;
        let content: Content =
            serde_json::from_str(json).context("Content does not match a known shape")?;
        content.validate()?;
        Ok(content)
    }

    /// Read and decode a content file.
    pub fn load(path: &Utf8Path) -> Result<Content> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read content {}", path))?;
        Content::parse(&raw).with_context(|| format!("Failed to parse content {}", path))
    }

    fn validate(&self) -> Result<()> {
        match self {
            Content::MindMap(m) if m.root_label.trim().is_empty() => {
                bail!("Mind-map content has an empty root label")
            }
            Content::Notes(n) if n.notes.is_empty() => bail!("Note content has no notes"),
            Content::Notes(n)
                if n.notes
                    .iter()
                    .all(|note| note.title.trim().is_empty() && note.content.trim().is_empty()) =>
            {
                bail!("Note content only has empty notes")
            }
            _ => Ok(()),
        }
    }
}

/// Slice out the outermost `{ ... }` of `raw`, skipping code fences and prose
/// around it.
fn extract_json(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}
