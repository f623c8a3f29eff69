//! Read-only exporters for the canvas content.
//!
//! Text, Markdown and HTML render the node tree as an outline. Roots are
//! nodes without a live parent; children are listed top to bottom by their
//! current position, so the outline follows what the user arranged on the
//! canvas. JSON dumps the raw node list together with the viewport.

use std::io::Write;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::Node;
use crate::store::EntityStore;
use crate::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Text,
    Markdown,
    Html,
    Json,
}

/// Serialized form of [`ExportFormat::Json`].
#[derive(Serialize)]
struct Snapshot<'a> {
    nodes: Vec<&'a Node>,
    viewport: &'a Viewport,
}

/// Write `store` to `out` in `format`.
pub fn export(
    store: &EntityStore,
    viewport: &Viewport,
    format: ExportFormat,
    mut out: impl Write,
) -> Result<()> {
    let text = match format {
        ExportFormat::Json => {
            let snapshot = Snapshot {
                nodes: store.all().collect(),
                viewport,
            };
            let mut json =
                serde_json::to_string_pretty(&snapshot).context("Failed to serialize canvas")?;
            json.push('\n');
            json
        }
        ExportFormat::Text => outline_text(store),
        ExportFormat::Markdown => outline_markdown(store),
        ExportFormat::Html => outline_html(store),
    };
    out.write_all(text.as_bytes())
        .context("Failed to write export")?;
    out.flush().context("Failed to flush export")?;
    Ok(())
}

/// Plain indented outline, two spaces per level.
pub fn outline_text(store: &EntityStore) -> String {
    let mut out = String::new();
    for root in roots(store) {
        write_text(&mut out, store, root, 0);
    }
    out
}

/// Markdown bullet list. Multi-line content is folded onto the bullet line.
pub fn outline_markdown(store: &EntityStore) -> String {
    let mut out = String::new();
    for root in roots(store) {
        write_markdown(&mut out, store, root, 0);
    }
    out
}

/// Nested `<ul>` fragment with escaped labels.
pub fn outline_html(store: &EntityStore) -> String {
    let mut out = String::new();
    let roots = roots(store);
    if roots.is_empty() {
        return out;
    }
    out.push_str("<ul>\n");
    for root in roots {
        write_html(&mut out, store, root, 1);
    }
    out.push_str("</ul>\n");
    out
}

/// Nodes whose parent is absent or no longer in the store, in draw order.
fn roots(store: &EntityStore) -> Vec<&Node> {
    store
        .all()
        .filter(|n| match &n.parent {
            None => true,
            Some(parent) => !store.contains(parent.as_str()),
        })
        .collect()
}

fn children<'a>(store: &'a EntityStore, node: &'a Node) -> Vec<&'a Node> {
    let mut children: Vec<&Node> = store
        .children_of(node.id.as_str())
        .filter(|c| c.depth > node.depth)
        .collect();
    children.sort_by(|a, b| a.position.y.total_cmp(&b.position.y));
    children
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}

fn one_line(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn write_text(out: &mut String, store: &EntityStore, node: &Node, level: usize) {
    indent(out, level);
    out.push_str(&one_line(&node.label()));
    out.push('\n');
    for child in children(store, node) {
        write_text(out, store, child, level + 1);
    }
}

fn write_markdown(out: &mut String, store: &EntityStore, node: &Node, level: usize) {
    indent(out, level);
    out.push_str("- ");
    if node.title.is_empty() {
        out.push_str(&one_line(&node.content));
    } else {
        out.push_str(&format!("**{}**", one_line(&node.title)));
        if !node.content.trim().is_empty() {
            out.push_str(": ");
            out.push_str(&one_line(&node.content));
        }
    }
    out.push('\n');
    for child in children(store, node) {
        write_markdown(out, store, child, level + 1);
    }
}

fn write_html(out: &mut String, store: &EntityStore, node: &Node, level: usize) {
    let kids = children(store, node);
    indent(out, level);
    out.push_str("<li>");
    out.push_str(&html_escape::encode_text(&node.label()));
    if kids.is_empty() {
        out.push_str("</li>\n");
        return;
    }
    out.push('\n');
    indent(out, level + 1);
    out.push_str("<ul>\n");
    for child in kids {
        write_html(out, store, child, level + 2);
    }
    indent(out, level + 1);
    out.push_str("</ul>\n");
    indent(out, level);
    out.push_str("</li>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec2;

    fn tree() -> EntityStore {
        let mut root = Node::new("root", Vec2::ZERO, "Cells");
        let lower = Node::child_of(&root, "root-0", Vec2::new(260.0, 100.0), "Membrane");
        let upper = Node::child_of(&root, "root-1", Vec2::new(260.0, -100.0), "Nucleus <core>");
        root.connect(&lower.id);
        root.connect(&upper.id);
        EntityStore::from_nodes([root, lower, upper])
    }

    fn render(store: &EntityStore, format: ExportFormat) -> String {
        let mut buf = Vec::new();
        export(store, &Viewport::default(), format, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_text_orders_children_by_position() {
        let text = render(&tree(), ExportFormat::Text);
        assert_eq!(text, "Cells\n  Nucleus <core>\n  Membrane\n");
    }

    #[test]
    fn test_markdown_notes_use_bold_titles() {
        let note = Node::new("note-1", Vec2::ZERO, "Line one\nline two").with_title("Key fact");
        let md = render(&EntityStore::from_nodes([note]), ExportFormat::Markdown);
        assert_eq!(md, "- **Key fact**: Line one line two\n");
    }

    #[test]
    fn test_html_escapes_labels() {
        let html = render(&tree(), ExportFormat::Html);
        assert!(html.starts_with("<ul>\n  <li>Cells\n"));
        assert!(html.contains("<li>Nucleus &lt;core&gt;</li>"));
        assert!(html.trim_end().ends_with("</ul>"));
    }

    #[test]
    fn test_json_includes_viewport() {
        let json = render(&tree(), ExportFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(value["nodes"][1]["parent"], "root");
        assert_eq!(value["viewport"]["zoom"], 1.0);
    }

    #[test]
    fn test_orphans_become_roots() {
        let mut store = tree();
        store.remove("root");
        let text = render(&store, ExportFormat::Text);
        assert_eq!(text, "Membrane\nNucleus <core>\n");
    }
}
