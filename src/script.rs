//! Scripted sessions.
//!
//! A script is a JSON array of steps replayed against a [`Canvas`] in order,
//! standing in for the pointer and menu events a host would deliver:
//!
//! ```json
//! [
//!   { "pointerDown": { "position": { "x": 10, "y": 10 }, "timeMs": 0 } },
//!   { "pointerMove": { "position": { "x": 40, "y": 10 }, "timeMs": 16 } },
//!   { "pointerUp":   { "position": { "x": 40, "y": 10 }, "timeMs": 32 } },
//!   { "command": { "op": "selectAll" } },
//!   "cancel"
//! ]
//! ```

use anyhow::{Context, Result, bail};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::canvas::Canvas;
use crate::commands::Command;
use crate::geometry::Vec2;
use crate::interaction::PointerEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ScriptStep {
    PointerDown(PointerEvent),
    PointerMove(PointerEvent),
    PointerUp(PointerEvent),
    CaptureLost,
    /// Escape key.
    Cancel,
    Frame {
        now_ms: u64,
    },
    Zoom {
        at: Vec2,
        delta: f32,
    },
    Command(Command),
    ResetView {
        #[serde(default)]
        fit: bool,
    },
    /// Re-seed node positions from the loaded content.
    ResetLayout,
}

/// Decode a script from its JSON text.
pub fn parse(raw: &str) -> Result<Vec<ScriptStep>> {
    let steps: Vec<ScriptStep> = serde_json::from_str(raw).context("Invalid script")?;
    if steps.is_empty() {
        bail!("Script has no steps");
    }
    Ok(steps)
}

pub fn load(path: &Utf8Path) -> Result<Vec<ScriptStep>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path))?;
    parse(&raw).with_context(|| format!("Failed to parse script {}", path))
}

/// Run every step against `canvas`. Commands are stamped with the most
/// recent event time.
pub fn replay(canvas: &mut Canvas, steps: &[ScriptStep]) {
    let mut clock = 0;
    for step in steps {
        debug!(?step, "replay");
        match step {
            ScriptStep::PointerDown(ev) => {
                clock = ev.time_ms;
                canvas.pointer_down(*ev);
            }
            ScriptStep::PointerMove(ev) => {
                clock = ev.time_ms;
                canvas.pointer_move(*ev);
            }
            ScriptStep::PointerUp(ev) => {
                clock = ev.time_ms;
                canvas.pointer_up(*ev);
            }
            ScriptStep::CaptureLost => canvas.capture_lost(),
            ScriptStep::Cancel => canvas.cancel(),
            ScriptStep::Frame { now_ms } => {
                clock = *now_ms;
                canvas.frame(*now_ms);
            }
            ScriptStep::Zoom { at, delta } => canvas.zoom_at(*at, *delta),
            ScriptStep::Command(command) => canvas.dispatch_at(command.clone(), clock),
            ScriptStep::ResetView { fit } => canvas.reset_view(*fit),
            ScriptStep::ResetLayout => canvas.reset_layout(),
        }
    }
}
