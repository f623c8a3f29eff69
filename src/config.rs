//! Tunable constants of the canvas.
//!
//! Every field has a default, so a config file only needs to list what it
//! overrides:
//!
//! ```json
//! { "maxZoom": 4.0, "layout": { "gridColumns": 4 } }
//! ```

use anyhow::{Context, Result};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;
use crate::model::ContentMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Screen-space margin kept around content by "fit".
    pub fit_margin: f32,
    /// Lower bound for the zoom chosen by "fit".
    pub fit_min_zoom: f32,
    /// Node box size (world units) for mind-map nodes.
    pub mind_map_node_size: Vec2,
    /// Node box size (world units) for sticky notes.
    pub sticky_note_size: Vec2,
    /// Junction hit radius in screen pixels.
    pub junction_hit_radius: f32,
    /// Pointer travel in screen pixels that turns a junction press into a
    /// drag.
    pub drag_threshold: f32,
    /// Upper bound on processed pointer moves per second.
    pub max_updates_per_second: u32,
    /// World offset applied to duplicated nodes.
    pub duplicate_offset: Vec2,
    /// How long a freshly created node keeps its "appear" flag.
    pub appear_duration_ms: u64,
    /// Largest tilt (degrees, either direction) given to new sticky notes.
    pub max_note_rotation: f32,
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Horizontal distance between depth columns.
    pub column_spacing: f32,
    /// Vertical distance between stacked leaves.
    pub row_spacing: f32,
    /// Extra vertical gap between depth-1 branches.
    pub branch_gap: f32,
    /// Horizontal offset of a junction from its node's center.
    pub junction_offset: f32,
    pub grid_columns: usize,
    pub grid_spacing: Vec2,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.5,
            max_zoom: 3.0,
            fit_margin: 40.0,
            fit_min_zoom: 0.5,
            mind_map_node_size: Vec2::new(160.0, 48.0),
            sticky_note_size: Vec2::new(200.0, 180.0),
            junction_hit_radius: 10.0,
            drag_threshold: 5.0,
            max_updates_per_second: 120,
            duplicate_offset: Vec2::new(50.0, 50.0),
            appear_duration_ms: 300,
            max_note_rotation: 3.0,
            layout: LayoutConfig::default(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            column_spacing: 260.0,
            row_spacing: 70.0,
            branch_gap: 30.0,
            junction_offset: 90.0,
            grid_columns: 3,
            grid_spacing: Vec2::new(240.0, 220.0),
        }
    }
}

impl CanvasConfig {
    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path))?;
        let config: CanvasConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path))?;
        Ok(config.sanitized())
    }

    /// Repair inverted or non-positive values so downstream math never
    /// divides by zero.
    pub fn sanitized(mut self) -> Self {
        if !(self.min_zoom > 0.0) {
            self.min_zoom = 0.05;
        }
        if self.max_zoom < self.min_zoom {
            std::mem::swap(&mut self.min_zoom, &mut self.max_zoom);
        }
        self.max_updates_per_second = self.max_updates_per_second.max(1);
        self.layout.grid_columns = self.layout.grid_columns.max(1);
        self
    }

    pub fn node_size(&self, mode: ContentMode) -> Vec2 {
        match mode {
            ContentMode::MindMap => self.mind_map_node_size,
            ContentMode::StickyNotes => self.sticky_note_size,
        }
    }

    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / f64::from(self.max_updates_per_second.max(1))
    }
}
