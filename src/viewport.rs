//! Pan/zoom viewport.
//!
//! World → screen is `screen = world * zoom + pan`, screen → world is
//! `world = (screen - pan) / zoom`. Zoom is always kept inside the configured
//! range; out-of-range requests are clamped, never rejected.

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    zoom: f32,
    pan: Vec2,
    min_zoom: f32,
    max_zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.5, 3.0)
    }
}

impl Viewport {
    pub fn new(min_zoom: f32, max_zoom: f32) -> Self {
        Self {
            zoom: 1.0_f32.clamp(min_zoom, max_zoom),
            pan: Vec2::ZERO,
            min_zoom,
            max_zoom,
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    pub fn set_pan(&mut self, pan: Vec2) {
        self.pan = pan;
    }

    /// Set zoom without moving the origin. Clamped.
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = self.clamp_zoom(zoom);
    }

    fn clamp_zoom(&self, zoom: f32) -> f32 {
        if zoom.is_nan() {
            return self.zoom;
        }
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    pub fn to_screen(&self, world: Vec2) -> Vec2 {
        world * self.zoom + self.pan
    }

    pub fn to_world(&self, screen: Vec2) -> Vec2 {
        (screen - self.pan) / self.zoom
    }

    pub fn rect_to_screen(&self, world: Rect) -> Rect {
        Rect::from_min_max(self.to_screen(world.min), self.to_screen(world.max))
    }

    /// Change zoom by `delta` while keeping the world point under
    /// `screen_point` fixed on screen.
    pub fn zoom_at(&mut self, screen_point: Vec2, delta: f32) {
        self.zoom_to(screen_point, self.zoom + delta);
    }

    /// Multiplicative variant of [`Viewport::zoom_at`], used for wheel input.
    pub fn zoom_by_factor(&mut self, screen_point: Vec2, factor: f32) {
        self.zoom_to(screen_point, self.zoom * factor);
    }

    fn zoom_to(&mut self, screen_point: Vec2, target: f32) {
        let old = self.zoom;
        let new = self.clamp_zoom(target);
        if (new - old).abs() <= f32::EPSILON {
            return;
        }
        self.pan = screen_point - (screen_point - self.pan) * (new / old);
        self.zoom = new;
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Zoom 1, no pan.
    pub fn reset(&mut self) {
        self.zoom = self.clamp_zoom(1.0);
        self.pan = Vec2::ZERO;
    }

    /// Frame `bounds` (world) inside a canvas of `canvas_size` (screen) with
    /// `margin` pixels on each side.
    ///
    /// The zoom never exceeds 1 so a lone node is not blown up, and never goes
    /// below `min_fit_zoom`; very large content then overflows the canvas and
    /// stays centered.
    pub fn fit(&mut self, bounds: Rect, canvas_size: Vec2, margin: f32, min_fit_zoom: f32) {
        let avail = Vec2::new(
            (canvas_size.x - 2.0 * margin).max(1.0),
            (canvas_size.y - 2.0 * margin).max(1.0),
        );
        let width = bounds.width().max(1.0);
        let height = bounds.height().max(1.0);
        let zoom = (avail.x / width).min(avail.y / height).min(1.0).max(min_fit_zoom);
        self.zoom = self.clamp_zoom(zoom);
        self.pan = canvas_size * 0.5 - bounds.center() * self.zoom;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_conversion() {
        let mut vp = Viewport::default();
        vp.zoom_at(Vec2::new(30.0, 40.0), 0.75);
        vp.pan_by(Vec2::new(12.0, -7.0));
        let w = Vec2::new(123.0, -45.0);
        assert!(vp.to_world(vp.to_screen(w)).approx_eq(w, 1e-3));
    }

    #[test]
    fn test_zoom_at_keeps_cursor_anchor() {
        let mut vp = Viewport::default();
        let cursor = Vec2::new(100.0, 100.0);
        let before = vp.to_world(cursor);
        vp.zoom_at(cursor, 0.5);
        assert_eq!(vp.zoom(), 1.5);
        assert!(vp.pan().approx_eq(Vec2::new(-50.0, -50.0), 1e-4));
        assert!(vp.to_world(cursor).approx_eq(before, 1e-4));
    }

    #[test]
    fn test_zoom_clamped() {
        let mut vp = Viewport::new(0.5, 3.0);
        vp.zoom_at(Vec2::ZERO, 100.0);
        assert_eq!(vp.zoom(), 3.0);
        vp.zoom_at(Vec2::ZERO, -100.0);
        assert_eq!(vp.zoom(), 0.5);
        vp.set_zoom(f32::NAN);
        assert_eq!(vp.zoom(), 0.5);
    }

    #[test]
    fn test_clamped_zoom_still_anchors() {
        let mut vp = Viewport::new(0.5, 3.0);
        let cursor = Vec2::new(250.0, 80.0);
        let before = vp.to_world(cursor);
        vp.zoom_by_factor(cursor, 10.0);
        assert_eq!(vp.zoom(), 3.0);
        assert!(vp.to_world(cursor).approx_eq(before, 1e-3));
    }

    #[test]
    fn test_reset() {
        let mut vp = Viewport::default();
        vp.zoom_at(Vec2::new(5.0, 5.0), 1.0);
        vp.reset();
        assert_eq!(vp.zoom(), 1.0);
        assert_eq!(vp.pan(), Vec2::ZERO);
    }

    #[test]
    fn test_fit_centers_content() {
        let mut vp = Viewport::new(0.1, 3.0);
        let bounds = Rect::from_min_max(Vec2::new(0.0, 0.0), Vec2::new(1000.0, 200.0));
        vp.fit(bounds, Vec2::new(600.0, 400.0), 50.0, 0.1);
        assert!((vp.zoom() - 0.5).abs() < 1e-5);
        let c = vp.to_screen(bounds.center());
        assert!(c.approx_eq(Vec2::new(300.0, 200.0), 1e-3));
    }

    #[test]
    fn test_fit_does_not_over_zoom_single_node() {
        let mut vp = Viewport::default();
        let bounds = Rect::from_center_size(Vec2::new(10.0, 10.0), Vec2::new(20.0, 10.0));
        vp.fit(bounds, Vec2::new(800.0, 600.0), 40.0, 0.5);
        assert_eq!(vp.zoom(), 1.0);
    }

    #[test]
    fn test_fit_respects_min_zoom() {
        let mut vp = Viewport::default();
        let bounds = Rect::from_min_max(Vec2::ZERO, Vec2::new(100_000.0, 100_000.0));
        vp.fit(bounds, Vec2::new(800.0, 600.0), 40.0, 0.5);
        assert_eq!(vp.zoom(), 0.5);
    }
}
