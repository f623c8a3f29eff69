//! Plain 2D value types shared by the viewport, hit-testing and layout code.
//!
//! All coordinates are `f32`. Whether a value lives in world space or screen
//! space is decided by the caller; the types themselves carry no unit.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }

    /// Component-wise approximate equality, used by tests and by the viewport
    /// to skip no-op updates.
    pub fn approx_eq(self, other: Vec2, eps: f32) -> bool {
        (self.x - other.x).abs() <= eps && (self.y - other.y).abs() <= eps
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Vec2 {
    type Output = Vec2;
    fn div(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Axis-aligned rectangle stored as min/max corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Build a normalized rectangle from two arbitrary corners, e.g. the start
    /// and current point of a rubber band dragged up and to the left.
    pub fn from_points(a: Vec2, b: Vec2) -> Self {
        Self {
            min: Vec2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Vec2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
        )
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width(), self.height())
    }

    /// Inclusive point containment.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Partial overlap; rectangles that merely touch along an edge do not
    /// intersect.
    pub fn intersects(&self, other: Rect) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    pub fn union(&self, other: Rect) -> Rect {
        Rect {
            min: Vec2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Vec2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_from_points_normalizes() {
        let r = Rect::from_points(Vec2::new(100.0, 200.0), Vec2::new(50.0, 150.0));
        assert_eq!(r.min, Vec2::new(50.0, 150.0));
        assert_eq!(r.max, Vec2::new(100.0, 200.0));
        assert_eq!(r.size(), Vec2::new(50.0, 50.0));
    }

    #[test]
    fn test_rect_partial_overlap_intersects() {
        let a = Rect::from_min_max(Vec2::new(10.0, 10.0), Vec2::new(100.0, 100.0));
        assert!(a.intersects(Rect::from_min_max(Vec2::new(50.0, 50.0), Vec2::new(150.0, 150.0))));
        assert!(!a.intersects(Rect::from_min_max(Vec2::new(200.0, 200.0), Vec2::new(300.0, 300.0))));
        // Shared edge only.
        assert!(!a.intersects(Rect::from_min_max(Vec2::new(100.0, 10.0), Vec2::new(120.0, 20.0))));
    }

    #[test]
    fn test_rect_center_size() {
        let r = Rect::from_center_size(Vec2::new(0.0, 0.0), Vec2::new(20.0, 10.0));
        assert_eq!(r.min, Vec2::new(-10.0, -5.0));
        assert_eq!(r.center(), Vec2::ZERO);
        assert!(r.contains(Vec2::new(10.0, 5.0)));
        assert!(!r.contains(Vec2::new(10.1, 0.0)));
    }

    #[test]
    fn test_vec_ops() {
        let a = Vec2::new(3.0, 4.0);
        assert_eq!(a.length(), 5.0);
        assert_eq!(a * 2.0 - a, a);
        assert_eq!(-a / 1.0, Vec2::new(-3.0, -4.0));
    }
}
