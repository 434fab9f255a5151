//! Model-coordinate geometry primitives.

use serde::{Deserialize, Serialize};

/// Tolerance used when deciding whether two points coincide.
pub const EPSILON: f64 = 1e-6;

/// A point in diagram model coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation between `self` and `other` at parameter `t`.
    ///
    /// `t = 0` yields `self` exactly, `t = 1` yields `other` exactly.
    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point {
            x: (1.0 - t) * self.x + t * other.x,
            y: (1.0 - t) * self.y + t * other.y,
        }
    }

    /// Whether both coordinates are within [`EPSILON`] of `other`.
    pub fn almost_equals(self, other: Point) -> bool {
        (self.x - other.x).abs() < EPSILON && (self.y - other.y).abs() < EPSILON
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_endpoints_are_exact() {
        let a = Point::new(5.0, 5.0);
        let b = Point::new(8.0, 2.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
    }

    #[test]
    fn lerp_midpoint() {
        let a = Point::new(5.0, 5.0);
        let b = Point::new(8.0, 2.0);
        assert_eq!(a.lerp(b, 0.5), Point::new(6.5, 3.5));
    }

    #[test]
    fn almost_equals_tolerance() {
        let a = Point::new(1.0, 1.0);
        assert!(a.almost_equals(Point::new(1.0 + 1e-9, 1.0)));
        assert!(!a.almost_equals(Point::new(1.001, 1.0)));
    }
}
