//! 2D vector math and ray/segment intersection.
//!
//! Points are plain `nalgebra::Vector2<f64>` values; they are copied, never
//! shared, so nothing can change a position after construction.
//!
//! Conventions
//! - `normalize` multiplies by the reciprocal length. A zero vector yields NaN
//!   components; callers never normalize one (rays always aim at a target
//!   distinct from their origin).
//! - `degrees` is `atan2(y, x)` in degrees, range (-180, 180].

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

pub type Point = Vector2<f64>;

#[inline]
pub fn point(x: f64, y: f64) -> Point {
    Vector2::new(x, y)
}

/// Angle of `v` in degrees.
#[inline]
pub fn degrees(v: Point) -> f64 {
    v.y.atan2(v.x) * 180.0 / std::f64::consts::PI
}

#[inline]
pub fn distance(a: Point, b: Point) -> f64 {
    (a - b).norm()
}

/// Unit vector with the direction of `v`: `v * (1 / |v|)`.
#[inline]
pub fn normalize(v: Point) -> Point {
    v * (1.0 / v.norm())
}

/// Directed segment from `a` to `b`.
///
/// The same record doubles as a ray (see `scan::Ray`), in which case `b` is a
/// unit direction rather than a second endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub a: Point,
    pub b: Point,
}

impl Edge {
    #[inline]
    pub fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    /// Intersection of `self`, read as a ray (origin `a`, direction `b`), with
    /// the bounded segment `segment`.
    ///
    /// Hits are strict: `0 < t < 1` along the segment and `u > 0` along the
    /// ray, so segment endpoints and the ray origin never count. Parallel or
    /// degenerate pairs (`den == 0`) miss. The hit point is taken from the
    /// segment's parametric form.
    pub fn intersection(&self, segment: &Edge) -> Option<Point> {
        let (x1, y1) = (segment.a.x, segment.a.y);
        let (x2, y2) = (segment.b.x, segment.b.y);

        let (x3, y3) = (self.a.x, self.a.y);
        let x4 = self.a.x + self.b.x;
        let y4 = self.a.y + self.b.y;

        let den = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
        if den == 0.0 {
            return None;
        }

        let t = ((x1 - x3) * (y3 - y4) - (y1 - y3) * (x3 - x4)) / den;
        let u = -((x1 - x2) * (y1 - y3) - (y1 - y2) * (x1 - x3)) / den;

        if t > 0.0 && t < 1.0 && u > 0.0 {
            Some(point(x1 + t * (x2 - x1), y1 + t * (y2 - y1)))
        } else {
            None
        }
    }
}
