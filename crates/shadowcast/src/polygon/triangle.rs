//! Fan triangles of the visibility polygon.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::vector::{degrees, Point};

/// Three-vertex polygon; in a fan the first vertex is the light position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Triangle {
    pub vertices: [Point; 3],
}

impl Triangle {
    #[inline]
    pub fn new(a: Point, b: Point, c: Point) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    /// Shoelace area, always non-negative.
    pub fn area(&self) -> f64 {
        let [a, b, c] = self.vertices;
        ((a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y)) / 2.0).abs()
    }

    /// Common apex of a fan.
    #[inline]
    pub fn apex(&self) -> Point {
        self.vertices[0]
    }

    /// Connect each edge point to its successor (wrapping) and to `center`.
    ///
    /// Pre: `edges` are already sorted by angle around `center`. Nothing is
    /// re-sorted or checked here; unsorted input yields a self-intersecting fan.
    /// Use [`Triangle::checked_fan`] to reject such input.
    pub fn clockwise_fan(center: Point, edges: &[Point]) -> Vec<Triangle> {
        let n = edges.len();
        (0..n)
            .map(|i| Triangle::new(center, edges[i], edges[(i + 1) % n]))
            .collect()
    }

    /// Like [`Triangle::clockwise_fan`] but fails with `UnorderedFan` unless
    /// the edge angles around `center` are cyclically non-decreasing: read
    /// with wrap-around they may drop back at most once.
    pub fn checked_fan(center: Point, edges: &[Point]) -> Result<Vec<Triangle>> {
        let n = edges.len();
        let angles: Vec<f64> = edges.iter().map(|&e| degrees(e - center)).collect();
        let descents = (0..n)
            .filter(|&i| angles[(i + 1) % n] < angles[i])
            .count();
        if descents > 1 {
            return Err(Error::UnorderedFan);
        }
        Ok(Self::clockwise_fan(center, edges))
    }
}

/// Combined area of all triangles.
pub fn fan_area(triangles: &[Triangle]) -> f64 {
    triangles.iter().map(Triangle::area).sum()
}
