//! Closed vertex loops: boundaries, containment, convexity and validation.
//!
//! Purpose
//! - Model obstacles (and the viewport) as ordered vertex loops.
//! - Provide the predicates `validate` composes: even-odd containment, exact
//!   vertex membership and the cross-product convexity test.
//!
//! Conventions
//! - Loops are implicitly closed; the last vertex connects back to the first.
//! - Vertex order defines the interior side for the convexity sign test, but
//!   either winding is accepted.
//! - Polygons with fewer than 4 vertices are convex by definition.

mod triangle;
mod validate;

pub use triangle::{fan_area, Triangle};
pub use validate::validate;

use serde::{Deserialize, Serialize};

use crate::vector::{Edge, Point};

/// A solid segment no ray passes through: a viewport side or an obstacle edge.
pub type Boundary = Edge;

/// Polygon given by its ordered vertex loop.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    pub vertices: Vec<Point>,
}

impl Polygon {
    #[inline]
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    /// Axis-aligned rectangle `[(0,0), (w,0), (w,h), (0,h)]`.
    pub fn rectangle(width: f64, height: f64) -> Self {
        Self::new(vec![
            Point::new(0.0, 0.0),
            Point::new(width, 0.0),
            Point::new(width, height),
            Point::new(0.0, height),
        ])
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// One boundary per vertex, `loop[i] -> loop[(i+1) mod n]`.
    pub fn boundaries(&self) -> Vec<Boundary> {
        let n = self.vertices.len();
        (0..n)
            .map(|i| Edge::new(self.vertices[i], self.vertices[(i + 1) % n]))
            .collect()
    }

    /// Even-odd containment of `p` in the (closed) loop.
    #[inline]
    pub fn contains_point(&self, p: Point) -> bool {
        point_in_loop(&self.vertices, p, true)
    }

    /// Exact coordinate match against one of the loop vertices.
    pub fn contains_vertex(&self, p: Point) -> bool {
        self.vertices.iter().any(|v| v.x == p.x && v.y == p.y)
    }

    /// Convex iff the z-component of the cross product of consecutive edge
    /// vectors keeps the same sign around the whole loop.
    pub fn is_convex(&self) -> bool {
        let n = self.vertices.len();
        if n < 4 {
            return true;
        }
        let v = &self.vertices;
        let mut sign = false;
        for i in 0..n {
            let pivot = v[(i + 1) % n];
            let next = v[(i + 2) % n] - pivot;
            let prev = v[i] - pivot;
            let positive = next.x * prev.y - next.y * prev.x > 0.0;
            if i == 0 {
                sign = positive;
            } else if sign != positive {
                return false;
            }
        }
        true
    }
}

/// Horizontal ray-casting parity test over `vertices`.
///
/// With `close_loop`, the first vertex is appended so the final edge back to the
/// start is tested too. An empty loop contains nothing.
pub fn point_in_loop(vertices: &[Point], p: Point, close_loop: bool) -> bool {
    if vertices.is_empty() {
        return false;
    }
    let mut pts: Vec<Point> = vertices.to_vec();
    if close_loop {
        pts.push(vertices[0]);
    }
    let mut inside = false;
    let mut j = pts.len() - 1;
    for i in 0..pts.len() {
        let (pi, pj) = (pts[i], pts[j]);
        if (pi.y > p.y) != (pj.y > p.y) && p.x < (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}
