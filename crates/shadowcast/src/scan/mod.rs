//! Visibility scan: rays from a point light, nearest hits, triangle fan.
//!
//! Purpose
//! - Compute the visibility polygon of a light among solid boundaries by
//!   shooting a bundle of rays and keeping, per ray, the closest hit.
//!
//! Model
//! - 8 base rays aim at the four viewport corners, two per corner, each offset
//!   by `ScanCfg::corner_eps` to one side of the exact corner.
//! - Every obstacle vertex adds two rays aimed at `v - (eps, eps)` and
//!   `v + (eps, eps)`, so the silhouette just before and after each corner
//!   is sampled and shadow edges come out sharp.
//! - Rays are sorted by angle (ascending degrees, stable), cast against every
//!   boundary, and the ordered nearest hits are fanned around the light.
//!
//! Offsets keep rays off exact vertices, where segment membership of a hit
//! would be numerically unstable. Rays that hit nothing contribute no point.

use crate::config::ScanCfg;
use crate::polygon::{Boundary, Polygon, Triangle};
use crate::vector::{degrees, distance, normalize, point, Edge, Point};

/// Ray of light: origin plus unit direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    edge: Edge,
}

impl Ray {
    /// Ray at `origin`, initially pointing along +x.
    #[inline]
    pub fn new(origin: Point) -> Self {
        Self {
            edge: Edge::new(origin, point(1.0, 0.0)),
        }
    }

    /// Ray at `origin` aimed at `target`.
    #[inline]
    pub fn aimed(origin: Point, target: Point) -> Self {
        let mut ray = Self::new(origin);
        ray.set_dir(target);
        ray
    }

    /// Point the ray at `target`: direction becomes `normalize(target - origin)`.
    #[inline]
    pub fn set_dir(&mut self, target: Point) {
        self.edge.b = normalize(target - self.edge.a);
    }

    #[inline]
    pub fn origin(&self) -> Point {
        self.edge.a
    }

    #[inline]
    pub fn direction(&self) -> Point {
        self.edge.b
    }

    /// Direction angle in degrees.
    #[inline]
    pub fn angle(&self) -> f64 {
        degrees(self.edge.b)
    }

    /// Hit point on `boundary`, if any.
    #[inline]
    pub fn cast(&self, boundary: &Boundary) -> Option<Point> {
        self.edge.intersection(boundary)
    }

    /// Closest hit among `boundaries` (strictly nearest; first one wins ties).
    pub fn nearest_hit(&self, boundaries: &[Boundary]) -> Option<Point> {
        let mut closest = None;
        let mut best = f64::INFINITY;
        for boundary in boundaries {
            if let Some(hit) = self.cast(boundary) {
                let d = distance(self.origin(), hit);
                if d < best {
                    best = d;
                    closest = Some(hit);
                }
            }
        }
        closest
    }
}

/// Point light emitting a bundle of rays.
#[derive(Clone, Debug)]
pub struct Particle {
    pub pos: Point,
    pub rays: Vec<Ray>,
    cfg: ScanCfg,
}

impl Particle {
    /// Light at `pos` with the 8 base rays aimed around the viewport corners.
    ///
    /// `viewport` is `[top, right, bottom, left]`, each running clockwise
    /// (`top.a` is the origin corner).
    pub fn new(pos: Point, viewport: &[Boundary; 4], cfg: ScanCfg) -> Self {
        let [top, right, bottom, left] = viewport;
        let e = cfg.corner_eps;
        let targets = [
            point(left.b.x, left.b.y + e),
            point(top.a.x + e, top.a.y),
            point(top.b.x - e, top.b.y),
            point(right.a.x, right.a.y + e),
            point(right.b.x, right.b.y - e),
            point(bottom.a.x - e, bottom.a.y),
            point(bottom.b.x + e, bottom.b.y),
            point(left.a.x, left.a.y - e),
        ];
        let rays = targets.iter().map(|&t| Ray::aimed(pos, t)).collect();
        Self { pos, rays, cfg }
    }

    #[inline]
    pub fn cfg(&self) -> ScanCfg {
        self.cfg
    }

    /// Add two rays per obstacle vertex, offset diagonally to either side.
    pub fn aim_at_vertices(&mut self, polygons: &[Polygon]) {
        let e = self.cfg.vertex_eps;
        for polygon in polygons {
            for v in &polygon.vertices {
                self.rays.push(Ray::aimed(self.pos, point(v.x - e, v.y - e)));
                self.rays.push(Ray::aimed(self.pos, point(v.x + e, v.y + e)));
            }
        }
    }

    /// Stable sort by direction angle, ascending.
    pub fn sort_rays(&mut self) {
        self.rays.sort_by(|a, b| a.angle().total_cmp(&b.angle()));
    }

    /// Nearest hit of every ray, in current ray order.
    pub fn hits(&self, boundaries: &[Boundary]) -> Vec<Point> {
        self.rays
            .iter()
            .filter_map(|ray| ray.nearest_hit(boundaries))
            .collect()
    }

    /// Full scan: add vertex rays, sort, cast, and fan the hits around the light.
    pub fn process(&mut self, boundaries: &[Boundary], polygons: &[Polygon]) -> Vec<Triangle> {
        self.aim_at_vertices(polygons);
        self.sort_rays();
        let edges = self.hits(boundaries);
        tracing::debug!(rays = self.rays.len(), hits = edges.len(), "visibility scan");
        Triangle::clockwise_fan(self.pos, &edges)
    }
}
