//! Random obstacle layouts (grid cells + radial jitter).
//!
//! Purpose
//! - Deterministic, seedable scenes for benches, tests, and the CLI `random`
//!   command. Every layout passes `validate` by construction.
//!
//! Model
//! - Split the viewport into a grid with at least `count + 1` cells and
//!   shuffle the cells. The first cell hosts the light, the next `count` host
//!   one obstacle each.
//! - An obstacle starts from `n` equally spaced angles with bounded angular
//!   and radial jitter around its cell center; its convex hull is kept.
//!   The outer radius stays below the cell's inscribed circle, so obstacles
//!   are strictly inside the viewport and never touch each other.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::config::Configuration;
use crate::polygon::Polygon;
use crate::vector::{point, Point};

/// Layout sampler configuration.
#[derive(Clone, Copy, Debug)]
pub struct LayoutCfg {
    pub width: f64,
    pub height: f64,
    /// Number of obstacles.
    pub count: usize,
    /// Obstacle vertex counts are drawn uniformly from `min_vertices..=max_vertices`
    /// (at least 3; `max_vertices` below the minimum means exactly the minimum).
    pub min_vertices: usize,
    pub max_vertices: usize,
    /// Angular jitter as a fraction of the base spacing 2π/n. Clamped to [0, 0.49].
    pub angle_jitter_frac: f64,
    /// Radii are `r * (1 + u)` with `u ∈ [-radial_jitter, radial_jitter]`. Clamped to [0, 0.9].
    pub radial_jitter: f64,
    /// Share of the cell's inscribed radius an obstacle may use, in (0, 1).
    pub fill: f64,
}

impl LayoutCfg {
    fn obstacle_vertices<R: Rng>(&self, rng: &mut R) -> usize {
        let lo = self.min_vertices.max(3);
        rng.gen_range(lo..=self.max_vertices.max(lo))
    }
}

impl Default for LayoutCfg {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 500.0,
            count: 6,
            min_vertices: 3,
            max_vertices: 8,
            angle_jitter_frac: 0.3,
            radial_jitter: 0.25,
            fill: 0.8,
        }
    }
}

/// Draw a whole scene configuration.
pub fn draw_layout(cfg: LayoutCfg, seed: u64) -> Configuration {
    let mut rng = StdRng::seed_from_u64(seed);
    let (cols, rows) = grid(cfg.count + 1, cfg.width, cfg.height);
    let (cw, ch) = (cfg.width / cols as f64, cfg.height / rows as f64);

    let mut cells: Vec<usize> = (0..cols * rows).collect();
    cells.shuffle(&mut rng);
    let center = |cell: usize| {
        let (i, j) = (cell % cols, cell / cols);
        point((i as f64 + 0.5) * cw, (j as f64 + 0.5) * ch)
    };

    // Light anywhere in the middle half of its cell.
    let lc = center(cells[0]);
    let light = point(
        lc.x + (rng.gen::<f64>() - 0.5) * 0.5 * cw,
        lc.y + (rng.gen::<f64>() - 0.5) * 0.5 * ch,
    );

    let fill = cfg.fill.clamp(1e-3, 0.999);
    let rj = cfg.radial_jitter.clamp(0.0, 0.9);
    let radius = 0.5 * cw.min(ch) * fill / (1.0 + rj);
    let polygons = cells[1..=cfg.count]
        .iter()
        .map(|&cell| draw_polygon(&mut rng, center(cell), radius, &cfg))
        .collect();

    tracing::debug!(seed, cols, rows, count = cfg.count, "random layout");
    Configuration::new(cfg.width, cfg.height, light, polygons)
}

/// Convex polygon around `center` with outer radius at most `radius * (1 + radial_jitter)`.
pub fn draw_polygon<R: Rng>(rng: &mut R, center: Point, radius: f64, cfg: &LayoutCfg) -> Polygon {
    let n = cfg.obstacle_vertices(rng);
    let aj = cfg.angle_jitter_frac.clamp(0.0, 0.49);
    let rj = cfg.radial_jitter.clamp(0.0, 0.9);
    let delta = std::f64::consts::TAU / n as f64;
    let phase = rng.gen::<f64>() * std::f64::consts::TAU;

    let pts: Vec<Point> = (0..n)
        .map(|k| {
            let th = phase + k as f64 * delta + (rng.gen::<f64>() * 2.0 - 1.0) * aj * delta;
            let r = radius * (1.0 + (rng.gen::<f64>() * 2.0 - 1.0) * rj);
            center + point(th.cos() * r, th.sin() * r)
        })
        .collect();

    let hull = convex_hull(&pts);
    if hull.len() >= 3 {
        return Polygon::new(hull);
    }
    // Degenerate draw; fall back to a triangle on the base circle.
    let tri = (0..3)
        .map(|k| {
            let th = phase + k as f64 * std::f64::consts::TAU / 3.0;
            center + point(th.cos() * radius, th.sin() * radius)
        })
        .collect();
    Polygon::new(tri)
}

/// Smallest grid with at least `cells` cells and roughly square cells.
fn grid(cells: usize, width: f64, height: f64) -> (usize, usize) {
    let cells = cells.max(1);
    let aspect = if height > 0.0 { width / height } else { 1.0 };
    let cols = ((cells as f64 * aspect).sqrt().ceil() as usize).max(1);
    let rows = cells.div_ceil(cols).max(1);
    (cols, rows)
}

/// Monotone-chain hull, counter-clockwise in math orientation, collinear points dropped.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut pts = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }
    let cross = |o: Point, a: Point, b: Point| (a - o).perp(&(b - o));

    let mut hull: Vec<Point> = Vec::with_capacity(2 * pts.len());
    for &p in &pts {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}
