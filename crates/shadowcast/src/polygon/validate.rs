//! Scene-level polygon validation.

use super::Polygon;
use crate::error::{Error, Result};
use crate::vector::Point;

/// Check obstacles against each other and against the `width x height` viewport.
///
/// Every obstacle, then the viewport rectangle, is checked in turn:
/// - it must be convex;
/// - for the viewport, every obstacle vertex must be contained;
/// - for an obstacle, a contained vertex must be one of its own vertices.
///
/// The first violation is returned; nothing is aggregated.
pub fn validate(polygons: &[Polygon], width: f64, height: f64) -> Result<()> {
    let vertices: Vec<Point> = polygons
        .iter()
        .flat_map(|p| p.vertices.iter().copied())
        .collect();

    let viewport = Polygon::rectangle(width, height);
    let checked = polygons.iter().map(|p| (p, false)).chain([(&viewport, true)]);

    for (polygon, is_viewport) in checked {
        if !polygon.is_convex() {
            return Err(Error::NotConvex);
        }
        for &v in &vertices {
            let contained = polygon.contains_point(v);
            if is_viewport && !contained {
                return Err(Error::OutsideScene { x: v.x, y: v.y });
            }
            if !is_viewport && contained && !polygon.contains_vertex(v) {
                return Err(Error::InsideAnotherPolygon { x: v.x, y: v.y });
            }
        }
    }
    Ok(())
}
