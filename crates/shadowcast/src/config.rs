//! Scene configuration: the input model, its well-formedness check and the
//! line-oriented text format.
//!
//! Text format
//! ```text
//! 800 500                      scene width and height
//! 250 300                      light position
//! 2                            number of polygon lines that follow
//! 3 600 200 646 133 646 261    vertex count, then x y per vertex
//! 4 100 100 200 100 200 200 100 200
//! ```
//! Blank lines are ignored; reported line numbers are 1-based and refer to
//! the original text.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::polygon::Polygon;
use crate::vector::{point, Point};

/// Ray offsets used by the visibility scan (scene units).
///
/// A fixed absolute offset is scale-dependent; scenes far from the default
/// ~1e2..1e3 unit range should scale these along.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanCfg {
    /// Offset to either side of each viewport corner for the 8 base rays.
    pub corner_eps: f64,
    /// Diagonal offset of the two rays aimed past each obstacle vertex.
    pub vertex_eps: f64,
}

impl Default for ScanCfg {
    fn default() -> Self {
        Self {
            corner_eps: 1e-4,
            vertex_eps: 1e-4,
        }
    }
}

/// Externally supplied description of a scene.
///
/// `scene` carries the viewport size as `(width, height)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub scene: Point,
    pub light: Point,
    pub polygons: Vec<Polygon>,
}

impl Configuration {
    pub fn new(width: f64, height: f64, light: Point, polygons: Vec<Polygon>) -> Self {
        Self {
            scene: point(width, height),
            light,
            polygons,
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.scene.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.scene.y
    }

    /// Well-formedness of the raw input, checked before any geometry runs.
    ///
    /// This is not geometric validation (convexity, containment, overlap);
    /// that happens when the scene is processed.
    pub fn check(&self) -> Result<()> {
        let (w, h) = (self.width(), self.height());
        if !(w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 {
            return Err(Error::invalid(format!(
                "scene size must be positive, got {w} x {h}"
            )));
        }
        if !(self.light.x.is_finite() && self.light.y.is_finite()) {
            return Err(Error::invalid("light position must be finite"));
        }
        for (i, polygon) in self.polygons.iter().enumerate() {
            if polygon.vertex_count() < 3 {
                return Err(Error::invalid(format!(
                    "polygon {i} has {} vertices, need at least 3",
                    polygon.vertex_count()
                )));
            }
            if polygon
                .vertices
                .iter()
                .any(|v| !(v.x.is_finite() && v.y.is_finite()))
            {
                return Err(Error::invalid(format!(
                    "polygon {i} has a non-finite vertex"
                )));
            }
        }
        Ok(())
    }

    /// Parse the text format. The result is also `check`ed.
    pub fn from_text(text: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty());
        let last_line = text.lines().count();

        let (n, line) = lines
            .next()
            .ok_or_else(|| Error::parse(last_line + 1, "missing scene size"))?;
        let (width, height) = parse_pair(n, line)?;

        let (n, line) = lines
            .next()
            .ok_or_else(|| Error::parse(last_line + 1, "missing light position"))?;
        let (lx, ly) = parse_pair(n, line)?;

        let (n, line) = lines
            .next()
            .ok_or_else(|| Error::parse(last_line + 1, "missing polygon count"))?;
        let count: usize = line
            .parse()
            .map_err(|e| Error::parse(n, format!("polygon count {line:?}: {e}")))?;

        let mut polygons = Vec::new();
        for (n, line) in lines {
            if polygons.len() == count {
                return Err(Error::parse(
                    n,
                    format!("more polygon lines than the declared {count}"),
                ));
            }
            polygons.push(parse_polygon(n, line)?);
        }
        if polygons.len() != count {
            return Err(Error::parse(
                last_line,
                format!("declared {count} polygons, found {}", polygons.len()),
            ));
        }

        let config = Self::new(width, height, point(lx, ly), polygons);
        config.check()?;
        Ok(config)
    }

    /// Render in the text format accepted by [`Configuration::from_text`].
    pub fn to_text(&self) -> String {
        let head = format!(
            "{} {}\n{} {}\n{}\n",
            self.width(),
            self.height(),
            self.light.x,
            self.light.y,
            self.polygons.len()
        );
        let body: String = self
            .polygons
            .iter()
            .map(|polygon| {
                let coords: Vec<String> = polygon
                    .vertices
                    .iter()
                    .map(|v| format!(" {} {}", v.x, v.y))
                    .collect();
                format!("{}{}\n", polygon.vertex_count(), coords.concat())
            })
            .collect();
        head + &body
    }
}

impl FromStr for Configuration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_text(s)
    }
}

fn parse_number(n: usize, token: &str) -> Result<f64> {
    token
        .parse::<f64>()
        .map_err(|e| Error::parse(n, format!("{token:?}: {e}")))
}

fn parse_pair(n: usize, line: &str) -> Result<(f64, f64)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 2 {
        return Err(Error::parse(
            n,
            format!("expected two numbers, found {}", tokens.len()),
        ));
    }
    Ok((parse_number(n, tokens[0])?, parse_number(n, tokens[1])?))
}

fn parse_polygon(n: usize, line: &str) -> Result<Polygon> {
    let mut tokens = line.split_whitespace();
    let head = tokens.next().unwrap_or_default();
    let declared: usize = head
        .parse()
        .map_err(|e| Error::parse(n, format!("vertex count {head:?}: {e}")))?;
    let coords = tokens
        .map(|t| parse_number(n, t))
        .collect::<Result<Vec<f64>>>()?;
    let expected = declared
        .checked_mul(2)
        .ok_or_else(|| Error::parse(n, format!("vertex count {declared} is too large")))?;
    if coords.len() != expected {
        return Err(Error::parse(
            n,
            format!(
                "declared {declared} vertices, found {} coordinates",
                coords.len()
            ),
        ));
    }
    Ok(Polygon::new(
        coords.chunks_exact(2).map(|c| point(c[0], c[1])).collect(),
    ))
}
