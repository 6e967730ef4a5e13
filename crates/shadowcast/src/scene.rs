//! Scene orchestration: viewport, validation, visibility scan, lit area.
//!
//! A scene is always derived fresh from a configuration. `process` is pure;
//! `load` additionally hands an immutable snapshot to a scene repository.

use serde::{Deserialize, Serialize};

use crate::config::{Configuration, ScanCfg};
use crate::ctx::Ctx;
use crate::error::Result;
use crate::polygon::{fan_area, validate, Boundary, Polygon, Triangle};
use crate::scan::Particle;
use crate::store::SceneRepository;
use crate::vector::{point, Edge, Point};

/// Scene state; a processed snapshot carries triangles and the lit area.
///
/// Invariant: `boundaries[0..4]` are the viewport sides top, right, bottom,
/// left; obstacle edges follow in polygon-then-edge order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    /// Percentage of the viewport that is lit, rounded to two decimals.
    pub lit_area: f64,
    pub light: Point,
    pub polygons: Vec<Polygon>,
    pub boundaries: Vec<Boundary>,
    pub triangles: Vec<Triangle>,
    #[serde(skip)]
    pub cfg: ScanCfg,
}

/// Result of a visibility scan.
#[derive(Clone, Debug, PartialEq)]
pub struct Illumination {
    pub triangles: Vec<Triangle>,
    pub lit_area: f64,
}

impl Scene {
    pub fn new(width: f64, height: f64, light: Point, polygons: Vec<Polygon>) -> Self {
        Self {
            width,
            height,
            lit_area: 0.0,
            light,
            polygons,
            boundaries: Self::viewport(width, height).to_vec(),
            triangles: Vec::new(),
            cfg: ScanCfg::default(),
        }
    }

    pub fn from_config(config: &Configuration) -> Self {
        Self::new(
            config.width(),
            config.height(),
            config.light,
            config.polygons.clone(),
        )
    }

    /// Override the scan offsets.
    pub fn with_cfg(mut self, cfg: ScanCfg) -> Self {
        self.cfg = cfg;
        self
    }

    /// Viewport sides in fixed order: top, right, bottom, left.
    ///
    /// The scan relies on this order to recover the corners.
    pub fn viewport(width: f64, height: f64) -> [Boundary; 4] {
        [
            Edge::new(point(0.0, 0.0), point(width, 0.0)),
            Edge::new(point(width, 0.0), point(width, height)),
            Edge::new(point(width, height), point(0.0, height)),
            Edge::new(point(0.0, height), point(0.0, 0.0)),
        ]
    }

    /// Viewport sides followed by every obstacle edge.
    pub fn all_boundaries(&self) -> Vec<Boundary> {
        let mut out = Self::viewport(self.width, self.height).to_vec();
        for polygon in &self.polygons {
            out.extend(polygon.boundaries());
        }
        out
    }

    /// Validate the obstacles, scan, and compute the lit-area percentage.
    ///
    /// On a validation error nothing is computed.
    pub fn process(&self) -> Result<Illumination> {
        let boundaries = self.all_boundaries();
        validate(&self.polygons, self.width, self.height)?;

        let viewport = Self::viewport(self.width, self.height);
        let mut particle = Particle::new(self.light, &viewport, self.cfg);
        let triangles = particle.process(&boundaries, &self.polygons);

        let total = self.width * self.height;
        let lit = fan_area(&triangles);
        let lit_area = ((lit / total) * 100.0 * 100.0).round() / 100.0;
        Ok(Illumination {
            triangles,
            lit_area,
        })
    }

    /// Process and persist a new snapshot. Errors (validation, cancellation,
    /// persistence) are returned unchanged; nothing is retried.
    pub fn load(&self, ctx: &Ctx, repo: &SceneRepository) -> Result<Scene> {
        let Illumination {
            triangles,
            lit_area,
        } = self.process().map_err(|e| {
            tracing::warn!(error = %e, "scene rejected");
            e
        })?;
        tracing::info!("lit area is {lit_area} percent");

        let snapshot = Scene {
            width: self.width,
            height: self.height,
            lit_area,
            light: self.light,
            polygons: self.polygons.clone(),
            boundaries: self.all_boundaries(),
            triangles,
            cfg: self.cfg,
        };
        repo.upsert(ctx, snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::{InMemoryRepository, Repository};
    use parking_lot::Mutex;
    use proptest::prelude::*;

    fn obstacle() -> Polygon {
        Polygon::new(vec![
            point(600.0, 200.0),
            point(646.0, 133.0),
            point(646.0, 261.0),
        ])
    }

    fn reference_scene() -> Scene {
        Scene::new(800.0, 500.0, point(250.0, 300.0), vec![obstacle()])
    }

    /// Records every upsert and answers with a canned error if one is set.
    #[derive(Default)]
    struct RecordingRepo {
        upserts: Mutex<Vec<Scene>>,
        fail_with: Option<Error>,
    }

    impl Repository<Scene> for RecordingRepo {
        fn get(&self, ctx: &Ctx) -> Result<Option<Scene>> {
            ctx.check()?;
            Ok(self.upserts.lock().last().cloned())
        }

        fn upsert(&self, ctx: &Ctx, value: Scene) -> Result<Scene> {
            ctx.check()?;
            self.upserts.lock().push(value.clone());
            match &self.fail_with {
                Some(e) => Err(e.clone()),
                None => Ok(value),
            }
        }
    }

    #[test]
    fn viewport_order_is_top_right_bottom_left() {
        let s = reference_scene();
        assert_eq!(s.boundaries.len(), 4);
        assert_eq!(s.boundaries[0], Edge::new(point(0.0, 0.0), point(800.0, 0.0)));
        assert_eq!(s.boundaries[1], Edge::new(point(800.0, 0.0), point(800.0, 500.0)));
        assert_eq!(s.boundaries[2], Edge::new(point(800.0, 500.0), point(0.0, 500.0)));
        assert_eq!(s.boundaries[3], Edge::new(point(0.0, 500.0), point(0.0, 0.0)));
        let all = s.all_boundaries();
        assert_eq!(all.len(), 7);
        assert_eq!(all[4], Edge::new(point(600.0, 200.0), point(646.0, 133.0)));
        assert_eq!(all[6], Edge::new(point(646.0, 261.0), point(600.0, 200.0)));
    }

    #[test]
    fn process_reference_scene() {
        let lit = reference_scene().process().unwrap();
        // 8 corner rays plus 2 per obstacle vertex, every one of them hits.
        assert_eq!(lit.triangles.len(), 14);
        assert_eq!(lit.lit_area, 93.38);
        assert!((fan_area(&lit.triangles) - 373_511.103_564_470_9).abs() < 1e-6);
        let last = lit.triangles[13];
        assert!((last.vertices[1].y - 499.999_900_000_007_64).abs() < 1e-9);
        assert_eq!(last.vertices[1].x, 0.0);
    }

    #[test]
    fn process_is_deterministic() {
        let s = reference_scene();
        let a = s.process().unwrap();
        let b = s.process().unwrap();
        assert_eq!(a, b);
        // Reprocessing a stored snapshot does not pick up its obstacle edges twice.
        let repo: InMemoryRepository<Scene> = InMemoryRepository::new();
        let snap = s.load(&Ctx::background(), &repo).unwrap();
        assert_eq!(snap.process().unwrap(), a);
    }

    #[test]
    fn empty_scene_is_fully_lit() {
        let s = Scene::new(800.0, 500.0, point(400.0, 250.0), vec![]);
        let lit = s.process().unwrap();
        assert_eq!(lit.triangles.len(), 8);
        assert_eq!(lit.lit_area, 100.0);
    }

    fn has_vertex_near(triangles: &[Triangle], target: Point) -> bool {
        triangles
            .iter()
            .flat_map(|t| t.vertices)
            .any(|v| (v - target).norm() < 1e-9)
    }

    #[test]
    fn scan_offsets_follow_the_scene_cfg() {
        let wide = ScanCfg {
            corner_eps: 1e-2,
            ..ScanCfg::default()
        };
        let base = Scene::new(800.0, 500.0, point(400.0, 250.0), vec![]);
        let default = base.process().unwrap();
        let custom = base.clone().with_cfg(wide).process().unwrap();
        assert_ne!(default.triangles, custom.triangles);
        // The ray aimed just below the origin corner lands on the left side.
        assert!(has_vertex_near(&custom.triangles, point(0.0, 1e-2)));
        assert!(!has_vertex_near(&default.triangles, point(0.0, 1e-2)));
        assert!(has_vertex_near(&default.triangles, point(0.0, 1e-4)));

        let repo: InMemoryRepository<Scene> = InMemoryRepository::new();
        let loaded = base.with_cfg(wide).load(&Ctx::background(), &repo).unwrap();
        assert_eq!(loaded.triangles, custom.triangles);
        assert_eq!(loaded.cfg, wide);
    }

    #[test]
    fn three_obstacles() {
        let c = Configuration::from_text(
            "800 500\n250 300\n3\n\
             3 600 200 646 133 646 261\n\
             6 131 188 54 136 86 32 220 32 238 114 209 163\n\
             5 412 364 454 251 537 257 601 350 528 430\n",
        )
        .unwrap();
        let lit = Scene::from_config(&c).process().unwrap();
        assert_eq!(lit.triangles.len(), 8 + 2 * 14);
        assert_eq!(lit.lit_area, 64.38);
    }

    #[test]
    fn validation_error_produces_nothing() {
        let bad = Polygon::new(vec![
            point(600.0, 200.0),
            point(646.0, 133.0),
            point(850.0, 550.0),
        ]);
        let s = Scene::new(800.0, 500.0, point(250.0, 300.0), vec![bad]);
        let repo = RecordingRepo::default();
        let err = s.load(&Ctx::background(), &repo).unwrap_err();
        assert_eq!(err, Error::OutsideScene { x: 850.0, y: 550.0 });
        assert!(repo.upserts.lock().is_empty());
    }

    #[test]
    fn load_persists_snapshot() {
        let repo = RecordingRepo::default();
        let loaded = reference_scene().load(&Ctx::background(), &repo).unwrap();
        assert_eq!(loaded.lit_area, 93.38);
        assert_eq!(loaded.triangles.len(), 14);
        assert_eq!(loaded.boundaries.len(), 7);
        assert_eq!(loaded.light, point(250.0, 300.0));
        let upserts = repo.upserts.lock();
        assert_eq!(upserts.len(), 1);
        assert_eq!(upserts[0], loaded);
    }

    #[test]
    fn load_propagates_repository_failure() {
        let repo = RecordingRepo {
            fail_with: Some(Error::Persistence("error".into())),
            ..Default::default()
        };
        let err = reference_scene()
            .load(&Ctx::background(), &repo)
            .unwrap_err();
        assert_eq!(err, Error::Persistence("error".into()));
        assert_eq!(repo.upserts.lock().len(), 1);
    }

    #[test]
    fn load_with_cancelled_context_writes_nothing() {
        let repo: InMemoryRepository<Scene> = InMemoryRepository::new();
        let ctx = Ctx::background();
        ctx.cancel();
        let err = reference_scene().load(&ctx, &repo).unwrap_err();
        assert!(err.is_cancellation());
        assert_eq!(repo.get(&Ctx::background()), Ok(None));
    }

    proptest! {
        #[test]
        fn unobstructed_viewport_is_fully_lit(x in 10.0..790.0f64, y in 10.0..490.0f64) {
            let s = Scene::new(800.0, 500.0, point(x, y), vec![]);
            let lit = s.process().unwrap();
            prop_assert_eq!(lit.triangles.len(), 8);
            prop_assert_eq!(lit.lit_area, 100.0);
        }
    }
}
