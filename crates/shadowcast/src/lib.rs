//! 2D shadow casting: the lit area of a point light among convex obstacles.
//!
//! Layers, leaf first:
//! - `vector`: points, edges and ray/segment intersection.
//! - `polygon`: vertex loops, boundaries, containment, convexity, validation, fans.
//! - `scan`: rays bundled around obstacle vertices and nearest-hit selection.
//! - `scene`: viewport boundaries, validation + scan, lit-area percentage, persistence.
//! - `pipeline`: worker pool that recomputes scenes from configuration changes.
//!
//! Ambient pieces: `error`, `ctx` (cancellation), `store` (in-memory
//! repositories), `config` (input model and text format), `rand` (seeded layouts).

pub mod config;
pub mod ctx;
pub mod error;
pub mod pipeline;
pub mod polygon;
pub mod rand;
pub mod scan;
pub mod scene;
pub mod store;
pub mod vector;

pub use error::{Error, Result};

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common exports for callers.
pub mod prelude {
    pub use crate::config::{Configuration, ScanCfg};
    pub use crate::ctx::Ctx;
    pub use crate::error::{Error, Result};
    pub use crate::pipeline::{Pipeline, Reply, RouteTable};
    pub use crate::polygon::{validate, Boundary, Polygon, Triangle};
    pub use crate::scan::{Particle, Ray};
    pub use crate::scene::{Illumination, Scene};
    pub use crate::store::{
        ConfigRepository, InMemoryRepository, Repository, SceneRepository,
    };
    pub use crate::vector::{Edge, Point};
}
