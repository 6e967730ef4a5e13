//! Error type shared by the engine, the repositories and the pipeline.
//!
//! Numeric degeneracies (parallel ray/edge, zero-length directions) are never
//! errors; they surface as "no intersection" inside the scan.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum Error {
    #[error("polygon is not convex")]
    NotConvex,
    #[error("point X: {x} , Y: {y} is outside the scene")]
    OutsideScene { x: f64, y: f64 },
    #[error("point X: {x} , Y: {y} is inside another polygon")]
    InsideAnotherPolygon { x: f64, y: f64 },

    #[error("context was canceled")]
    Cancelled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("config line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("unknown response route {0:?}")]
    UnknownRoute(String),
    #[error("recomputation pipeline is shut down")]
    PipelineClosed,

    #[error("fan edges are not angularly ordered around the center")]
    UnorderedFan,
}

impl Error {
    pub(crate) fn parse(line: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Deterministic rejection derived from the input geometry.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NotConvex | Self::OutsideScene { .. } | Self::InsideAnotherPolygon { .. }
        )
    }

    /// Raised when a request context was cancelled or ran past its deadline.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}
