//! Spatial-subsystem error type.

use thiserror::Error;

use tf_core::{LaneLinkId, LaneUid, RoadId};

/// Errors produced by `tf-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("{0} not found in map")]
    LaneNotFound(LaneUid),

    #[error("{0} not found in map")]
    LinkNotFound(LaneLinkId),

    #[error("{0} already exists")]
    DuplicateLane(LaneUid),

    #[error("curve needs at least two distinct points, got {0}")]
    DegenerateCurve(usize),

    #[error("cannot connect {from} to {to}: {reason}")]
    InvalidConnection {
        from:   LaneUid,
        to:     LaneUid,
        reason: &'static str,
    },

    #[error("no route from {from} to {to}")]
    NoRoute { from: RoadId, to: RoadId },

    #[error("{0} not found in map")]
    RoadNotFound(RoadId),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
