use thiserror::Error;

use tf_core::ElementId;
use tf_spatial::LaneLocator;

#[derive(Debug, Error)]
pub enum VehicleError {
    #[error("cannot spawn {id}: {locator} not found in map")]
    UnknownLocator { id: ElementId, locator: LaneLocator },

    #[error("{id} has invalid dimensions {length} x {width}")]
    InvalidDimensions { id: ElementId, length: f64, width: f64 },

    #[error("{id} has invalid speed {speed}")]
    InvalidSpeed { id: ElementId, speed: f64 },
}

pub type VehicleResult<T> = Result<T, VehicleError>;
