use tf_core::{ElementId, TfError};
use tf_vehicle::VehicleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(#[from] TfError),

    #[error("element {0} declared more than once")]
    DuplicateElement(ElementId),

    #[error("{what} refers to unknown element {id}")]
    UnknownElement {
        id:   ElementId,
        what: &'static str,
    },

    #[error("spawn failed: {0}")]
    Vehicle(#[from] VehicleError),
}

pub type SimResult<T> = Result<T, SimError>;
