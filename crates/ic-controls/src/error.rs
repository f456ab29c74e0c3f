//! Error types for control system operations.

use ic_core::{IcError, MotionType};
use ic_plant::PlantError;
use thiserror::Error;

use crate::signal::SignalKind;

/// Result type for control system operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur in control system operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// A DOF with this name is already registered.
    #[error("Degree of freedom {name} already exists")]
    DuplicateDof { name: String },

    /// A compensator is already set for this drive.
    #[error("A compensator is already set for drive {drive}")]
    DuplicateCompensator { drive: String },

    /// A response is already set for this drive.
    #[error("A response is already set for drive {drive}")]
    DuplicateResponse { drive: String },

    #[error("A plant is already bound to this control system")]
    PlantAlreadyBound,

    #[error("No plant is bound to this control system")]
    PlantNotBound,

    /// Queries need a successful tickle first.
    #[error("Control system has not been tickled")]
    NotTickled,

    /// Name lookup failed.
    #[error("{what} '{name}' not found")]
    NotFound { what: &'static str, name: String },

    /// Unrecognized signal or injection point name.
    #[error("Unrecognized signal '{name}'")]
    UnknownSignal { name: String },

    /// No transfer function is defined between these signal kinds.
    #[error("No transfer function to {to} from {from}")]
    UnsupportedPath { to: SignalKind, from: SignalKind },

    /// Position queries compare drives of the same motion type only.
    #[error(
        "Input and output drives should be the same degree of freedom: {drive_to} is {to}, {drive_from} is {from}"
    )]
    MotionMismatch {
        drive_to: String,
        drive_from: String,
        to: MotionType,
        from: MotionType,
    },

    /// `I - OLTF` could not be inverted: the loop is unstable or marginal.
    #[error("Singular loop matrix at {frequency} Hz (bin {bin}) for the {point} loop")]
    Singular {
        point: String,
        bin: usize,
        frequency: f64,
    },

    #[error("There is no filter from {from} to {to}")]
    NoFilter { to: String, from: String },

    #[error("There are {count} filters from {from} to {to}")]
    MultipleFilters {
        to: String,
        from: String,
        count: usize,
    },

    /// Invalid filter construction.
    #[error("Invalid filter: {what}")]
    InvalidFilter { what: String },

    #[error("Length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("Plant error: {0}")]
    Plant(#[from] PlantError),

    #[error(transparent)]
    Core(IcError),
}

impl From<IcError> for ControlError {
    fn from(err: IcError) -> Self {
        match err {
            IcError::NotFound { what, name } => ControlError::NotFound { what, name },
            other => ControlError::Core(other),
        }
    }
}
