//! Error types for plant queries.

use ic_core::{IcError, MotionType};
use thiserror::Error;

pub type PlantResult<T> = Result<T, PlantError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlantError {
    #[error("No transfer function from drive {drive}.{motion} to probe {probe}")]
    MissingTransferFunction {
        probe: String,
        drive: String,
        motion: MotionType,
    },

    #[error("No quantum noise for probe {probe}")]
    MissingNoise { probe: String },

    #[error("No mechanical modification from {drive_from}.{motion} to {drive_to}.{motion}")]
    MissingMechanicalModification {
        drive_to: String,
        drive_from: String,
        motion: MotionType,
    },

    #[error("No beam spot motion on {optic}.{face} from drive {drive}.{motion}")]
    MissingBeamSpotMotion {
        optic: String,
        face: String,
        drive: String,
        motion: MotionType,
    },

    #[error("Length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("Plant does not provide {what}")]
    Unsupported { what: &'static str },

    #[error(transparent)]
    Core(#[from] IcError),
}
