//! Optical plant interface for ifoctl.
//!
//! A plant is whatever produced the drive → probe frequency responses: an
//! Optickle or Finesse run, a measurement, or a hand-written table. The
//! control system only consumes it through the [`Plant`] trait, addressed
//! by probe name, drive base name and motion type.
//!
//! [`TabulatedPlant`] is an in-memory implementation holding precomputed
//! responses. It is also the on-disk format used by `ic-project`.

pub mod error;
pub mod plant;
pub mod tabulated;

pub use error::{PlantError, PlantResult};
pub use plant::Plant;
pub use tabulated::{MissingPolicy, TabulatedPlant};
