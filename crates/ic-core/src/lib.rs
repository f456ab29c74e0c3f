//! ic-core: shared foundation for ifoctl.
//!
//! Contains:
//! - numeric (Real, Complex64, tolerances, float helpers)
//! - units (uom frequency types + constructors)
//! - frequency (analysis axis and its complex angular frequencies)
//! - registry (ordered, deduplicated name registries)
//! - motion (drive motion types and drive key helpers)
//! - noise (amplitude spectral densities)
//! - timing (opt-in wall clock timers)
//! - error (shared error types)

pub mod error;
pub mod frequency;
pub mod motion;
pub mod noise;
pub mod numeric;
pub mod registry;
pub mod timing;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{IcError, IcResult};
pub use frequency::FrequencyAxis;
pub use motion::{MotionType, drive_key, split_drive_key};
pub use noise::Asd;
pub use numeric::*;
pub use registry::NameRegistry;
pub use units::*;
