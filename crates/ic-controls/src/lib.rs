//! ic-controls: MIMO feedback loops around an optical plant.
//!
//! This crate provides:
//! - [`Filter`]: scalar transfer functions from callables or zero/pole/gain data
//! - [`DegreeOfFreedom`]: named probe and drive combinations
//! - [`ControlSystem`]: loop assembly, the tickle pass and all queries
//! - [`MatrixSeries`]: per-frequency complex matrices and their contraction
//!
//! # Example
//!
//! A single loop around a flat plant of gain 2 with a controller of gain
//! 0.25 has an open-loop gain of 0.5 and a closed-loop gain of 2.
//!
//! ```
//! use std::sync::Arc;
//! use ic_controls::{Complex64, ControlSystem, Filter, FrequencyAxis, InjectionPoint, MotionType};
//! use ic_plant::TabulatedPlant;
//!
//! let axis = FrequencyAxis::new(vec![1.0, 10.0]).unwrap();
//! let plant = TabulatedPlant::new(axis)
//!     .with_transfer_function("P1", "D1", MotionType::Pos, vec![Complex64::new(2.0, 0.0); 2])
//!     .unwrap();
//!
//! let mut cs = ControlSystem::new();
//! cs.bind_plant(Arc::new(plant)).unwrap();
//! cs.add_dof("X", "P1", "D1", MotionType::Pos).unwrap();
//! cs.add_filter("X", "X", Filter::gain(0.25).unwrap());
//! cs.tickle().unwrap();
//!
//! let cl = cs.get_cltf("X", "X", InjectionPoint::Err).unwrap();
//! assert!((cl[0].re - 2.0).abs() < 1e-12);
//! ```

pub mod assembly;
pub mod dof;
pub mod error;
pub mod filter;
mod query;
pub mod signal;
pub mod system;
pub mod tensor;

pub use assembly::{LoopAssembly, LoopMatrices};
pub use dof::{Coefficients, DegreeOfFreedom};
pub use error::{ControlError, ControlResult};
pub use filter::{Filter, RootUnits, Zpk, res_roots, zpk};
pub use signal::{Axis, InjectionPoint, SignalKind};
pub use system::{ControlSystem, DEFAULT_SPOT_FACE, LoopFilter, SharedPlant};
pub use tensor::{Factor, MatrixSeries, contract};

pub use ic_core::{Asd, Complex64, FrequencyAxis, MotionType};
