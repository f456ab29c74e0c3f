//! Degrees of freedom.
//!
//! A degree of freedom (DOF) is a named linear combination of probes (how the
//! motion is sensed) and drives (how it is actuated). For DARM, sensed at
//! the antisymmetric port and actuated differentially on the end masses:
//!
//! ```
//! use ic_controls::{DegreeOfFreedom, MotionType};
//!
//! let darm = DegreeOfFreedom::new(
//!     "DARM",
//!     "AS_Q",
//!     [("EX", 1.0), ("EY", -1.0)],
//!     MotionType::Pos,
//! );
//! assert_eq!(darm.drives().keys().collect::<Vec<_>>(), ["EX.pos", "EY.pos"]);
//! ```

use ic_core::{MotionType, NameRegistry, drive_key};
use nalgebra::DVector;

use crate::error::ControlResult;

/// Ordered name -> coefficient map.
///
/// A single name converts to a unit coefficient.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coefficients(Vec<(String, f64)>);

impl Coefficients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `coeff`, replacing an earlier value in place.
    pub fn insert(&mut self, name: impl Into<String>, coeff: f64) {
        let name = name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = coeff,
            None => self.0.push((name, coeff)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, c)| *c)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(n, c)| (n.as_str(), *c))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Coefficients {
    fn from(name: &str) -> Self {
        Self(vec![(name.to_string(), 1.0)])
    }
}

impl From<String> for Coefficients {
    fn from(name: String) -> Self {
        Self(vec![(name, 1.0)])
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Coefficients {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut coeffs = Self::new();
        for (name, c) in iter {
            coeffs.insert(name, c);
        }
        coeffs
    }
}

impl<S: Into<String>, const N: usize> From<[(S, f64); N]> for Coefficients {
    fn from(entries: [(S, f64); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<S: Into<String>> From<Vec<(S, f64)>> for Coefficients {
    fn from(entries: Vec<(S, f64)>) -> Self {
        entries.into_iter().collect()
    }
}

/// A named combination of probes and drives.
#[derive(Debug, Clone, PartialEq)]
pub struct DegreeOfFreedom {
    name: String,
    probes: Coefficients,
    /// Keys are always `<base>.<motion>`.
    drives: Coefficients,
    motion: MotionType,
}

impl DegreeOfFreedom {
    /// Create a DOF; drive names are suffixed with `.{motion}`.
    pub fn new(
        name: impl Into<String>,
        probes: impl Into<Coefficients>,
        drives: impl Into<Coefficients>,
        motion: MotionType,
    ) -> Self {
        let drives: Coefficients = drives.into();
        let drives = drives
            .iter()
            .map(|(base, c)| (drive_key(base, motion), c))
            .collect();
        Self {
            name: name.into(),
            probes: probes.into(),
            drives,
            motion,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn probes(&self) -> &Coefficients {
        &self.probes
    }

    pub fn drives(&self) -> &Coefficients {
        &self.drives
    }

    pub fn motion(&self) -> MotionType {
        self.motion
    }

    /// Sensing coefficients aligned to `probes`, zero for probes not in
    /// this DOF.
    pub fn sensing_vector(&self, probes: &NameRegistry) -> ControlResult<DVector<f64>> {
        aligned(&self.probes, probes)
    }

    /// Actuation coefficients aligned to `drives`, zero for drives not in
    /// this DOF.
    pub fn actuation_vector(&self, drives: &NameRegistry) -> ControlResult<DVector<f64>> {
        aligned(&self.drives, drives)
    }
}

fn aligned(coeffs: &Coefficients, order: &NameRegistry) -> ControlResult<DVector<f64>> {
    let mut v = DVector::zeros(order.len());
    for (name, c) in coeffs.iter() {
        v[order.index_of(name)?] = c;
    }
    Ok(v)
}
