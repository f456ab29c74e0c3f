//! Analysis frequency axis.
//!
//! Every tensor in a control system is sampled on the same ordered set of
//! frequencies. The axis also caches the complex angular frequencies
//! `s = 2πi f` that filters are evaluated at.

use crate::error::{IcError, IcResult};
use crate::numeric::{Complex64, Real, angular};
use crate::units::{Frequency, to_hz};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<f64>", into = "Vec<f64>"))]
pub struct FrequencyAxis {
    hz: Vec<Real>,
    s: Vec<Complex64>,
}

impl FrequencyAxis {
    /// Build an axis from frequencies in Hz.
    ///
    /// Frequencies must be finite. The order is kept as given.
    pub fn new(hz: Vec<Real>) -> IcResult<Self> {
        for &f in &hz {
            crate::ensure_finite(f, "frequency")?;
        }
        let s = hz.iter().map(|&f| angular(f)).collect();
        Ok(Self { hz, s })
    }

    /// Build an axis from uom frequency quantities.
    pub fn from_quantities(freqs: &[Frequency]) -> IcResult<Self> {
        Self::new(freqs.iter().map(|&f| to_hz(f)).collect())
    }

    /// `n` logarithmically spaced points from `start` to `stop` inclusive.
    pub fn logspace(start: Frequency, stop: Frequency, n: usize) -> IcResult<Self> {
        let (a, b) = (to_hz(start), to_hz(stop));
        if a <= 0.0 || b <= 0.0 {
            return Err(IcError::InvalidArg {
                what: "logspace bounds must be positive",
            });
        }
        let (la, lb) = (a.log10(), b.log10());
        Self::new(spaced(la, lb, n)?.into_iter().map(|e| 10f64.powf(e)).collect())
    }

    /// `n` linearly spaced points from `start` to `stop` inclusive.
    pub fn linspace(start: Frequency, stop: Frequency, n: usize) -> IcResult<Self> {
        Self::new(spaced(to_hz(start), to_hz(stop), n)?)
    }

    /// Number of frequency bins.
    pub fn len(&self) -> usize {
        self.hz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hz.is_empty()
    }

    /// Frequencies in Hz.
    pub fn hz(&self) -> &[Real] {
        &self.hz
    }

    /// Complex angular frequencies `2πi f`.
    pub fn s(&self) -> &[Complex64] {
        &self.s
    }
}

fn spaced(a: Real, b: Real, n: usize) -> IcResult<Vec<Real>> {
    match n {
        0 => Err(IcError::InvalidArg {
            what: "axis needs at least one point",
        }),
        1 => Ok(vec![a]),
        _ => {
            let step = (b - a) / (n - 1) as Real;
            Ok((0..n).map(|i| a + step * i as Real).collect())
        }
    }
}

impl TryFrom<Vec<Real>> for FrequencyAxis {
    type Error = IcError;

    fn try_from(hz: Vec<Real>) -> IcResult<Self> {
        Self::new(hz)
    }
}

impl From<FrequencyAxis> for Vec<Real> {
    fn from(axis: FrequencyAxis) -> Self {
        axis.hz
    }
}
