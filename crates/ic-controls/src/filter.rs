//! Frequency-domain filters.
//!
//! A [`Filter`] is an immutable complex transfer function of the Laplace
//! variable `s`. It is built in one of three ways:
//! - **Function**: any callable `s -> H(s)`
//! - **Zero/pole/gain**: `k Π(s - z) / Π(s - p)`
//! - **Zero/pole at a reference**: zpk with `k` chosen so that `|H|` equals
//!   a target gain at a reference frequency
//!
//! Filters are always evaluated at `s = 2πi f` for frequencies in Hz.
//!
//! # Root units
//!
//! Zeros and poles given in [`RootUnits::Hz`] are multiplied by `-2π`, so a
//! pole at `1.0` is a stable 1 Hz pole at `s = -2π`. In
//! [`RootUnits::RadPerSec`] the roots are taken as-is: they are s-plane
//! locations and must carry their own sign. The reference frequency of
//! [`Filter::zpk_at`] follows the same units (`s0 = 2πi f` for Hz,
//! `s0 = i ω` for rad/s).

use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use ic_core::{Complex64, ensure_finite, ensure_finite_complex};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Callable filter response.
pub type ResponseFn = dyn Fn(Complex64) -> Complex64 + Send + Sync;

/// Units of zeros, poles and reference frequencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootUnits {
    /// Frequency domain, Hz.
    #[default]
    Hz,
    /// s-domain, rad/s.
    RadPerSec,
}

impl RootUnits {
    /// Factor applied to zeros and poles to place them in the s-plane.
    pub fn root_scale(self) -> f64 {
        match self {
            Self::Hz => -2.0 * PI,
            Self::RadPerSec => 1.0,
        }
    }

    /// Factor from a reference frequency to its angular frequency.
    pub fn angular_scale(self) -> f64 {
        self.root_scale().abs()
    }
}

/// Zero/pole/gain data with roots already in the s-plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Zpk {
    pub zeros: Vec<Complex64>,
    pub poles: Vec<Complex64>,
    pub gain: f64,
}

impl Zpk {
    /// `gain * Π(s - z) / Π(s - p)`
    pub fn response(&self, s: Complex64) -> Complex64 {
        zpk(&self.zeros, &self.poles, self.gain, s)
    }
}

/// Evaluate zero/pole/gain data at a single `s`.
pub fn zpk(zeros: &[Complex64], poles: &[Complex64], gain: f64, s: Complex64) -> Complex64 {
    let num: Complex64 = zeros.iter().map(|z| s - z).product();
    let den: Complex64 = poles.iter().map(|p| s - p).product();
    num / den * gain
}

/// Complex root pair of a resonance at `f0` with quality factor `q`.
///
/// In Hz the roots come out with positive real part so that the `-2π` root
/// scaling of [`Filter::zpk`] lands them in the left half plane; in rad/s
/// they are returned as s-plane roots directly.
pub fn res_roots(f0: f64, q: f64, units: RootUnits) -> ControlResult<(Complex64, Complex64)> {
    ensure_finite(f0, "resonance frequency")?;
    ensure_finite(q, "quality factor")?;
    if q == 0.0 {
        return Err(ControlError::InvalidFilter {
            what: "quality factor must be non-zero".to_string(),
        });
    }
    let sign = match units {
        RootUnits::Hz => 1.0,
        RootUnits::RadPerSec => -1.0,
    };
    let rr = Complex64::new(1.0 - 4.0 * q * q, 0.0).sqrt();
    let scale = sign * f0 / (2.0 * q);
    Ok(((rr + 1.0) * scale, (-rr + 1.0) * scale))
}

#[derive(Clone)]
enum FilterKind {
    Function(Arc<ResponseFn>),
    Zpk(Zpk),
    Cascade(Vec<Filter>),
}

/// Scalar complex transfer function.
#[derive(Clone)]
pub struct Filter {
    kind: FilterKind,
}

impl Filter {
    /// Wrap an arbitrary response function of `s`.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(Complex64) -> Complex64 + Send + Sync + 'static,
    {
        Self {
            kind: FilterKind::Function(Arc::new(f)),
        }
    }

    /// Frequency independent gain.
    pub fn gain(k: f64) -> ControlResult<Self> {
        Self::zpk(
            std::iter::empty::<f64>(),
            std::iter::empty::<f64>(),
            k,
            RootUnits::Hz,
        )
    }

    /// Filter from zeros, poles and gain.
    pub fn zpk<Z, P>(zeros: Z, poles: P, gain: f64, units: RootUnits) -> ControlResult<Self>
    where
        Z: IntoIterator,
        Z::Item: Into<Complex64>,
        P: IntoIterator,
        P::Item: Into<Complex64>,
    {
        ensure_finite(gain, "filter gain")?;
        let zpk = Zpk {
            zeros: scale_roots(zeros, units)?,
            poles: scale_roots(poles, units)?,
            gain,
        };
        Ok(Self {
            kind: FilterKind::Zpk(zpk),
        })
    }

    /// Filter from zeros and poles, with the gain set so that `|H|` equals
    /// `target_gain` at `reference_frequency`.
    pub fn zpk_at<Z, P>(
        zeros: Z,
        poles: P,
        target_gain: f64,
        reference_frequency: f64,
        units: RootUnits,
    ) -> ControlResult<Self>
    where
        Z: IntoIterator,
        Z::Item: Into<Complex64>,
        P: IntoIterator,
        P::Item: Into<Complex64>,
    {
        ensure_finite(target_gain, "filter target gain")?;
        ensure_finite(reference_frequency, "filter reference frequency")?;
        let zeros = scale_roots(zeros, units)?;
        let poles = scale_roots(poles, units)?;
        let s0 = Complex64::new(0.0, units.angular_scale() * reference_frequency);
        let mag = zpk(&zeros, &poles, 1.0, s0).norm();
        if mag == 0.0 || !mag.is_finite() {
            return Err(ControlError::InvalidFilter {
                what: format!(
                    "cannot normalize gain at {reference_frequency}: unit-gain magnitude is {mag}"
                ),
            });
        }
        Ok(Self {
            kind: FilterKind::Zpk(Zpk {
                zeros,
                poles,
                gain: target_gain / mag,
            }),
        })
    }

    /// Product of several filters, e.g. cascaded stages.
    pub fn cascade(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self {
            kind: FilterKind::Cascade(filters.into_iter().collect()),
        }
    }

    /// Response at a single complex frequency `s`.
    pub fn response(&self, s: Complex64) -> Complex64 {
        match &self.kind {
            FilterKind::Function(f) => f(s),
            FilterKind::Zpk(zpk) => zpk.response(s),
            FilterKind::Cascade(stages) => stages.iter().map(|f| f.response(s)).product(),
        }
    }

    /// Response at each of `s`.
    pub fn evaluate_s(&self, s: &[Complex64]) -> DVector<Complex64> {
        DVector::from_iterator(s.len(), s.iter().map(|&s| self.response(s)))
    }

    /// Response at each frequency in Hz (`s = 2πi f`).
    pub fn evaluate(&self, freqs: &[f64]) -> DVector<Complex64> {
        DVector::from_iterator(
            freqs.len(),
            freqs.iter().map(|&f| self.response(ic_core::angular(f))),
        )
    }

    /// Zero/pole/gain data when the filter was built from it.
    pub fn as_zpk(&self) -> Option<&Zpk> {
        match &self.kind {
            FilterKind::Zpk(zpk) => Some(zpk),
            _ => None,
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FilterKind::Function(_) => f.write_str("Filter::Function"),
            FilterKind::Zpk(zpk) => f.debug_tuple("Filter::Zpk").field(zpk).finish(),
            FilterKind::Cascade(stages) => f.debug_tuple("Filter::Cascade").field(stages).finish(),
        }
    }
}

fn scale_roots<R>(roots: R, units: RootUnits) -> ControlResult<Vec<Complex64>>
where
    R: IntoIterator,
    R::Item: Into<Complex64>,
{
    let a = units.root_scale();
    roots
        .into_iter()
        .map(|r| -> ControlResult<Complex64> {
            Ok(ensure_finite_complex(r.into(), "filter root")? * a)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ic_core::{Tolerances, complex_nearly_equal};
    use proptest::prelude::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn hz_pole_is_stable_low_pass() {
        // pole at 1 Hz -> s = -2π
        let lp = Filter::zpk(Vec::<f64>::new(), [1.0], 2.0 * PI, RootUnits::Hz).unwrap();
        let dc = lp.evaluate(&[0.0]);
        assert!((dc[0] - Complex64::new(1.0, 0.0)).norm() < EPS);
        let corner = lp.evaluate(&[1.0])[0];
        assert!((corner.norm() - 1.0 / 2f64.sqrt()).abs() < EPS);
        assert!((corner.arg() + PI / 4.0).abs() < EPS);
    }

    #[test]
    fn rad_per_sec_roots_are_unscaled() {
        let lp = Filter::zpk(Vec::<f64>::new(), [-1.0], 1.0, RootUnits::RadPerSec).unwrap();
        assert_eq!(lp.as_zpk().unwrap().poles, vec![Complex64::new(-1.0, 0.0)]);
        assert!((lp.response(Complex64::new(0.0, 0.0)).re - 1.0).abs() < EPS);
    }

    #[test]
    fn zpk_at_hits_target_in_hz() {
        let filt = Filter::zpk_at([1.0], [10.0, 10.0], 3.0, 50.0, RootUnits::Hz).unwrap();
        let mag = filt.evaluate(&[50.0])[0].norm();
        assert!((mag - 3.0).abs() < 1e-12);
    }

    #[test]
    fn zpk_at_hits_target_in_rad_per_sec() {
        let filt = Filter::zpk_at([-3.0], [-30.0], 0.5, 100.0, RootUnits::RadPerSec).unwrap();
        // reference is an angular frequency
        let mag = filt.response(Complex64::new(0.0, 100.0)).norm();
        assert!((mag - 0.5).abs() < 1e-12);
        let mag_hz = filt.evaluate(&[100.0 / (2.0 * PI)])[0].norm();
        assert!((mag_hz - 0.5).abs() < 1e-12);
    }

    #[test]
    fn zpk_at_rejects_zero_at_reference() {
        // zero at 0 Hz evaluated at DC has zero magnitude
        let err = Filter::zpk_at([0.0], Vec::<f64>::new(), 1.0, 0.0, RootUnits::Hz).unwrap_err();
        assert!(matches!(err, ControlError::InvalidFilter { .. }));
    }

    #[test]
    fn rejects_non_finite_arguments() {
        assert!(Filter::gain(f64::NAN).is_err());
        assert!(Filter::zpk([f64::INFINITY], [1.0], 1.0, RootUnits::Hz).is_err());
        assert!(
            Filter::zpk_at(Vec::<f64>::new(), [1.0], 1.0, f64::NAN, RootUnits::Hz).is_err()
        );
    }

    #[test]
    fn from_fn_is_evaluated_at_angular_frequency() {
        let filt = Filter::from_fn(|s| s);
        let out = filt.evaluate(&[1.0, 2.0]);
        assert!((out[1] - Complex64::new(0.0, 4.0 * PI)).norm() < EPS);
    }

    #[test]
    fn res_roots_are_conjugate_pair_for_high_q() {
        let (r1, r2) = res_roots(50.0, 10.0, RootUnits::Hz).unwrap();
        assert!((r1 - r2.conj()).norm() < 1e-9);
        assert!(r1.re > 0.0);
        // |r| = f0 for a resonance pair
        assert!((r1.norm() - 50.0).abs() < 1e-9);

        let (s1, _) = res_roots(50.0, 10.0, RootUnits::RadPerSec).unwrap();
        assert!((s1 + r1).norm() < 1e-9);
        assert!(res_roots(50.0, 0.0, RootUnits::Hz).is_err());
    }

    #[test]
    fn resonant_poles_peak_near_f0() {
        let (p1, p2) = res_roots(50.0, 10.0, RootUnits::Hz).unwrap();
        let filt = Filter::zpk(Vec::<f64>::new(), [p1, p2], 1.0, RootUnits::Hz).unwrap();
        let peak = filt.evaluate(&[50.0])[0].norm();
        let below = filt.evaluate(&[25.0])[0].norm();
        let above = filt.evaluate(&[100.0])[0].norm();
        assert!(peak > below && peak > above);
    }

    proptest! {
        #[test]
        fn cascade_is_pointwise_product(
            k1 in -10.0f64..10.0,
            k2 in 0.1f64..10.0,
            z in 0.1f64..100.0,
            p in 0.1f64..100.0,
            freqs in proptest::collection::vec(0.0f64..1e3, 1..20),
        ) {
            let f1 = Filter::zpk([z], [p], k1, RootUnits::Hz).unwrap();
            let f2 = Filter::from_fn(move |s| Complex64::new(k2, 0.0) / (s + 1.0));
            let both = Filter::cascade([f1.clone(), f2.clone()]);
            let a = f1.evaluate(&freqs);
            let b = f2.evaluate(&freqs);
            let ab = both.evaluate(&freqs);
            for i in 0..freqs.len() {
                prop_assert!(complex_nearly_equal(ab[i], a[i] * b[i], Tolerances::default()));
            }
        }
    }
}
