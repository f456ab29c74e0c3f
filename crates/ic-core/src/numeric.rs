use crate::IcError;

/// Floating point type used throughout system
pub type Real = f64;

/// Complex scalar used for every frequency response.
pub use num_complex::Complex64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

/// Same as [`nearly_equal`] using the modulus of the complex difference.
pub fn complex_nearly_equal(a: Complex64, b: Complex64, tol: Tolerances) -> bool {
    let diff = (a - b).norm();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.norm().max(b.norm())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, IcError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(IcError::NonFinite { what, value: v })
    }
}

pub fn ensure_finite_complex(v: Complex64, what: &'static str) -> Result<Complex64, IcError> {
    if v.re.is_finite() && v.im.is_finite() {
        Ok(v)
    } else {
        Err(IcError::NonFinite {
            what,
            value: if v.re.is_finite() { v.im } else { v.re },
        })
    }
}

/// Complex angular frequency `s = 2πi f` for a frequency in Hz.
#[inline]
pub fn angular(freq_hz: Real) -> Complex64 {
    Complex64::new(0.0, 2.0 * std::f64::consts::PI * freq_hz)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn complex_nearly_equal_uses_modulus() {
        let tol = Tolerances::default();
        let a = Complex64::new(3.0, 4.0);
        assert!(complex_nearly_equal(a, a + Complex64::new(0.0, 1e-13), tol));
        assert!(!complex_nearly_equal(a, a.conj(), tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_finite_complex_detects_inf() {
        assert!(ensure_finite_complex(Complex64::new(1.0, Real::INFINITY), "s").is_err());
        assert!(ensure_finite_complex(Complex64::new(1.0, -2.0), "s").is_ok());
    }

    #[test]
    fn angular_is_purely_imaginary() {
        let s = angular(1.0);
        assert_eq!(s.re, 0.0);
        assert!((s.im - 2.0 * std::f64::consts::PI).abs() < 1e-15);
    }
}
