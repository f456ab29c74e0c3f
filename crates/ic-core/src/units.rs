// ic-core/src/units.rs

use uom::si::f64::Frequency as UomFrequency;

// Public canonical unit types (SI, f64)
pub type Frequency = UomFrequency;

#[inline]
pub fn hz(v: f64) -> Frequency {
    use uom::si::frequency::hertz;
    Frequency::new::<hertz>(v)
}

#[inline]
pub fn khz(v: f64) -> Frequency {
    use uom::si::frequency::kilohertz;
    Frequency::new::<kilohertz>(v)
}

/// Value of a frequency quantity in Hz.
#[inline]
pub fn to_hz(f: Frequency) -> f64 {
    use uom::si::frequency::hertz;
    f.get::<hertz>()
}
