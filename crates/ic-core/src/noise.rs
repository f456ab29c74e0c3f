//! Amplitude spectral densities.

use crate::error::{IcError, IcResult};

/// Noise amplitude spectral density, either flat or sampled on the
/// analysis frequency axis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Asd {
    Flat(f64),
    Spectrum(Vec<f64>),
}

impl Asd {
    /// Value at frequency bin `i`, `None` past the end of a spectrum.
    pub fn at(&self, i: usize) -> Option<f64> {
        match self {
            Self::Flat(v) => Some(*v),
            Self::Spectrum(v) => v.get(i).copied(),
        }
    }

    /// Ensure a spectrum has exactly `nbins` samples.
    pub fn check_len(&self, nbins: usize) -> IcResult<()> {
        match self {
            Self::Spectrum(v) if v.len() != nbins => Err(IcError::IndexOob {
                what: "ASD spectrum length",
                index: v.len(),
                len: nbins,
            }),
            _ => Ok(()),
        }
    }

    /// Expand to one value per bin.
    pub fn to_vec(&self, nbins: usize) -> IcResult<Vec<f64>> {
        self.check_len(nbins)?;
        Ok(match self {
            Self::Flat(v) => vec![*v; nbins],
            Self::Spectrum(v) => v.clone(),
        })
    }
}

impl From<f64> for Asd {
    fn from(v: f64) -> Self {
        Self::Flat(v)
    }
}

impl From<Vec<f64>> for Asd {
    fn from(v: Vec<f64>) -> Self {
        Self::Spectrum(v)
    }
}
