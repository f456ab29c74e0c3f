//! Frequency-resolved matrices.
//!
//! Every loop quantity is a matrix per frequency bin. [`MatrixSeries`] stores
//! one `rows × cols` complex matrix per bin; [`contract`] multiplies a chain
//! of frequency independent and frequency dependent factors bin by bin.
//! Bins are independent, so contractions run in parallel with rayon.

use ic_core::Complex64;
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::error::{ControlError, ControlResult};

/// One complex matrix per frequency bin, all with the same shape.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixSeries {
    rows: usize,
    cols: usize,
    bins: Vec<DMatrix<Complex64>>,
}

impl MatrixSeries {
    pub fn zeros(rows: usize, cols: usize, nbins: usize) -> Self {
        Self {
            rows,
            cols,
            bins: vec![DMatrix::zeros(rows, cols); nbins],
        }
    }

    pub fn identity(n: usize, nbins: usize) -> Self {
        Self {
            rows: n,
            cols: n,
            bins: vec![DMatrix::identity(n, n); nbins],
        }
    }

    /// Build from per-bin matrices. All matrices must share `rows × cols`.
    pub fn from_bins(rows: usize, cols: usize, bins: Vec<DMatrix<Complex64>>) -> ControlResult<Self> {
        if let Some(m) = bins.iter().find(|m| m.shape() != (rows, cols)) {
            return Err(ControlError::LengthMismatch {
                what: format!("matrix series bin shape {:?}", m.shape()),
                expected: rows * cols,
                actual: m.len(),
            });
        }
        Ok(Self { rows, cols, bins })
    }

    /// Diagonal series whose `(i, i)` entry at bin `f` is `diag[i][f]`.
    pub fn diagonal(diag: &[DVector<Complex64>], nbins: usize) -> ControlResult<Self> {
        let n = diag.len();
        let mut out = Self::zeros(n, n, nbins);
        for (i, d) in diag.iter().enumerate() {
            out.set_entry(i, i, d)?;
        }
        Ok(out)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of frequency bins.
    pub fn nbins(&self) -> usize {
        self.bins.len()
    }

    /// Matrix at frequency bin `f`.
    pub fn bin(&self, f: usize) -> &DMatrix<Complex64> {
        &self.bins[f]
    }

    pub fn bins(&self) -> &[DMatrix<Complex64>] {
        &self.bins
    }

    /// Entry `(i, j)` across all bins.
    pub fn entry(&self, i: usize, j: usize) -> ControlResult<DVector<Complex64>> {
        self.check_index(i, j)?;
        Ok(DVector::from_iterator(
            self.bins.len(),
            self.bins.iter().map(|m| m[(i, j)]),
        ))
    }

    /// Overwrite entry `(i, j)` across all bins.
    pub fn set_entry(&mut self, i: usize, j: usize, values: &DVector<Complex64>) -> ControlResult<()> {
        self.check_index(i, j)?;
        if values.len() != self.bins.len() {
            return Err(ControlError::LengthMismatch {
                what: format!("entry ({i}, {j}) frequency response"),
                expected: self.bins.len(),
                actual: values.len(),
            });
        }
        for (m, v) in self.bins.iter_mut().zip(values.iter()) {
            m[(i, j)] = *v;
        }
        Ok(())
    }

    /// Keep row `i` only.
    pub fn select_row(&self, i: usize) -> ControlResult<Self> {
        if i >= self.rows {
            return Err(ControlError::Core(ic_core::IcError::IndexOob {
                what: "matrix series row",
                index: i,
                len: self.rows,
            }));
        }
        Ok(Self {
            rows: 1,
            cols: self.cols,
            bins: self.bins.iter().map(|m| m.rows(i, 1).into_owned()).collect(),
        })
    }

    /// Keep column `j` only.
    pub fn select_column(&self, j: usize) -> ControlResult<Self> {
        if j >= self.cols {
            return Err(ControlError::Core(ic_core::IcError::IndexOob {
                what: "matrix series column",
                index: j,
                len: self.cols,
            }));
        }
        Ok(Self {
            rows: self.rows,
            cols: 1,
            bins: self.bins.iter().map(|m| m.columns(j, 1).into_owned()).collect(),
        })
    }

    /// `(I - self)^-1` at every bin.
    ///
    /// Fails with the first bin where the matrix is singular; `frequencies`
    /// is only used to report it.
    pub fn closed_loop(&self, point: &str, frequencies: &[f64]) -> ControlResult<Self> {
        let n = self.rows;
        if n != self.cols {
            return Err(ControlError::Core(ic_core::IcError::Invariant {
                what: "loop gain must be square",
            }));
        }
        let bins = self
            .bins
            .par_iter()
            .enumerate()
            .map(|(f, l)| {
                if n == 0 {
                    return Ok(DMatrix::zeros(0, 0));
                }
                let m = DMatrix::<Complex64>::identity(n, n) - l;
                m.try_inverse()
                    .filter(|inv| inv.iter().all(|v| v.re.is_finite() && v.im.is_finite()))
                    .ok_or_else(|| ControlError::Singular {
                        point: point.to_string(),
                        bin: f,
                        frequency: frequencies.get(f).copied().unwrap_or(f64::NAN),
                    })
            })
            .collect::<ControlResult<Vec<_>>>()?;
        Ok(Self {
            rows: n,
            cols: n,
            bins,
        })
    }

    /// Elementwise `|x|²` of entry `(i, j)`.
    pub fn power(&self, i: usize, j: usize) -> ControlResult<DVector<f64>> {
        Ok(self.entry(i, j)?.map(|v| v.norm_sqr()))
    }

    fn check_index(&self, i: usize, j: usize) -> ControlResult<()> {
        if i >= self.rows {
            return Err(ControlError::Core(ic_core::IcError::IndexOob {
                what: "matrix series row",
                index: i,
                len: self.rows,
            }));
        }
        if j >= self.cols {
            return Err(ControlError::Core(ic_core::IcError::IndexOob {
                what: "matrix series column",
                index: j,
                len: self.cols,
            }));
        }
        Ok(())
    }
}

/// One operand of a contraction.
#[derive(Debug, Clone, Copy)]
pub enum Factor<'a> {
    /// Same matrix at every frequency (sensing, actuation).
    Static(&'a DMatrix<Complex64>),
    /// Frequency dependent matrix.
    Series(&'a MatrixSeries),
}

impl Factor<'_> {
    fn shape(&self) -> (usize, usize) {
        match self {
            Factor::Static(m) => m.shape(),
            Factor::Series(s) => s.shape(),
        }
    }

    fn at(&self, f: usize) -> &DMatrix<Complex64> {
        match self {
            Factor::Static(m) => m,
            Factor::Series(s) => s.bin(f),
        }
    }
}

/// Matrix product `factors[0] · factors[1] · …` at each of `nbins` bins.
///
/// An empty chain is not meaningful and is rejected, as are shapes that do
/// not chain.
pub fn contract(factors: &[Factor<'_>], nbins: usize) -> ControlResult<MatrixSeries> {
    let (first, rest) = factors.split_first().ok_or(ControlError::Core(
        ic_core::IcError::InvalidArg {
            what: "contraction needs at least one factor",
        },
    ))?;
    let (rows, mut cols) = first.shape();
    for fac in rest {
        let (r, c) = fac.shape();
        if r != cols {
            return Err(ControlError::LengthMismatch {
                what: "contraction inner dimension".to_string(),
                expected: cols,
                actual: r,
            });
        }
        cols = c;
    }
    for fac in factors {
        if let Factor::Series(s) = fac {
            if s.nbins() != nbins {
                return Err(ControlError::LengthMismatch {
                    what: "contraction frequency bins".to_string(),
                    expected: nbins,
                    actual: s.nbins(),
                });
            }
        }
    }

    let bins = (0..nbins)
        .into_par_iter()
        .map(|f| {
            rest.iter()
                .fold(first.at(f).clone(), |acc, fac| acc * fac.at(f))
        })
        .collect();
    Ok(MatrixSeries { rows, cols, bins })
}
