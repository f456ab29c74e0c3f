//! Loop matrices and open-loop products.
//!
//! [`LoopMatrices`] holds the six building blocks of the loop for one set of
//! registrations. Each injection point owns the edge leaving it:
//!
//! | edge | factors |
//! |---|---|
//! | err -> ctrl | `C` |
//! | ctrl -> comp | `K · A` |
//! | comp -> drive | `M` |
//! | drive -> sens | `P` |
//! | sens -> err | `S` |
//!
//! A path is the product of the edges it crosses, the last edge leftmost.

use ic_core::{Complex64, FrequencyAxis, NameRegistry};
use nalgebra::DMatrix;

use crate::error::{ControlError, ControlResult};
use crate::signal::InjectionPoint;
use crate::tensor::{Factor, MatrixSeries, contract};

/// Sensing, actuation, plant, controller, compensator and response matrices.
#[derive(Debug, Clone)]
pub struct LoopMatrices {
    /// `S`, DOF × probe.
    pub(crate) sensing: DMatrix<Complex64>,
    /// `A`, drive × DOF.
    pub(crate) actuation: DMatrix<Complex64>,
    /// `P`, probe × drive × f.
    pub(crate) plant: MatrixSeries,
    /// `C`, DOF × DOF × f.
    pub(crate) controller: MatrixSeries,
    /// `K`, diagonal drive × drive × f.
    pub(crate) compensator: MatrixSeries,
    /// `M`, diagonal drive × drive × f.
    pub(crate) response: MatrixSeries,
}

impl LoopMatrices {
    pub fn sensing(&self) -> &DMatrix<Complex64> {
        &self.sensing
    }

    pub fn actuation(&self) -> &DMatrix<Complex64> {
        &self.actuation
    }

    pub fn plant(&self) -> &MatrixSeries {
        &self.plant
    }

    pub fn controller(&self) -> &MatrixSeries {
        &self.controller
    }

    pub fn compensator(&self) -> &MatrixSeries {
        &self.compensator
    }

    pub fn response(&self) -> &MatrixSeries {
        &self.response
    }

    pub fn nbins(&self) -> usize {
        self.plant.nbins()
    }

    fn edge(&self, from: InjectionPoint) -> Vec<Factor<'_>> {
        match from {
            InjectionPoint::Err => vec![Factor::Series(&self.controller)],
            InjectionPoint::Ctrl => vec![
                Factor::Series(&self.compensator),
                Factor::Static(&self.actuation),
            ],
            InjectionPoint::Comp => vec![Factor::Series(&self.response)],
            InjectionPoint::Drive => vec![Factor::Series(&self.plant)],
            InjectionPoint::Sens => vec![Factor::Static(&self.sensing)],
        }
    }

    /// Factors carrying a signal from `from` downstream to `to`, leftmost
    /// first. Empty when `from == to`.
    pub fn path(&self, from: InjectionPoint, to: InjectionPoint) -> Vec<Factor<'_>> {
        let mut edges = Vec::new();
        let mut p = from;
        while p != to {
            edges.push(self.edge(p));
            p = p.next();
        }
        edges.into_iter().rev().flatten().collect()
    }

    /// Factors of the full loop broken at `point`.
    pub fn loop_factors(&self, point: InjectionPoint) -> Vec<Factor<'_>> {
        let mut factors = self.path(point.next(), point);
        factors.extend(self.edge(point));
        factors
    }

    /// Open-loop transfer function with the loop broken at `point`.
    pub fn open_loop(&self, point: InjectionPoint) -> ControlResult<MatrixSeries> {
        let oltf = contract(&self.loop_factors(point), self.nbins())?;
        tracing::debug!(point = %point, shape = ?oltf.shape(), "open loop assembled");
        Ok(oltf)
    }

    /// Optical response seen through the sensing and actuation matrices,
    /// `S · P · A`.
    pub fn sensing_function(&self) -> ControlResult<MatrixSeries> {
        contract(
            &[
                Factor::Static(&self.sensing),
                Factor::Series(&self.plant),
                Factor::Static(&self.actuation),
            ],
            self.nbins(),
        )
    }
}

/// Loop matrices together with the five open-loop transfer functions.
///
/// Returned by [`crate::ControlSystem::assemble`] so a loop can be inspected
/// even when it cannot be closed.
#[derive(Debug, Clone)]
pub struct LoopAssembly {
    pub(crate) frequencies: FrequencyAxis,
    pub(crate) dofs: NameRegistry,
    pub(crate) probes: NameRegistry,
    pub(crate) drives: NameRegistry,
    pub(crate) matrices: LoopMatrices,
    /// Indexed by [`InjectionPoint::index`].
    pub(crate) oltf: Vec<MatrixSeries>,
}

impl LoopAssembly {
    pub(crate) fn new(
        frequencies: FrequencyAxis,
        dofs: NameRegistry,
        probes: NameRegistry,
        drives: NameRegistry,
        matrices: LoopMatrices,
    ) -> ControlResult<Self> {
        let oltf = InjectionPoint::ALL
            .iter()
            .map(|&p| matrices.open_loop(p))
            .collect::<ControlResult<Vec<_>>>()?;
        Ok(Self {
            frequencies,
            dofs,
            probes,
            drives,
            matrices,
            oltf,
        })
    }

    pub fn frequencies(&self) -> &FrequencyAxis {
        &self.frequencies
    }

    pub fn matrices(&self) -> &LoopMatrices {
        &self.matrices
    }

    pub fn dofs(&self) -> &NameRegistry {
        &self.dofs
    }

    pub fn probes(&self) -> &NameRegistry {
        &self.probes
    }

    pub fn drives(&self) -> &NameRegistry {
        &self.drives
    }

    /// Open-loop transfer function at `point`.
    pub fn oltf(&self, point: InjectionPoint) -> &MatrixSeries {
        &self.oltf[point.index()]
    }

    /// Invert `I - OLTF` at every point and bin.
    pub(crate) fn close(self) -> ControlResult<LoopSnapshot> {
        let cltf = InjectionPoint::ALL
            .iter()
            .map(|&p| {
                self.oltf(p)
                    .closed_loop(p.as_str(), self.frequencies.hz())
            })
            .collect::<ControlResult<Vec<_>>>()?;
        Ok(LoopSnapshot {
            assembly: self,
            cltf,
        })
    }
}

/// Result of a successful tickle: everything queries read.
#[derive(Debug, Clone)]
pub(crate) struct LoopSnapshot {
    pub(crate) assembly: LoopAssembly,
    pub(crate) cltf: Vec<MatrixSeries>,
}

impl LoopSnapshot {
    pub(crate) fn oltf(&self, point: InjectionPoint) -> &MatrixSeries {
        self.assembly.oltf(point)
    }

    pub(crate) fn cltf(&self, point: InjectionPoint) -> &MatrixSeries {
        &self.cltf[point.index()]
    }

    pub(crate) fn matrices(&self) -> &LoopMatrices {
        &self.assembly.matrices
    }

    pub(crate) fn nbins(&self) -> usize {
        self.assembly.frequencies.len()
    }

    pub(crate) fn frequencies(&self) -> &FrequencyAxis {
        &self.assembly.frequencies
    }

    pub(crate) fn registry(&self, axis: crate::signal::Axis) -> &NameRegistry {
        match axis {
            crate::signal::Axis::Dof => &self.assembly.dofs,
            crate::signal::Axis::Drive => &self.assembly.drives,
            crate::signal::Axis::Probe => &self.assembly.probes,
        }
    }

    /// Index of `name` on `axis`.
    pub(crate) fn index_of(&self, axis: crate::signal::Axis, name: &str) -> ControlResult<usize> {
        self.registry(axis)
            .index_of(name)
            .map_err(ControlError::from)
    }
}
