//! The MIMO control system.
//!
//! Registrations (plant, DOFs, filters, compensators, responses) may happen
//! in any order. [`ControlSystem::tickle`] turns them into loop matrices and
//! transfer functions in one pass; queries read the result of the last
//! successful tickle.

use std::sync::Arc;

use ic_core::timing::Timer;
use ic_core::{Complex64, FrequencyAxis, MotionType, NameRegistry, drive_key, split_drive_key};
use ic_plant::Plant;
use nalgebra::DMatrix;

use crate::assembly::{LoopAssembly, LoopMatrices, LoopSnapshot};
use crate::dof::{Coefficients, DegreeOfFreedom};
use crate::error::{ControlError, ControlResult};
use crate::filter::Filter;
use crate::tensor::MatrixSeries;

/// Plant handle shared between a control system and its owner.
pub type SharedPlant = Arc<dyn Plant + Send + Sync>;

/// Face of the optics used for beam spot queries unless configured.
pub const DEFAULT_SPOT_FACE: &str = "fr";

/// Controller filter from one DOF to another.
#[derive(Debug, Clone)]
pub struct LoopFilter {
    pub to: String,
    pub from: String,
    pub filter: Filter,
}

/// Per-drive filter keyed by `<base>.<motion>`.
#[derive(Debug, Clone)]
struct DriveFilter {
    drive: String,
    filter: Filter,
}

pub struct ControlSystem {
    plant: Option<SharedPlant>,
    dofs: Vec<DegreeOfFreedom>,
    dof_names: NameRegistry,
    probes: NameRegistry,
    drives: NameRegistry,
    filters: Vec<LoopFilter>,
    compensators: Vec<DriveFilter>,
    responses: Vec<DriveFilter>,
    spot_face: Option<String>,
    snapshot: Option<LoopSnapshot>,
}

impl ControlSystem {
    pub fn new() -> Self {
        Self {
            dof_names: NameRegistry::new("dof"),
            probes: NameRegistry::new("probe"),
            drives: NameRegistry::new("drive"),
            plant: None,
            dofs: Vec::new(),
            filters: Vec::new(),
            compensators: Vec::new(),
            responses: Vec::new(),
            spot_face: None,
            snapshot: None,
        }
    }

    /// Use `face` instead of [`DEFAULT_SPOT_FACE`] for beam spot queries.
    pub fn with_spot_face(mut self, face: impl Into<String>) -> Self {
        self.spot_face = Some(face.into());
        self
    }

    pub fn spot_face(&self) -> &str {
        self.spot_face.as_deref().unwrap_or(DEFAULT_SPOT_FACE)
    }

    /// Attach the optical plant. Only one plant can ever be bound.
    pub fn bind_plant(&mut self, plant: SharedPlant) -> ControlResult<()> {
        if self.plant.is_some() {
            return Err(ControlError::PlantAlreadyBound);
        }
        tracing::debug!(bins = plant.frequencies().len(), "plant bound");
        self.plant = Some(plant);
        Ok(())
    }

    pub fn plant(&self) -> ControlResult<&SharedPlant> {
        self.plant.as_ref().ok_or(ControlError::PlantNotBound)
    }

    /// Frequency axis of the bound plant.
    pub fn frequencies(&self) -> ControlResult<&FrequencyAxis> {
        Ok(self.plant()?.frequencies())
    }

    /// Register a degree of freedom.
    ///
    /// Its probes and drives are appended to the probe and drive lists
    /// unless already present.
    pub fn add_dof(
        &mut self,
        name: impl Into<String>,
        probes: impl Into<Coefficients>,
        drives: impl Into<Coefficients>,
        motion: MotionType,
    ) -> ControlResult<()> {
        self.insert_dof(DegreeOfFreedom::new(name, probes, drives, motion))
    }

    /// Register an already built degree of freedom.
    pub fn insert_dof(&mut self, dof: DegreeOfFreedom) -> ControlResult<()> {
        if self.dof_names.contains(dof.name()) {
            return Err(ControlError::DuplicateDof {
                name: dof.name().to_string(),
            });
        }
        self.dof_names.push_unique(dof.name());
        self.probes.extend(dof.probes().keys());
        self.drives.extend(dof.drives().keys());
        self.dofs.push(dof);
        Ok(())
    }

    pub fn dofs(&self) -> &[DegreeOfFreedom] {
        &self.dofs
    }

    pub fn dof(&self, name: &str) -> ControlResult<&DegreeOfFreedom> {
        let i = self.dof_names.index_of(name)?;
        Ok(&self.dofs[i])
    }

    /// DOF names in matrix order.
    pub fn dof_names(&self) -> &NameRegistry {
        &self.dof_names
    }

    /// Probe names in first-seen order.
    pub fn probes(&self) -> &NameRegistry {
        &self.probes
    }

    /// Drive keys in first-seen order.
    pub fn drives(&self) -> &NameRegistry {
        &self.drives
    }

    /// Add a controller filter from `from` to `to`.
    ///
    /// DOF names are resolved at tickle time, so filters may be added
    /// before their DOFs.
    pub fn add_filter(&mut self, to: impl Into<String>, from: impl Into<String>, filter: Filter) {
        self.filters.push(LoopFilter {
            to: to.into(),
            from: from.into(),
            filter,
        });
    }

    pub fn filters(&self) -> &[LoopFilter] {
        &self.filters
    }

    /// The single filter registered from `from` to `to`.
    pub fn get_filter(&self, to: &str, from: &str) -> ControlResult<&Filter> {
        let mut matches = self
            .filters
            .iter()
            .filter(|f| f.to == to && f.from == from);
        match (matches.next(), matches.count()) {
            (None, _) => Err(ControlError::NoFilter {
                to: to.to_string(),
                from: from.to_string(),
            }),
            (Some(f), 0) => Ok(&f.filter),
            (Some(_), rest) => Err(ControlError::MultipleFilters {
                to: to.to_string(),
                from: from.to_string(),
                count: rest + 1,
            }),
        }
    }

    /// Set the compensation filter of drive `drive.motion`.
    pub fn add_compensator(&mut self, drive: &str, motion: MotionType, filter: Filter) -> ControlResult<()> {
        let key = drive_key(drive, motion);
        if self.compensators.iter().any(|c| c.drive == key) {
            return Err(ControlError::DuplicateCompensator { drive: key });
        }
        self.compensators.push(DriveFilter { drive: key, filter });
        Ok(())
    }

    /// Set the actuator response of drive `drive.motion`.
    pub fn set_response(&mut self, drive: &str, motion: MotionType, filter: Filter) -> ControlResult<()> {
        let key = drive_key(drive, motion);
        if self.responses.iter().any(|r| r.drive == key) {
            return Err(ControlError::DuplicateResponse { drive: key });
        }
        self.responses.push(DriveFilter { drive: key, filter });
        Ok(())
    }

    /// Compensator of a drive key, if any.
    pub fn compensator(&self, drive: &str) -> Option<&Filter> {
        find_drive_filter(&self.compensators, drive)
    }

    /// Actuator response of a drive key, if any.
    pub fn response(&self, drive: &str) -> Option<&Filter> {
        find_drive_filter(&self.responses, drive)
    }

    /// Build the loop matrices and open-loop transfer functions without
    /// closing the loops.
    pub fn assemble(&self) -> ControlResult<LoopAssembly> {
        let plant = self.plant()?;
        let freqs = plant.frequencies();
        let nbins = freqs.len();

        let sensing = self.compute_sensing()?;
        tracing::debug!(shape = ?sensing.shape(), "sensing matrix");
        let actuation = self.compute_actuation()?;
        tracing::debug!(shape = ?actuation.shape(), "actuation matrix");
        let plant_tf = self.compute_plant(plant.as_ref(), nbins)?;
        tracing::debug!(shape = ?plant_tf.shape(), bins = nbins, "plant tensor");
        let controller = self.compute_controller(freqs)?;
        let compensator = self.compute_drive_diagonal(&self.compensators, "compensator", freqs)?;
        let response = self.compute_drive_diagonal(&self.responses, "response", freqs)?;

        LoopAssembly::new(
            freqs.clone(),
            self.dof_names.clone(),
            self.probes.clone(),
            self.drives.clone(),
            LoopMatrices {
                sensing,
                actuation,
                plant: plant_tf,
                controller,
                compensator,
                response,
            },
        )
    }

    /// Recompute every loop matrix and transfer function.
    ///
    /// On failure the result of the previous tickle stays in place.
    pub fn tickle(&mut self) -> ControlResult<()> {
        let timer = Timer::start("tickle");
        tracing::info!(
            dofs = self.dofs.len(),
            probes = self.probes.len(),
            drives = self.drives.len(),
            "tickling control system"
        );
        let snapshot = self.assemble()?.close()?;
        tracing::info!(bins = snapshot.nbins(), "control system tickled");
        self.snapshot = Some(snapshot);
        timer.stop_and_log();
        Ok(())
    }

    /// Whether a tickle has succeeded.
    pub fn is_tickled(&self) -> bool {
        self.snapshot.is_some()
    }

    pub(crate) fn snapshot(&self) -> ControlResult<&LoopSnapshot> {
        self.snapshot.as_ref().ok_or(ControlError::NotTickled)
    }

    fn compute_sensing(&self) -> ControlResult<DMatrix<Complex64>> {
        let mut s = DMatrix::zeros(self.dofs.len(), self.probes.len());
        for (i, dof) in self.dofs.iter().enumerate() {
            for (j, c) in dof.sensing_vector(&self.probes)?.iter().enumerate() {
                s[(i, j)] = Complex64::new(*c, 0.0);
            }
        }
        Ok(s)
    }

    fn compute_actuation(&self) -> ControlResult<DMatrix<Complex64>> {
        let mut a = DMatrix::zeros(self.drives.len(), self.dofs.len());
        for (j, dof) in self.dofs.iter().enumerate() {
            for (i, c) in dof.actuation_vector(&self.drives)?.iter().enumerate() {
                a[(i, j)] = Complex64::new(*c, 0.0);
            }
        }
        Ok(a)
    }

    fn compute_plant(&self, plant: &dyn Plant, nbins: usize) -> ControlResult<MatrixSeries> {
        let mut p = MatrixSeries::zeros(self.probes.len(), self.drives.len(), nbins);
        for (pi, probe) in self.probes.iter().enumerate() {
            for (di, drive) in self.drives.iter().enumerate() {
                let (base, motion) = split_drive_key(drive)?;
                let tf = plant.transfer_function(probe, base, motion)?;
                p.set_entry(pi, di, &tf)?;
            }
        }
        Ok(p)
    }

    fn compute_controller(&self, freqs: &FrequencyAxis) -> ControlResult<MatrixSeries> {
        let n = self.dofs.len();
        let mut c = MatrixSeries::zeros(n, n, freqs.len());
        let mut seen = Vec::with_capacity(self.filters.len());
        for f in &self.filters {
            let to = self.dof_names.index_of(&f.to)?;
            let from = self.dof_names.index_of(&f.from)?;
            if seen.contains(&(to, from)) {
                tracing::warn!(to = %f.to, from = %f.from, "several filters for one DOF pair; the last one is used");
            }
            seen.push((to, from));
            c.set_entry(to, from, &f.filter.evaluate_s(freqs.s()))?;
        }
        Ok(c)
    }

    fn compute_drive_diagonal(
        &self,
        entries: &[DriveFilter],
        what: &'static str,
        freqs: &FrequencyAxis,
    ) -> ControlResult<MatrixSeries> {
        let mut m = MatrixSeries::identity(self.drives.len(), freqs.len());
        for entry in entries {
            match self.drives.index_of(&entry.drive) {
                Ok(i) => m.set_entry(i, i, &entry.filter.evaluate_s(freqs.s()))?,
                Err(_) => {
                    tracing::warn!(drive = %entry.drive, what, "filter set for a drive no DOF actuates");
                }
            }
        }
        Ok(m)
    }
}

fn find_drive_filter<'a>(entries: &'a [DriveFilter], drive: &str) -> Option<&'a Filter> {
    entries.iter().find(|e| e.drive == drive).map(|e| &e.filter)
}

impl Default for ControlSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ControlSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlSystem")
            .field("plant_bound", &self.plant.is_some())
            .field("dofs", &self.dof_names.names())
            .field("probes", &self.probes.names())
            .field("drives", &self.drives.names())
            .field("filters", &self.filters.len())
            .field("tickled", &self.snapshot.is_some())
            .finish()
    }
}
