//! Transfer function and noise queries on a tickled control system.

use std::collections::BTreeMap;

use ic_core::{Asd, Complex64, split_drive_key};
use nalgebra::DVector;

use crate::assembly::LoopSnapshot;
use crate::error::{ControlError, ControlResult};
use crate::signal::{InjectionPoint, SignalKind};
use crate::system::ControlSystem;
use crate::tensor::{Factor, MatrixSeries, contract};

impl ControlSystem {
    /// Open-loop transfer function from `from` to `to` with the loop broken
    /// at `point`. Names are DOFs, drives or probes depending on the point.
    pub fn get_oltf(&self, to: &str, from: &str, point: InjectionPoint) -> ControlResult<DVector<Complex64>> {
        let snap = self.snapshot()?;
        let (i, j) = point_indices(snap, point, to, from)?;
        snap.oltf(point).entry(i, j)
    }

    /// Closed-loop transfer function from `from` to `to` at `point`.
    pub fn get_cltf(&self, to: &str, from: &str, point: InjectionPoint) -> ControlResult<DVector<Complex64>> {
        let snap = self.snapshot()?;
        let (i, j) = point_indices(snap, point, to, from)?;
        snap.cltf(point).entry(i, j)
    }

    /// Full open-loop matrix at `point`.
    pub fn oltf(&self, point: InjectionPoint) -> ControlResult<&MatrixSeries> {
        Ok(self.snapshot()?.oltf(point))
    }

    /// Full closed-loop matrix at `point`.
    pub fn cltf(&self, point: InjectionPoint) -> ControlResult<&MatrixSeries> {
        Ok(self.snapshot()?.cltf(point))
    }

    /// Closed-loop transfer function from signal `from` of kind `from_sig`
    /// to signal `to` of kind `to_sig`.
    ///
    /// `None` keeps the whole axis, so `get_tf(None, Err, None, Sens)` is the
    /// full DOF × probe matrix.
    pub fn get_tf(
        &self,
        to: Option<&str>,
        to_sig: SignalKind,
        from: Option<&str>,
        from_sig: SignalKind,
    ) -> ControlResult<MatrixSeries> {
        let snap = self.snapshot()?;
        let mut tf = self.full_tf(snap, to_sig, from_sig)?;
        if let Some(from) = from {
            tf = tf.select_column(snap.index_of(from_sig.axis(), from)?)?;
        }
        if let Some(to) = to {
            tf = tf.select_row(snap.index_of(to_sig.axis(), to)?)?;
        }
        Ok(tf)
    }

    /// Response of DOF `to` at `sig` to a calibration excitation of DOF
    /// `from`, `CL · (loop factors) · S · P · A`.
    pub fn get_calibration(&self, to: &str, from: &str, sig: InjectionPoint) -> ControlResult<DVector<Complex64>> {
        if !matches!(sig, InjectionPoint::Err | InjectionPoint::Ctrl) {
            return Err(ControlError::UnsupportedPath {
                to: sig.into(),
                from: SignalKind::Cal,
            });
        }
        self.get_tf(Some(to), sig.into(), Some(from), SignalKind::Cal)?
            .entry(0, 0)
    }

    /// Sensing noise of `probe` referred to DOF `dof` at `sig`.
    ///
    /// Uses the plant quantum noise of the probe when `asd` is `None`.
    pub fn get_sensing_noise(
        &self,
        dof: &str,
        probe: &str,
        asd: Option<&Asd>,
        sig: InjectionPoint,
    ) -> ControlResult<DVector<f64>> {
        if !matches!(sig, InjectionPoint::Err | InjectionPoint::Ctrl) {
            return Err(ControlError::UnsupportedPath {
                to: sig.into(),
                from: SignalKind::Sens,
            });
        }
        let tf = self
            .get_tf(Some(dof), sig.into(), Some(probe), SignalKind::Sens)?
            .entry(0, 0)?;
        let asd = match asd {
            Some(asd) => asd.clone(),
            None => self.plant()?.quantum_noise(probe)?,
        };
        let asd = asd.to_vec(tf.len())?;
        Ok(DVector::from_iterator(
            tf.len(),
            tf.iter().zip(asd).map(|(t, a)| t.norm() * a),
        ))
    }

    /// Optical response between two DOFs through the sensing and actuation
    /// matrices, `S · P · A`, without any loop suppression.
    pub fn get_sensing_function(&self, to: &str, from: &str) -> ControlResult<DVector<Complex64>> {
        let snap = self.snapshot()?;
        let i = snap.index_of(crate::signal::Axis::Dof, to)?;
        let j = snap.index_of(crate::signal::Axis::Dof, from)?;
        snap.matrices().sensing_function()?.entry(i, j)
    }

    /// Total noise at `to` from uncorrelated sources at the `from_sig`
    /// signals named in `noise`, `sqrt(Σ |TF|² ASD²)`.
    pub fn get_total_noise_to(
        &self,
        to: &str,
        to_sig: SignalKind,
        from_sig: SignalKind,
        noise: &BTreeMap<String, Asd>,
    ) -> ControlResult<DVector<f64>> {
        let snap = self.snapshot()?;
        let tf = self.get_tf(Some(to), to_sig, None, from_sig)?;
        let mut psd = DVector::zeros(snap.nbins());
        for (from, asd) in noise {
            let j = snap.index_of(from_sig.axis(), from)?;
            accumulate(&mut psd, &tf.power(0, j)?, asd)?;
        }
        Ok(psd.map(f64::sqrt))
    }

    /// Total noise from a single source at `from` spread over the `to_sig`
    /// signals named in `noise`, `sqrt(Σ |TF|² ASD²)`.
    pub fn get_total_noise_from(
        &self,
        to_sig: SignalKind,
        from: &str,
        from_sig: SignalKind,
        noise: &BTreeMap<String, Asd>,
    ) -> ControlResult<DVector<f64>> {
        let snap = self.snapshot()?;
        let tf = self.get_tf(None, to_sig, Some(from), from_sig)?;
        let mut psd = DVector::zeros(snap.nbins());
        for (to, asd) in noise {
            let i = snap.index_of(to_sig.axis(), to)?;
            accumulate(&mut psd, &tf.power(i, 0)?, asd)?;
        }
        Ok(psd.map(f64::sqrt))
    }

    fn full_tf(&self, snap: &LoopSnapshot, to: SignalKind, from: SignalKind) -> ControlResult<MatrixSeries> {
        match (to, from) {
            (SignalKind::Cal, _) | (_, SignalKind::Pos | SignalKind::Spot) => {
                Err(ControlError::UnsupportedPath { to, from })
            }
            (SignalKind::Pos, _) => {
                let mech = self.mechanical_modification(snap)?;
                let to_drives = loop_tf(snap, InjectionPoint::Drive, from)?;
                contract(
                    &[Factor::Series(&mech), Factor::Series(&to_drives)],
                    snap.nbins(),
                )
            }
            (SignalKind::Spot, _) => {
                let spot = self.beam_spot_motion(snap)?;
                let to_drives = loop_tf(snap, InjectionPoint::Drive, from)?;
                contract(
                    &[Factor::Series(&spot), Factor::Series(&to_drives)],
                    snap.nbins(),
                )
            }
            _ => {
                let point = to
                    .injection_point()
                    .ok_or(ControlError::UnsupportedPath { to, from })?;
                loop_tf(snap, point, from)
            }
        }
    }

    /// Drive × drive radiation pressure modification of the optic motion.
    ///
    /// Every pair of drives must share a motion type.
    fn mechanical_modification(&self, snap: &LoopSnapshot) -> ControlResult<MatrixSeries> {
        let plant = self.plant()?;
        let drives = snap.registry(crate::signal::Axis::Drive);
        let mut mech = MatrixSeries::zeros(drives.len(), drives.len(), snap.nbins());
        for (i, drive_to) in drives.iter().enumerate() {
            let (base_to, motion_to) = split_drive_key(drive_to)?;
            for (j, drive_from) in drives.iter().enumerate() {
                let (base_from, motion_from) = split_drive_key(drive_from)?;
                if motion_to != motion_from {
                    return Err(ControlError::MotionMismatch {
                        drive_to: drive_to.to_string(),
                        drive_from: drive_from.to_string(),
                        to: motion_to,
                        from: motion_from,
                    });
                }
                let tf = plant.mechanical_modification(base_to, base_from, motion_to)?;
                mech.set_entry(i, j, &tf)?;
            }
        }
        tracing::debug!(drives = drives.len(), "mechanical modification tensor");
        Ok(mech)
    }

    /// Drive × drive beam spot motion on the optic of the row drive.
    fn beam_spot_motion(&self, snap: &LoopSnapshot) -> ControlResult<MatrixSeries> {
        let plant = self.plant()?;
        let face = self.spot_face();
        let drives = snap.registry(crate::signal::Axis::Drive);
        let mut spot = MatrixSeries::zeros(drives.len(), drives.len(), snap.nbins());
        for (si, spot_drive) in drives.iter().enumerate() {
            let (optic, _) = split_drive_key(spot_drive)?;
            for (di, drive) in drives.iter().enumerate() {
                let (base, motion) = split_drive_key(drive)?;
                let tf = plant.beam_spot_motion(optic, face, base, motion)?;
                spot.set_entry(si, di, &tf)?;
            }
        }
        tracing::debug!(drives = drives.len(), face, "beam spot motion tensor");
        Ok(spot)
    }
}

/// `CL(to) · path(from -> to)`, with calibration entering at the drives
/// through the actuation matrix. The drive point itself sees the calibration
/// through one pass of the loop, `CL · OL · A`.
fn loop_tf(snap: &LoopSnapshot, to: InjectionPoint, from: SignalKind) -> ControlResult<MatrixSeries> {
    let m = snap.matrices();
    let mut factors = vec![Factor::Series(snap.cltf(to))];
    match from {
        SignalKind::Cal => {
            if to == InjectionPoint::Drive {
                factors.push(Factor::Series(snap.oltf(InjectionPoint::Drive)));
            }
            factors.extend(m.path(InjectionPoint::Drive, to));
            factors.push(Factor::Static(m.actuation()));
        }
        _ => {
            let start = from
                .injection_point()
                .ok_or(ControlError::UnsupportedPath { to: to.into(), from })?;
            factors.extend(m.path(start, to));
        }
    }
    contract(&factors, snap.nbins())
}

fn point_indices(snap: &LoopSnapshot, point: InjectionPoint, to: &str, from: &str) -> ControlResult<(usize, usize)> {
    let axis = point.axis();
    Ok((snap.index_of(axis, to)?, snap.index_of(axis, from)?))
}

fn accumulate(psd: &mut DVector<f64>, power: &DVector<f64>, asd: &Asd) -> ControlResult<()> {
    let asd = asd.to_vec(psd.len())?;
    for ((p, w), a) in psd.iter_mut().zip(power.iter()).zip(asd) {
        *p += w * a * a;
    }
    Ok(())
}
