//! Tabulated plant: precomputed responses looked up by name.

use std::collections::BTreeMap;

use ic_core::{Asd, Complex64, FrequencyAxis, MotionType};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::{PlantError, PlantResult};
use crate::plant::Plant;

/// What a tabulated plant answers for a probe/drive pair it has no entry for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Report [`PlantError::MissingTransferFunction`].
    #[default]
    Error,
    /// Treat the pair as uncoupled.
    Zero,
}

type TfKey = (String, String, MotionType);
type SpotKey = (String, String, String, MotionType);

/// In-memory plant built from precomputed frequency responses.
///
/// Serializes as [`TabulatedPlantData`], a flat list of entries, so plants
/// exported by a simulator wrapper can be read back with serde.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TabulatedPlantData", into = "TabulatedPlantData")]
pub struct TabulatedPlant {
    axis: FrequencyAxis,
    missing: MissingPolicy,
    /// (probe, drive, motion) -> response
    tfs: BTreeMap<TfKey, DVector<Complex64>>,
    noise: BTreeMap<String, Asd>,
    /// (drive_to, drive_from, motion) -> response
    mech: BTreeMap<TfKey, DVector<Complex64>>,
    /// (optic, face, drive, motion) -> response
    spot: BTreeMap<SpotKey, DVector<Complex64>>,
}

impl TabulatedPlant {
    /// Create an empty plant on `axis`.
    pub fn new(axis: FrequencyAxis) -> Self {
        Self {
            axis,
            missing: MissingPolicy::Error,
            tfs: BTreeMap::new(),
            noise: BTreeMap::new(),
            mech: BTreeMap::new(),
            spot: BTreeMap::new(),
        }
    }

    /// Set the policy for pairs without a transfer function.
    pub fn with_missing_policy(mut self, missing: MissingPolicy) -> Self {
        self.missing = missing;
        self
    }

    pub fn missing_policy(&self) -> MissingPolicy {
        self.missing
    }

    /// Store the response of `probe` to `drive` in `motion`.
    pub fn insert_transfer_function(
        &mut self,
        probe: &str,
        drive: &str,
        motion: MotionType,
        response: Vec<Complex64>,
    ) -> PlantResult<()> {
        let response = self.checked(response, || format!("{probe} <- {drive}.{motion}"))?;
        self.tfs
            .insert((probe.to_string(), drive.to_string(), motion), response);
        Ok(())
    }

    /// Builder form of [`Self::insert_transfer_function`].
    pub fn with_transfer_function(
        mut self,
        probe: &str,
        drive: &str,
        motion: MotionType,
        response: Vec<Complex64>,
    ) -> PlantResult<Self> {
        self.insert_transfer_function(probe, drive, motion, response)?;
        Ok(self)
    }

    pub fn insert_quantum_noise(&mut self, probe: &str, asd: Asd) -> PlantResult<()> {
        asd.check_len(self.axis.len())?;
        self.noise.insert(probe.to_string(), asd);
        Ok(())
    }

    pub fn with_quantum_noise(mut self, probe: &str, asd: Asd) -> PlantResult<Self> {
        self.insert_quantum_noise(probe, asd)?;
        Ok(self)
    }

    pub fn insert_mechanical_modification(
        &mut self,
        drive_to: &str,
        drive_from: &str,
        motion: MotionType,
        response: Vec<Complex64>,
    ) -> PlantResult<()> {
        let response = self.checked(response, || {
            format!("mechanical modification {drive_to} <- {drive_from}.{motion}")
        })?;
        self.mech.insert(
            (drive_to.to_string(), drive_from.to_string(), motion),
            response,
        );
        Ok(())
    }

    pub fn with_mechanical_modification(
        mut self,
        drive_to: &str,
        drive_from: &str,
        motion: MotionType,
        response: Vec<Complex64>,
    ) -> PlantResult<Self> {
        self.insert_mechanical_modification(drive_to, drive_from, motion, response)?;
        Ok(self)
    }

    pub fn insert_beam_spot_motion(
        &mut self,
        optic: &str,
        face: &str,
        drive: &str,
        motion: MotionType,
        response: Vec<Complex64>,
    ) -> PlantResult<()> {
        let response = self.checked(response, || {
            format!("beam spot {optic}.{face} <- {drive}.{motion}")
        })?;
        self.spot.insert(
            (
                optic.to_string(),
                face.to_string(),
                drive.to_string(),
                motion,
            ),
            response,
        );
        Ok(())
    }

    pub fn with_beam_spot_motion(
        mut self,
        optic: &str,
        face: &str,
        drive: &str,
        motion: MotionType,
        response: Vec<Complex64>,
    ) -> PlantResult<Self> {
        self.insert_beam_spot_motion(optic, face, drive, motion, response)?;
        Ok(self)
    }

    fn checked(
        &self,
        response: Vec<Complex64>,
        what: impl FnOnce() -> String,
    ) -> PlantResult<DVector<Complex64>> {
        if response.len() != self.axis.len() {
            return Err(PlantError::LengthMismatch {
                what: what(),
                expected: self.axis.len(),
                actual: response.len(),
            });
        }
        Ok(DVector::from_vec(response))
    }
}

impl Plant for TabulatedPlant {
    fn frequencies(&self) -> &FrequencyAxis {
        &self.axis
    }

    fn transfer_function(
        &self,
        probe: &str,
        drive: &str,
        motion: MotionType,
    ) -> PlantResult<DVector<Complex64>> {
        let key = (probe.to_string(), drive.to_string(), motion);
        match (self.tfs.get(&key), self.missing) {
            (Some(tf), _) => Ok(tf.clone()),
            (None, MissingPolicy::Zero) => Ok(DVector::zeros(self.axis.len())),
            (None, MissingPolicy::Error) => Err(PlantError::MissingTransferFunction {
                probe: key.0,
                drive: key.1,
                motion,
            }),
        }
    }

    fn quantum_noise(&self, probe: &str) -> PlantResult<Asd> {
        self.noise
            .get(probe)
            .cloned()
            .ok_or_else(|| PlantError::MissingNoise {
                probe: probe.to_string(),
            })
    }

    fn mechanical_modification(
        &self,
        drive_to: &str,
        drive_from: &str,
        motion: MotionType,
    ) -> PlantResult<DVector<Complex64>> {
        let key = (drive_to.to_string(), drive_from.to_string(), motion);
        self.mech
            .get(&key)
            .cloned()
            .ok_or(PlantError::MissingMechanicalModification {
                drive_to: key.0,
                drive_from: key.1,
                motion,
            })
    }

    fn beam_spot_motion(
        &self,
        optic: &str,
        face: &str,
        drive: &str,
        motion: MotionType,
    ) -> PlantResult<DVector<Complex64>> {
        let key = (
            optic.to_string(),
            face.to_string(),
            drive.to_string(),
            motion,
        );
        self.spot
            .get(&key)
            .cloned()
            .ok_or(PlantError::MissingBeamSpotMotion {
                optic: key.0,
                face: key.1,
                drive: key.2,
                motion,
            })
    }
}

/// Flat serialized form of a [`TabulatedPlant`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabulatedPlantData {
    pub frequencies: FrequencyAxis,
    #[serde(default)]
    pub missing: MissingPolicy,
    #[serde(default)]
    pub transfer_functions: Vec<TransferFunctionEntry>,
    #[serde(default)]
    pub quantum_noise: Vec<NoiseEntry>,
    #[serde(default)]
    pub mechanical_modifications: Vec<MechanicalModificationEntry>,
    #[serde(default)]
    pub beam_spot_motion: Vec<BeamSpotEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferFunctionEntry {
    pub probe: String,
    pub drive: String,
    #[serde(default)]
    pub motion: MotionType,
    pub response: Vec<Complex64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseEntry {
    pub probe: String,
    pub asd: Asd,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MechanicalModificationEntry {
    pub drive_to: String,
    pub drive_from: String,
    #[serde(default)]
    pub motion: MotionType,
    pub response: Vec<Complex64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamSpotEntry {
    pub optic: String,
    pub face: String,
    pub drive: String,
    #[serde(default)]
    pub motion: MotionType,
    pub response: Vec<Complex64>,
}

impl TryFrom<TabulatedPlantData> for TabulatedPlant {
    type Error = PlantError;

    fn try_from(data: TabulatedPlantData) -> PlantResult<Self> {
        let mut plant = TabulatedPlant::new(data.frequencies).with_missing_policy(data.missing);
        for e in data.transfer_functions {
            plant.insert_transfer_function(&e.probe, &e.drive, e.motion, e.response)?;
        }
        for e in data.quantum_noise {
            plant.insert_quantum_noise(&e.probe, e.asd)?;
        }
        for e in data.mechanical_modifications {
            plant.insert_mechanical_modification(&e.drive_to, &e.drive_from, e.motion, e.response)?;
        }
        for e in data.beam_spot_motion {
            plant.insert_beam_spot_motion(&e.optic, &e.face, &e.drive, e.motion, e.response)?;
        }
        Ok(plant)
    }
}

impl From<TabulatedPlant> for TabulatedPlantData {
    fn from(plant: TabulatedPlant) -> Self {
        Self {
            frequencies: plant.axis,
            missing: plant.missing,
            transfer_functions: plant
                .tfs
                .into_iter()
                .map(|((probe, drive, motion), r)| TransferFunctionEntry {
                    probe,
                    drive,
                    motion,
                    response: r.iter().copied().collect(),
                })
                .collect(),
            quantum_noise: plant
                .noise
                .into_iter()
                .map(|(probe, asd)| NoiseEntry { probe, asd })
                .collect(),
            mechanical_modifications: plant
                .mech
                .into_iter()
                .map(|((drive_to, drive_from, motion), r)| MechanicalModificationEntry {
                    drive_to,
                    drive_from,
                    motion,
                    response: r.iter().copied().collect(),
                })
                .collect(),
            beam_spot_motion: plant
                .spot
                .into_iter()
                .map(|((optic, face, drive, motion), r)| BeamSpotEntry {
                    optic,
                    face,
                    drive,
                    motion,
                    response: r.iter().copied().collect(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis() -> FrequencyAxis {
        FrequencyAxis::new(vec![1.0, 10.0]).unwrap()
    }

    fn c(re: f64) -> Complex64 {
        Complex64::new(re, 0.0)
    }

    #[test]
    fn lookup_by_name_and_motion() {
        let plant = TabulatedPlant::new(axis())
            .with_transfer_function("REFL_I", "EX", MotionType::Pos, vec![c(1.0), c(2.0)])
            .unwrap();
        let tf = plant
            .transfer_function("REFL_I", "EX", MotionType::Pos)
            .unwrap();
        assert_eq!(tf[1], c(2.0));
        assert!(matches!(
            plant.transfer_function("REFL_I", "EX", MotionType::Pitch),
            Err(PlantError::MissingTransferFunction { .. })
        ));
    }

    #[test]
    fn zero_fill_policy() {
        let plant = TabulatedPlant::new(axis()).with_missing_policy(MissingPolicy::Zero);
        let tf = plant.transfer_function("AS", "EY", MotionType::Pos).unwrap();
        assert_eq!(tf.len(), 2);
        assert!(tf.iter().all(|v| *v == c(0.0)));
    }

    #[test]
    fn rejects_wrong_length() {
        let err = TabulatedPlant::new(axis())
            .with_transfer_function("AS", "EX", MotionType::Pos, vec![c(1.0)])
            .unwrap_err();
        assert!(matches!(
            err,
            PlantError::LengthMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
        assert!(
            TabulatedPlant::new(axis())
                .with_quantum_noise("AS", Asd::Spectrum(vec![1.0; 3]))
                .is_err()
        );
    }

    #[test]
    fn optional_queries() {
        let plant = TabulatedPlant::new(axis())
            .with_quantum_noise("AS", Asd::Flat(1e-9))
            .unwrap()
            .with_mechanical_modification("EX", "IX", MotionType::Pitch, vec![c(1.0); 2])
            .unwrap()
            .with_beam_spot_motion("EX", "fr", "IX", MotionType::Pitch, vec![c(0.5); 2])
            .unwrap();
        assert_eq!(plant.quantum_noise("AS").unwrap(), Asd::Flat(1e-9));
        assert!(plant.quantum_noise("REFL").is_err());
        assert!(
            plant
                .mechanical_modification("EX", "IX", MotionType::Pitch)
                .is_ok()
        );
        assert!(
            plant
                .beam_spot_motion("EX", "bk", "IX", MotionType::Pitch)
                .is_err()
        );
    }

    #[test]
    fn json_round_trip_keeps_entries() {
        let plant = TabulatedPlant::new(axis())
            .with_transfer_function(
                "AS",
                "EX",
                MotionType::Pos,
                vec![Complex64::new(1.0, -1.0), c(0.0)],
            )
            .unwrap()
            .with_quantum_noise("AS", Asd::Spectrum(vec![1.0, 2.0]))
            .unwrap();
        let json = serde_json::to_string(&plant).unwrap();
        let back: TabulatedPlant = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plant);
    }
}
