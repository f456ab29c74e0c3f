//! The plant capability consumed by control systems.

use ic_core::{Asd, Complex64, FrequencyAxis, MotionType};
use nalgebra::DVector;

use crate::error::{PlantError, PlantResult};

/// Frequency-domain responses of an optomechanical plant.
///
/// Every vector returned is sampled on [`Plant::frequencies`]. Only
/// `frequencies` and `transfer_function` are needed to close loops; the
/// remaining queries back noise, position and beam spot projections and
/// default to [`PlantError::Unsupported`].
pub trait Plant {
    /// Analysis band shared by every response.
    fn frequencies(&self) -> &FrequencyAxis;

    /// Response of `probe` to a unit drive of `drive` in `motion`.
    fn transfer_function(
        &self,
        probe: &str,
        drive: &str,
        motion: MotionType,
    ) -> PlantResult<DVector<Complex64>>;

    /// Quantum noise ASD at `probe`.
    fn quantum_noise(&self, probe: &str) -> PlantResult<Asd> {
        let _ = probe;
        Err(PlantError::Unsupported {
            what: "quantum noise",
        })
    }

    /// Modification of the `drive_to` motion by radiation pressure when
    /// `drive_from` is driven.
    fn mechanical_modification(
        &self,
        drive_to: &str,
        drive_from: &str,
        motion: MotionType,
    ) -> PlantResult<DVector<Complex64>> {
        let _ = (drive_to, drive_from, motion);
        Err(PlantError::Unsupported {
            what: "mechanical modification",
        })
    }

    /// Beam spot motion on `face` of `optic` per unit drive.
    fn beam_spot_motion(
        &self,
        optic: &str,
        face: &str,
        drive: &str,
        motion: MotionType,
    ) -> PlantResult<DVector<Complex64>> {
        let _ = (optic, face, drive, motion);
        Err(PlantError::Unsupported {
            what: "beam spot motion",
        })
    }
}
