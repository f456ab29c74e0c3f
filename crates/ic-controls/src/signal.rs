//! Signal points of the feedback loop.
//!
//! The loop runs, in signal order,
//!
//! ```text
//! err --C--> ctrl --K·A--> comp --M--> drive --P--> sens --S--> err
//! ```
//!
//! where `S` is the sensing matrix, `P` the optical plant, `M` the drive
//! responses, `K` the compensators, `A` the actuation matrix and `C` the
//! controller. Each of the five points can be where the loop is opened
//! ([`InjectionPoint`]). Transfer function queries additionally accept the
//! calibration input and the position / beam spot outputs ([`SignalKind`]).

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Where the loop is broken to define the loop gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectionPoint {
    /// DOF error signals (after sensing).
    Err,
    /// DOF control signals (after the controller).
    Ctrl,
    /// Drive signals after the compensators.
    Comp,
    /// Drive signals after the actuator responses.
    Drive,
    /// Probe signals.
    Sens,
}

impl InjectionPoint {
    pub const ALL: [InjectionPoint; 5] = [
        Self::Err,
        Self::Ctrl,
        Self::Comp,
        Self::Drive,
        Self::Sens,
    ];

    /// Next point downstream in the loop.
    pub fn next(self) -> Self {
        match self {
            Self::Err => Self::Ctrl,
            Self::Ctrl => Self::Comp,
            Self::Comp => Self::Drive,
            Self::Drive => Self::Sens,
            Self::Sens => Self::Err,
        }
    }

    /// Axis the signals at this point are indexed by.
    pub fn axis(self) -> Axis {
        SignalKind::from(self).axis()
    }

    pub fn as_str(self) -> &'static str {
        SignalKind::from(self).as_str()
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for InjectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InjectionPoint {
    type Err = ControlError;

    fn from_str(s: &str) -> ControlResult<Self> {
        s.parse::<SignalKind>()?
            .injection_point()
            .ok_or_else(|| ControlError::UnknownSignal {
                name: s.to_string(),
            })
    }
}

/// Any signal a transfer function can start or end at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Err,
    Ctrl,
    Comp,
    Drive,
    Sens,
    /// DOF-referred calibration input entering at the drives, through `A`.
    Cal,
    /// Optic motion including radiation pressure modification.
    Pos,
    /// Beam spot motion on the optics.
    Spot,
}

impl SignalKind {
    pub const ALL: [SignalKind; 8] = [
        Self::Err,
        Self::Ctrl,
        Self::Comp,
        Self::Drive,
        Self::Sens,
        Self::Cal,
        Self::Pos,
        Self::Spot,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Err => "err",
            Self::Ctrl => "ctrl",
            Self::Comp => "comp",
            Self::Drive => "drive",
            Self::Sens => "sens",
            Self::Cal => "cal",
            Self::Pos => "pos",
            Self::Spot => "spot",
        }
    }

    /// The loop point this signal sits at, if it is one.
    pub fn injection_point(self) -> Option<InjectionPoint> {
        match self {
            Self::Err => Some(InjectionPoint::Err),
            Self::Ctrl => Some(InjectionPoint::Ctrl),
            Self::Comp => Some(InjectionPoint::Comp),
            Self::Drive => Some(InjectionPoint::Drive),
            Self::Sens => Some(InjectionPoint::Sens),
            Self::Cal | Self::Pos | Self::Spot => None,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Self::Err | Self::Ctrl | Self::Cal => Axis::Dof,
            Self::Comp | Self::Drive | Self::Pos | Self::Spot => Axis::Drive,
            Self::Sens => Axis::Probe,
        }
    }
}

impl From<InjectionPoint> for SignalKind {
    fn from(point: InjectionPoint) -> Self {
        match point {
            InjectionPoint::Err => Self::Err,
            InjectionPoint::Ctrl => Self::Ctrl,
            InjectionPoint::Comp => Self::Comp,
            InjectionPoint::Drive => Self::Drive,
            InjectionPoint::Sens => Self::Sens,
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalKind {
    type Err = ControlError;

    fn from_str(s: &str) -> ControlResult<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ControlError::UnknownSignal {
                name: s.to_string(),
            })
    }
}

/// Named collection a tensor axis runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Dof,
    Drive,
    Probe,
}
