//! Drive motion types.
//!
//! A drive is addressed as `<base>.<motion>`, e.g. `EX.pos` or `IX.pitch`,
//! so the same optic can carry one actuation channel per motion type.

use core::fmt;
use core::str::FromStr;

use crate::error::{IcError, IcResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MotionType {
    /// Longitudinal position.
    #[default]
    Pos,
    Pitch,
    Yaw,
    /// Non-mechanical drive such as a modulator input.
    Drive,
}

impl MotionType {
    pub const ALL: [MotionType; 4] = [Self::Pos, Self::Pitch, Self::Yaw, Self::Drive];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pos => "pos",
            Self::Pitch => "pitch",
            Self::Yaw => "yaw",
            Self::Drive => "drive",
        }
    }
}

impl fmt::Display for MotionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MotionType {
    type Err = IcError;

    fn from_str(s: &str) -> IcResult<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| IcError::NotFound {
                what: "motion type",
                name: s.to_string(),
            })
    }
}

/// Full drive key `<base>.<motion>`.
pub fn drive_key(base: &str, motion: MotionType) -> String {
    format!("{base}.{motion}")
}

/// Split a drive key into its base name and motion type.
///
/// The motion is the text after the last `.`; the base keeps any earlier dots.
pub fn split_drive_key(key: &str) -> IcResult<(&str, MotionType)> {
    let (base, motion) = key.rsplit_once('.').ok_or_else(|| IcError::NotFound {
        what: "motion suffix in drive",
        name: key.to_string(),
    })?;
    Ok((base, motion.parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_round_trip() {
        for motion in MotionType::ALL {
            let key = drive_key("EX", motion);
            assert_eq!(split_drive_key(&key).unwrap(), ("EX", motion));
        }
    }

    #[test]
    fn base_keeps_inner_dots() {
        assert_eq!(
            split_drive_key("IX.bk.pitch").unwrap(),
            ("IX.bk", MotionType::Pitch)
        );
    }

    #[test]
    fn bad_keys() {
        assert!(split_drive_key("EX").is_err());
        assert!(split_drive_key("EX.roll").is_err());
    }
}
