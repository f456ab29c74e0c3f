//! Loop description schema.

use std::fmt;

use ic_core::MotionType;
use ic_controls::RootUnits;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const LATEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectDef {
    pub version: u32,
    pub name: String,
    /// Optic face used for beam spot queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spot_face: Option<String>,
    #[serde(default)]
    pub dofs: Vec<DofDef>,
    #[serde(default)]
    pub filters: Vec<LoopFilterDef>,
    #[serde(default)]
    pub compensators: Vec<DriveFilterDef>,
    #[serde(default)]
    pub responses: Vec<DriveFilterDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DofDef {
    pub name: String,
    pub probes: CoefficientsDef,
    /// Drive base names; the motion suffix is added from `motion`.
    pub drives: CoefficientsDef,
    #[serde(default)]
    pub motion: MotionType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoopFilterDef {
    pub to: String,
    pub from: String,
    pub filter: FilterDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriveFilterDef {
    pub drive: String,
    #[serde(default)]
    pub motion: MotionType,
    pub filter: FilterDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterDef {
    Gain {
        value: f64,
    },
    Zpk {
        #[serde(default)]
        zeros: Vec<RootDef>,
        #[serde(default)]
        poles: Vec<RootDef>,
        gain: f64,
        #[serde(default)]
        units: RootUnits,
    },
    ZpkAt {
        #[serde(default)]
        zeros: Vec<RootDef>,
        #[serde(default)]
        poles: Vec<RootDef>,
        target_gain: f64,
        reference_frequency: f64,
        #[serde(default)]
        units: RootUnits,
    },
    Cascade {
        stages: Vec<FilterDef>,
    },
}

/// A zero or pole: a real number, a complex number, or a resonance that
/// expands to a complex pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RootDef {
    Real(f64),
    Complex { re: f64, im: f64 },
    Resonance { resonance: ResonanceDef },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ResonanceDef {
    pub f0: f64,
    pub q: f64,
}

/// Name -> coefficient map that keeps file order.
///
/// Accepts either a single name (coefficient 1) or a mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoefficientsDef(pub Vec<(String, f64)>);

impl CoefficientsDef {
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(n, c)| (n.as_str(), *c))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for CoefficientsDef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, coeff) in &self.0 {
            map.serialize_entry(name, coeff)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CoefficientsDef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CoefficientsVisitor;

        impl<'de> Visitor<'de> for CoefficientsVisitor {
            type Value = CoefficientsDef;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a name or a map of names to coefficients")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(CoefficientsDef(vec![(v.to_string(), 1.0)]))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, f64)> = Vec::new();
                while let Some((name, coeff)) = access.next_entry::<String, f64>()? {
                    if entries.iter().any(|(n, _)| *n == name) {
                        return Err(serde::de::Error::custom(format!(
                            "duplicate coefficient for {name}"
                        )));
                    }
                    entries.push((name, coeff));
                }
                Ok(CoefficientsDef(entries))
            }
        }

        deserializer.deserialize_any(CoefficientsVisitor)
    }
}
