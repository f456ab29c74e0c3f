//! Loop description validation.

use std::collections::HashSet;

use crate::schema::{
    CoefficientsDef, DriveFilterDef, FilterDef, LATEST_VERSION, ProjectDef, RootDef,
};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_project(project: &ProjectDef) -> Result<(), ValidationError> {
    if project.version == 0 || project.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    let mut dof_names = HashSet::new();
    for dof in &project.dofs {
        if !dof_names.insert(dof.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: dof.name.clone(),
                context: "dofs".to_string(),
            });
        }
        validate_coefficients(&dof.probes, &format!("dof '{}' probes", dof.name))?;
        validate_coefficients(&dof.drives, &format!("dof '{}' drives", dof.name))?;
    }

    for (i, f) in project.filters.iter().enumerate() {
        for name in [&f.to, &f.from] {
            if !dof_names.contains(name.as_str()) {
                return Err(ValidationError::MissingReference {
                    id: name.clone(),
                    context: format!("filters[{i}]"),
                });
            }
        }
        validate_filter(&f.filter, &format!("filter {} <- {}", f.to, f.from))?;
    }

    validate_drive_filters(&project.compensators, "compensators")?;
    validate_drive_filters(&project.responses, "responses")?;

    Ok(())
}

fn validate_coefficients(coeffs: &CoefficientsDef, field: &str) -> Result<(), ValidationError> {
    if coeffs.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: "{}".to_string(),
            reason: "at least one entry is required".to_string(),
        });
    }
    for (name, c) in coeffs.iter() {
        finite(c, &format!("{field} '{name}'"))?;
    }
    Ok(())
}

fn validate_drive_filters(entries: &[DriveFilterDef], context: &str) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for e in entries {
        let key = ic_core::drive_key(&e.drive, e.motion);
        validate_filter(&e.filter, &format!("{context} '{key}'"))?;
        if !seen.insert(key.clone()) {
            return Err(ValidationError::DuplicateId {
                id: key,
                context: context.to_string(),
            });
        }
    }
    Ok(())
}

fn validate_filter(filter: &FilterDef, field: &str) -> Result<(), ValidationError> {
    match filter {
        FilterDef::Gain { value } => finite(*value, &format!("{field} gain")),
        FilterDef::Zpk {
            zeros, poles, gain, ..
        } => {
            finite(*gain, &format!("{field} gain"))?;
            validate_roots(zeros, poles, field)
        }
        FilterDef::ZpkAt {
            zeros,
            poles,
            target_gain,
            reference_frequency,
            ..
        } => {
            finite(*target_gain, &format!("{field} target_gain"))?;
            finite(*reference_frequency, &format!("{field} reference_frequency"))?;
            validate_roots(zeros, poles, field)
        }
        FilterDef::Cascade { stages } => {
            for (i, stage) in stages.iter().enumerate() {
                validate_filter(stage, &format!("{field} stage {i}"))?;
            }
            Ok(())
        }
    }
}

fn validate_roots(zeros: &[RootDef], poles: &[RootDef], field: &str) -> Result<(), ValidationError> {
    for root in zeros.iter().chain(poles) {
        match *root {
            RootDef::Real(r) => finite(r, &format!("{field} root"))?,
            RootDef::Complex { re, im } => {
                finite(re, &format!("{field} root re"))?;
                finite(im, &format!("{field} root im"))?;
            }
            RootDef::Resonance { resonance } => {
                finite(resonance.f0, &format!("{field} resonance f0"))?;
                if !resonance.q.is_finite() || resonance.q <= 0.0 {
                    return Err(ValidationError::InvalidValue {
                        field: format!("{field} resonance q"),
                        value: resonance.q.to_string(),
                        reason: "must be positive and finite".to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}

fn finite(v: f64, field: &str) -> Result<(), ValidationError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: v.to_string(),
            reason: "must be finite".to_string(),
        })
    }
}
