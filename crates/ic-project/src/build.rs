//! Turn a loop description into a control system.

use ic_controls::{Complex64, ControlResult, ControlSystem, Filter, RootUnits, SharedPlant, res_roots};

use crate::ProjectResult;
use crate::schema::{FilterDef, ProjectDef, RootDef};
use crate::validate::validate_project;

impl RootDef {
    /// Roots in the units of the enclosing filter. A resonance yields two.
    pub fn expand(&self, units: RootUnits) -> ControlResult<Vec<Complex64>> {
        Ok(match *self {
            RootDef::Real(r) => vec![Complex64::new(r, 0.0)],
            RootDef::Complex { re, im } => vec![Complex64::new(re, im)],
            RootDef::Resonance { resonance } => {
                let (r1, r2) = res_roots(resonance.f0, resonance.q, units)?;
                vec![r1, r2]
            }
        })
    }
}

fn expand_all(roots: &[RootDef], units: RootUnits) -> ControlResult<Vec<Complex64>> {
    let mut out = Vec::with_capacity(roots.len());
    for root in roots {
        out.extend(root.expand(units)?);
    }
    Ok(out)
}

impl FilterDef {
    pub fn build(&self) -> ControlResult<Filter> {
        match self {
            FilterDef::Gain { value } => Filter::gain(*value),
            FilterDef::Zpk {
                zeros,
                poles,
                gain,
                units,
            } => Filter::zpk(
                expand_all(zeros, *units)?,
                expand_all(poles, *units)?,
                *gain,
                *units,
            ),
            FilterDef::ZpkAt {
                zeros,
                poles,
                target_gain,
                reference_frequency,
                units,
            } => Filter::zpk_at(
                expand_all(zeros, *units)?,
                expand_all(poles, *units)?,
                *target_gain,
                *reference_frequency,
                *units,
            ),
            FilterDef::Cascade { stages } => {
                let stages = stages
                    .iter()
                    .map(FilterDef::build)
                    .collect::<ControlResult<Vec<_>>>()?;
                Ok(Filter::cascade(stages))
            }
        }
    }
}

/// Validate `project` and register it on a fresh control system bound to
/// `plant`. The system is returned untickled.
pub fn build_control_system(project: &ProjectDef, plant: SharedPlant) -> ProjectResult<ControlSystem> {
    validate_project(project)?;

    let mut cs = ControlSystem::new();
    if let Some(face) = &project.spot_face {
        cs = cs.with_spot_face(face.clone());
    }
    cs.bind_plant(plant)?;

    for dof in &project.dofs {
        cs.add_dof(
            dof.name.clone(),
            dof.probes.0.clone(),
            dof.drives.0.clone(),
            dof.motion,
        )?;
    }
    for f in &project.filters {
        cs.add_filter(f.to.clone(), f.from.clone(), f.filter.build()?);
    }
    for c in &project.compensators {
        cs.add_compensator(&c.drive, c.motion, c.filter.build()?)?;
    }
    for r in &project.responses {
        cs.set_response(&r.drive, r.motion, r.filter.build()?)?;
    }

    tracing::info!(
        project = %project.name,
        dofs = project.dofs.len(),
        filters = project.filters.len(),
        "control system built"
    );
    Ok(cs)
}
