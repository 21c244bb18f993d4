//! Load limits around startups and shutdowns.
//!
//! Fast dynamics (no ramp steps) cap the load of the startup step at
//! `SU_load · size` and the load of the step before a shutdown at
//! `SD_load · size`. Slow dynamics replace the performance curve with a
//! per-step choice between off, the `k`-th startup step, on and the `k`-th
//! shutdown step. Trajectory loads rise linearly to the minimum part load on
//! the way up and fall from it on the way down:
//!
//! ```text
//! SU_trajectory[k] = min_part_load · k / (SU_time + 1)                k = 1..SU_time
//! SD_trajectory[k] = min_part_load · (SD_time + 1 − k) / (SD_time + 1)  k = 1..SD_time
//! ```

use super::StateIndicators;
use crate::performance::{nominal_relations, off_constraints, outputs_off, relation_input};
use crate::record_warning;
use ehub_core::disjunction::{Disjunction, Mode};
use ehub_core::technology::{DynamicsParams, TechnologyModel, TechnologySpec};
use ehub_core::{
    Diagnostics, EhubError, EhubResult, LinearConstraint, TechnologyBlock, TimeStep,
};
use tracing::debug;

/// Startup and shutdown load trajectories as fractions of size.
pub fn trajectories(dynamics: &DynamicsParams, min_part_load: f64) -> (Vec<f64>, Vec<f64>) {
    let su = dynamics.su_time;
    let sd = dynamics.sd_time;
    let startup = (1..=su)
        .map(|k| min_part_load * k as f64 / (su + 1) as f64)
        .collect();
    let shutdown = (1..=sd)
        .map(|k| min_part_load * (sd + 1 - k) as f64 / (sd + 1) as f64)
        .collect();
    (startup, shutdown)
}

pub fn add_fast_dynamics(
    block: &mut TechnologyBlock,
    spec: &TechnologySpec,
    dynamics: &DynamicsParams,
    states: &StateIndicators,
) -> EhubResult<()> {
    let size = block.size();
    let time = block.time().clone();
    for t in time.steps() {
        let y = states.startup(t);
        let startup_load = LinearConstraint::le(
            format!("startup_load[{}]", t),
            relation_input(block, spec, t)?,
            dynamics.su_load * size,
        );
        block.add_disjunction(
            Disjunction::new(format!("startup_load[{}]", t))
                .with(
                    Mode::NoStartup,
                    vec![LinearConstraint::eq(format!("no_startup[{}]", t), y, 0.0)],
                )
                .with(
                    Mode::Startup,
                    vec![
                        LinearConstraint::eq(format!("startup[{}]", t), y, 1.0),
                        startup_load,
                    ],
                ),
        );

        let z = states.shutdown(t);
        let mut shutdown = vec![LinearConstraint::eq(format!("shutdown[{}]", t), z, 1.0)];
        // step 1 has no predecessor to limit
        if let Some(prev) = time.predecessor(t) {
            shutdown.push(LinearConstraint::le(
                format!("shutdown_load[{}]", t),
                relation_input(block, spec, prev)?,
                dynamics.sd_load * size,
            ));
        }
        block.add_disjunction(
            Disjunction::new(format!("shutdown_load[{}]", t))
                .with(
                    Mode::NoShutdown,
                    vec![LinearConstraint::eq(format!("no_shutdown[{}]", t), z, 0.0)],
                )
                .with(Mode::Shutdown, shutdown),
        );
    }
    debug!(
        technology = %spec.name,
        su_load = dynamics.su_load,
        sd_load = dynamics.sd_load,
        "added fast startup/shutdown dynamics"
    );
    Ok(())
}

/// `|input[t] − input[t−1]| ≤ ramping_rate · size`, without wrap-around.
pub fn add_ramping_limit(
    block: &mut TechnologyBlock,
    spec: &TechnologySpec,
    dynamics: &DynamicsParams,
) -> EhubResult<()> {
    if dynamics.ramping_rate <= 0.0 {
        return Ok(());
    }
    let size = block.size();
    let time = block.time().clone();
    for t in time.steps() {
        let Some(prev) = time.predecessor(t) else {
            continue;
        };
        let change = relation_input(block, spec, t)? - relation_input(block, spec, prev)?;
        block.add_constraint(LinearConstraint::le(
            format!("ramp_up[{}]", t),
            change.clone(),
            dynamics.ramping_rate * size,
        ));
        block.add_constraint(LinearConstraint::ge(
            format!("ramp_down[{}]", t),
            change,
            -dynamics.ramping_rate * size,
        ));
    }
    Ok(())
}

/// Replace the performance curve by the trajectory disjunction.
pub fn add_slow_dynamics(
    block: &mut TechnologyBlock,
    spec: &TechnologySpec,
    dynamics: &DynamicsParams,
    states: &StateIndicators,
    diagnostics: &mut Diagnostics,
) -> EhubResult<()> {
    let name = spec.name.as_str();
    let time = block.time().clone();
    for (kind, length) in [("startup", dynamics.su_time), ("shutdown", dynamics.sd_time)] {
        if length > 0 && length >= time.len() {
            return Err(EhubError::TrajectoryExceedsHorizon {
                technology: name.to_string(),
                kind,
                length,
                horizon: time.len(),
            });
        }
    }
    if spec.fit.segment_count() != 1 {
        return Err(EhubError::config(
            name,
            "startup/shutdown trajectories require a single-segment performance fit",
        ));
    }

    let min_part_load = match spec.fit.min_part_load {
        Some(mpl) => mpl,
        None => {
            record_warning(
                diagnostics,
                "defaults",
                name,
                "min_part_load not set, trajectories start from zero load",
            );
            0.0
        }
    };
    let (su_trajectory, sd_trajectory) = trajectories(dynamics, min_part_load);
    let rated = spec.fit.rated_power;
    let size = block.size();
    let su_time = dynamics.su_time as isize;
    let sd_time = dynamics.sd_time as isize;

    for t in time.steps() {
        let now = t.value() as isize;
        let x = states.on(t);

        // off: no startup may be scheduled within the next SU_time steps
        // and no shutdown may have happened within the last SD_time steps
        let mut off = vec![LinearConstraint::eq(format!("state[{}]", t), x, 0.0)];
        off.extend(off_constraints(block, t));
        for tau in time.window(now + 1, now + su_time) {
            off.push(LinearConstraint::eq(
                format!("no_startup[{},{}]", t, tau),
                states.startup(tau),
                0.0,
            ));
        }
        for tau in time.window(now - sd_time + 1, now) {
            off.push(LinearConstraint::eq(
                format!("no_shutdown[{},{}]", t, tau),
                states.shutdown(tau),
                0.0,
            ));
        }
        let mut disjunction = Disjunction::new(format!("trajectory[{}]", t)).with(Mode::Off, off);

        for (k, load) in su_trajectory.iter().enumerate().map(|(i, l)| (i + 1, *l)) {
            let mut ramp = vec![LinearConstraint::eq(format!("state[{}]", t), x, 0.0)];
            if let Some(event) = time.shift(t, su_time - k as isize + 1) {
                ramp.push(LinearConstraint::eq(
                    format!("startup_event[{},{}]", t, event),
                    states.startup(event),
                    1.0,
                ));
            }
            ramp.extend(trajectory_load(block, spec, t, load, rated)?);
            disjunction.push(Mode::StartingUp(k), ramp);
        }

        let mut on = vec![LinearConstraint::eq(format!("state[{}]", t), x, 1.0)];
        on.extend(nominal_relations(block, spec, t, 0, rated)?);
        on.push(LinearConstraint::ge(
            format!("min_part_load[{}]", t),
            relation_input(block, spec, t)?,
            (min_part_load * rated) * size,
        ));
        disjunction.push(Mode::On, on);

        for (k, load) in sd_trajectory.iter().enumerate().map(|(i, l)| (i + 1, *l)) {
            let mut ramp = vec![LinearConstraint::eq(format!("state[{}]", t), x, 0.0)];
            if let Some(event) = time.shift(t, 1 - k as isize) {
                ramp.push(LinearConstraint::eq(
                    format!("shutdown_event[{},{}]", t, event),
                    states.shutdown(event),
                    1.0,
                ));
            }
            ramp.extend(trajectory_load(block, spec, t, load, rated)?);
            disjunction.push(Mode::ShuttingDown(k), ramp);
        }

        block.add_disjunction(disjunction);
    }
    debug!(
        technology = %name,
        su_time = dynamics.su_time,
        sd_time = dynamics.sd_time,
        "added startup/shutdown trajectories"
    );
    Ok(())
}

/// Load of a ramp step. CONV1/CONV2 run at exactly the trajectory load and
/// deliver nothing; CONV3 is capped by it and keeps its nominal relation.
fn trajectory_load(
    block: &TechnologyBlock,
    spec: &TechnologySpec,
    t: TimeStep,
    load: f64,
    rated: f64,
) -> EhubResult<Vec<LinearConstraint>> {
    let input = relation_input(block, spec, t)?;
    let size = block.size();
    let name = format!("trajectory_load[{}]", t);
    if spec.technology_model == TechnologyModel::Conv3 {
        let mut constraints = vec![LinearConstraint::le(name, input, load * size)];
        constraints.extend(nominal_relations(block, spec, t, 0, rated)?);
        Ok(constraints)
    } else {
        let mut constraints = vec![LinearConstraint::eq(name, input, load * size)];
        constraints.extend(outputs_off(block, t));
        Ok(constraints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trajectories_mirror() {
        let dynamics = DynamicsParams {
            su_time: 3,
            sd_time: 3,
            ..DynamicsParams::default()
        };
        let (su, sd) = trajectories(&dynamics, 0.4);
        let expected_su = [0.1, 0.2, 0.3];
        for (a, b) in su.iter().zip(expected_su) {
            assert!((a - b).abs() < 1e-12);
        }
        let reversed: Vec<f64> = su.iter().rev().copied().collect();
        for (a, b) in sd.iter().zip(reversed) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_empty_trajectories() {
        let (su, sd) = trajectories(&DynamicsParams::default(), 0.5);
        assert!(su.is_empty() && sd.is_empty());
    }
}
