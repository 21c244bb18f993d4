//! State indicators and their transition logic.
//!
//! ```text
//! x[t] − x[t−1] = y[t] − z[t]                       t ≥ 2
//! y[t] + z[t] ≤ 1
//! Σ_{τ = t−UT+1}^{t} y[τ] ≤ x[t]                    minimum uptime
//! Σ_{τ = t−DT+1}^{t} z[τ] ≤ 1 − x[t]                minimum downtime
//! Σ_t y[t] ≤ max_startups
//! ```
//!
//! Windows are truncated at the first step; nothing is assumed about the
//! state before the horizon. `DT` includes both ramp durations.

use ehub_core::technology::{DynamicsParams, TechnologySpec};
use ehub_core::{
    EhubResult, LinExpr, LinearConstraint, TechnologyBlock, TimeStep, VarDomain, VarId,
};
use tracing::debug;

/// Handles of the `x`, `y` and `z` series of a block
#[derive(Debug, Clone)]
pub struct StateIndicators {
    pub x: Vec<VarId>,
    pub y: Vec<VarId>,
    pub z: Vec<VarId>,
}

impl StateIndicators {
    /// `x[t]`
    pub fn on(&self, t: TimeStep) -> VarId {
        self.x[t.index()]
    }

    /// `y[t]`
    pub fn startup(&self, t: TimeStep) -> VarId {
        self.y[t.index()]
    }

    /// `z[t]`
    pub fn shutdown(&self, t: TimeStep) -> VarId {
        self.z[t.index()]
    }
}

pub fn add_state_logic(
    block: &mut TechnologyBlock,
    spec: &TechnologySpec,
    dynamics: &DynamicsParams,
) -> EhubResult<StateIndicators> {
    let startup_cap = dynamics.startup_cap(&spec.name)?;

    let states = StateIndicators {
        x: block.add_series("x", VarDomain::Continuous, 0.0, 1.0),
        y: block.add_series("y", VarDomain::Continuous, 0.0, 1.0),
        z: block.add_series("z", VarDomain::Continuous, 0.0, 1.0),
    };
    let time = block.time().clone();

    for t in time.steps() {
        let (x, y, z) = (states.on(t), states.startup(t), states.shutdown(t));
        if let Some(prev) = time.predecessor(t) {
            block.add_constraint(LinearConstraint::eq(
                format!("transition[{}]", t),
                x - states.on(prev),
                y - z,
            ));
        }
        block.add_constraint(LinearConstraint::le(
            format!("single_event[{}]", t),
            y + z,
            1.0,
        ));
    }

    let uptime = dynamics.min_uptime as isize;
    if uptime > 0 {
        for t in time.steps() {
            let now = t.value() as isize;
            let started: LinExpr = time
                .window(now - uptime + 1, now)
                .map(|tau| states.startup(tau))
                .sum();
            block.add_constraint(LinearConstraint::le(
                format!("min_uptime[{}]", t),
                started,
                states.on(t),
            ));
        }
    }

    let downtime = dynamics.effective_min_downtime() as isize;
    if downtime > 0 {
        for t in time.steps() {
            let now = t.value() as isize;
            let stopped: LinExpr = time
                .window(now - downtime + 1, now)
                .map(|tau| states.shutdown(tau))
                .sum();
            block.add_constraint(LinearConstraint::le(
                format!("min_downtime[{}]", t),
                stopped,
                1.0 - states.on(t),
            ));
        }
    }

    if let Some(cap) = startup_cap {
        let startups: LinExpr = states.y.iter().sum();
        block.add_constraint(LinearConstraint::le("max_startups", startups, cap as f64));
    }

    debug!(
        technology = %spec.name,
        min_uptime = dynamics.min_uptime,
        min_downtime = dynamics.effective_min_downtime(),
        max_startups = ?startup_cap,
        "added startup/shutdown logic"
    );
    Ok(states)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ehub_core::block::{FlowBounds, SizeBounds};
    use ehub_core::technology::TechnologyModel;
    use ehub_core::{CarrierId, TimeIndex};

    fn setup(steps: usize, dynamics: &DynamicsParams) -> (TechnologyBlock, StateIndicators) {
        let spec = TechnologySpec::new("gt", TechnologyModel::Conv1, 10.0)
            .with_carriers(&["gas"], &["electricity"]);
        let mut block = TechnologyBlock::new(
            "gt",
            TimeIndex::new(steps).unwrap(),
            vec![CarrierId::new("gas")],
            vec![CarrierId::new("electricity")],
            SizeBounds {
                min: 0.0,
                max: 10.0,
                integer: false,
            },
            FlowBounds {
                input_max: 10.0,
                output_max: 10.0,
            },
        );
        let states = add_state_logic(&mut block, &spec, dynamics).unwrap();
        (block, states)
    }

    fn assign(block: &TechnologyBlock, s: &StateIndicators, x: &[f64], y: &[f64], z: &[f64]) -> Vec<f64> {
        let mut values = block.zero_assignment();
        for i in 0..x.len() {
            values[s.x[i].index()] = x[i];
            values[s.y[i].index()] = y[i];
            values[s.z[i].index()] = z[i];
        }
        values
    }

    #[test]
    fn test_transitions_skip_first_step() {
        let (block, _) = setup(4, &DynamicsParams::default());
        let transitions = block
            .constraints()
            .iter()
            .filter(|c| c.name.starts_with("transition"))
            .count();
        assert_eq!(transitions, 3);
        assert!(block.constraints().iter().all(|c| c.name != "max_startups"));
    }

    #[test]
    fn test_single_event_per_step() {
        let (block, s) = setup(3, &DynamicsParams::default());
        let values = assign(&block, &s, &[0.0, 0.0, 0.0], &[0.0, 1.0, 0.0], &[0.0, 1.0, 0.0]);
        assert_eq!(block.logical_violations(&values, 1e-9), vec!["single_event[2]"]);
    }

    #[test]
    fn test_max_startups() {
        let dynamics = DynamicsParams {
            max_startups: 1,
            ..DynamicsParams::default()
        };
        let (block, s) = setup(5, &dynamics);
        let x = [0.0, 1.0, 0.0, 1.0, 0.0];
        let y = [0.0, 1.0, 0.0, 1.0, 0.0];
        let z = [0.0, 0.0, 1.0, 0.0, 1.0];
        let values = assign(&block, &s, &x, &y, &z);
        assert_eq!(block.logical_violations(&values, 1e-9), vec!["max_startups"]);
    }

    #[test]
    fn test_min_downtime_includes_ramps() {
        let dynamics = DynamicsParams {
            min_downtime: 1,
            su_time: 1,
            sd_time: 0,
            ..DynamicsParams::default()
        };
        let (block, s) = setup(5, &dynamics);
        // shutdown at 2, restart at 3: downtime of one step, two required
        let x = [1.0, 0.0, 1.0, 1.0, 1.0];
        let y = [0.0, 0.0, 1.0, 0.0, 0.0];
        let z = [0.0, 1.0, 0.0, 0.0, 0.0];
        let values = assign(&block, &s, &x, &y, &z);
        assert_eq!(block.logical_violations(&values, 1e-9), vec!["min_downtime[3]"]);
    }
}
