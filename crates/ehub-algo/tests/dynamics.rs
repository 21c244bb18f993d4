//! Startup/shutdown dynamics tests

use ehub_algo::{construct_technology, relax_block, ConstructedTechnology};
use ehub_core::technology::{
    Coefficients, DynamicsParams, PerformanceFit, SegmentValues, TechnologyModel,
};
use ehub_core::{
    CarrierId, EhubError, Mode, RelaxationConfig, TechnologySpec, TimeIndex, TimeStep,
};

fn turbine(dynamics: DynamicsParams, min_part_load: Option<f64>) -> TechnologySpec {
    TechnologySpec::new("turbine", TechnologyModel::Conv1, 10.0)
        .with_carriers(&["gas"], &["electricity"])
        .with_fit(PerformanceFit {
            alpha1: Some(Coefficients::Uniform(SegmentValues::Single(0.9))),
            min_part_load,
            ..PerformanceFit::default()
        })
        .with_dynamics(dynamics)
}

fn deferred() -> RelaxationConfig {
    RelaxationConfig {
        enabled: false,
        fallback_big_m: None,
    }
}

/// States plus flows; `input[t]` of gas, output follows the curve.
fn assignment(built: &ConstructedTechnology, size: f64, x: &[f64], input: &[f64], output: &[f64]) -> Vec<f64> {
    let block = &built.block;
    let states = built.states.as_ref().unwrap();
    let gas = CarrierId::new("gas");
    let electricity = CarrierId::new("electricity");
    let mut values = block.zero_assignment();
    values[block.size().index()] = size;
    for t in block.time().steps() {
        let i = t.index();
        values[states.x[i].index()] = x[i];
        let before = if i == 0 { x[i] } else { x[i - 1] };
        if x[i] > before {
            values[states.y[i].index()] = 1.0;
        }
        if x[i] < before {
            values[states.z[i].index()] = 1.0;
        }
        values[block.input(t, &gas).unwrap().index()] = input[i];
        values[block.output(t, &electricity).unwrap().index()] = output[i];
    }
    values
}

#[test]
fn min_uptime_keeps_unit_on_after_startup() {
    let dynamics = DynamicsParams {
        min_uptime: 3,
        ..DynamicsParams::default()
    };
    let time = TimeIndex::new(8).unwrap();
    let built = construct_technology(&turbine(dynamics, Some(0.2)), &time, &deferred()).unwrap();

    let x = [0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0];
    let input = [0.0, 0.0, 0.0, 0.0, 5.0, 5.0, 5.0, 0.0];
    let output: Vec<f64> = input.iter().map(|i| 0.9 * i).collect();
    let values = assignment(&built, 10.0, &x, &input, &output);
    assert!(built.block.logical_violations(&values, 1e-9).is_empty());

    // switching off after two steps breaks the uptime window
    let x = [0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0];
    let input = [0.0, 0.0, 0.0, 0.0, 5.0, 5.0, 0.0, 0.0];
    let output: Vec<f64> = input.iter().map(|i| 0.9 * i).collect();
    let values = assignment(&built, 10.0, &x, &input, &output);
    assert_eq!(built.block.logical_violations(&values, 1e-9), vec!["min_uptime[7]"]);
}

#[test]
fn transitions_link_states_and_events() {
    let time = TimeIndex::new(4).unwrap();
    let built =
        construct_technology(&turbine(DynamicsParams::default(), None), &time, &deferred()).unwrap();
    let states = built.states.as_ref().unwrap();

    let x = [1.0, 1.0, 0.0, 0.0];
    let input = [5.0, 5.0, 0.0, 0.0];
    let output = [4.5, 4.5, 0.0, 0.0];
    let mut values = assignment(&built, 10.0, &x, &input, &output);
    assert!(built.block.logical_violations(&values, 1e-9).is_empty());

    // a shutdown that never happened
    values[states.z[2].index()] = 0.0;
    assert_eq!(built.block.logical_violations(&values, 1e-9), vec!["transition[3]"]);
}

#[test]
fn fast_startup_load_is_limited() {
    let dynamics = DynamicsParams {
        su_load: 0.5,
        sd_load: 0.5,
        ..DynamicsParams::default()
    };
    let time = TimeIndex::new(4).unwrap();
    let built = construct_technology(&turbine(dynamics, None), &time, &deferred()).unwrap();

    let x = [0.0, 1.0, 1.0, 0.0];
    let input = [0.0, 5.0, 5.0, 0.0];
    let output = [0.0, 4.5, 4.5, 0.0];
    let values = assignment(&built, 10.0, &x, &input, &output);
    assert!(built.block.logical_violations(&values, 1e-9).is_empty());

    // full load in the startup step, and before the shutdown
    let input = [0.0, 8.0, 8.0, 0.0];
    let output = [0.0, 7.2, 7.2, 0.0];
    let values = assignment(&built, 10.0, &x, &input, &output);
    assert_eq!(
        built.block.logical_violations(&values, 1e-9),
        vec!["startup_load[2]", "shutdown_load[4]"]
    );
}

#[test]
fn ramping_limit_bounds_input_change() {
    let dynamics = DynamicsParams {
        ramping_rate: 0.3,
        ..DynamicsParams::default()
    };
    let time = TimeIndex::new(3).unwrap();
    let built = construct_technology(&turbine(dynamics, None), &time, &deferred()).unwrap();

    let x = [1.0, 1.0, 1.0];
    let input = [2.0, 5.0, 9.0];
    let output: Vec<f64> = input.iter().map(|i| 0.9 * i).collect();
    let values = assignment(&built, 10.0, &x, &input, &output);
    assert_eq!(built.block.logical_violations(&values, 1e-9), vec!["ramp_up[3]"]);
}

#[test]
fn slow_startup_follows_trajectory() {
    let dynamics = DynamicsParams {
        su_time: 1,
        sd_time: 1,
        ..DynamicsParams::default()
    };
    let time = TimeIndex::new(6).unwrap();
    let built = construct_technology(&turbine(dynamics, Some(0.5)), &time, &deferred()).unwrap();
    let block = &built.block;

    // ramp up at 2, on at 3 and 4, ramp down at 5
    let x = [0.0, 0.0, 1.0, 1.0, 0.0, 0.0];
    let input = [0.0, 2.5, 8.0, 5.0, 2.5, 0.0];
    let output = [0.0, 0.0, 7.2, 4.5, 0.0, 0.0];
    let mut values = assignment(&built, 10.0, &x, &input, &output);
    assert!(block.logical_violations(&values, 1e-9).is_empty());
    assert!(block.bound_violations(&values, 1e-9).is_empty());

    let modes: Vec<Vec<Mode>> = block
        .disjunctions()
        .iter()
        .map(|d| d.satisfied_modes(&values, 1e-9))
        .collect();
    assert_eq!(modes[1], vec![Mode::StartingUp(1)]);
    assert_eq!(modes[4], vec![Mode::ShuttingDown(1)]);

    // the ramp-up step must run at exactly the trajectory load
    let gas = CarrierId::new("gas");
    values[block.input(TimeStep::new(2), &gas).unwrap().index()] = 3.0;
    assert_eq!(block.logical_violations(&values, 1e-9), vec!["trajectory[2]"]);
}

#[test]
fn relaxed_trajectory_accepts_chosen_modes() {
    let dynamics = DynamicsParams {
        su_time: 1,
        sd_time: 1,
        ..DynamicsParams::default()
    };
    let time = TimeIndex::new(6).unwrap();
    let mut built =
        construct_technology(&turbine(dynamics, Some(0.5)), &time, &deferred()).unwrap();

    let x = [0.0, 0.0, 1.0, 1.0, 0.0, 0.0];
    let input = [0.0, 2.5, 8.0, 5.0, 2.5, 0.0];
    let output = [0.0, 0.0, 7.2, 4.5, 0.0, 0.0];
    let mut values = assignment(&built, 10.0, &x, &input, &output);
    let chosen: Vec<Mode> = built
        .block
        .disjunctions()
        .iter()
        .map(|d| d.satisfied_modes(&values, 1e-9)[0])
        .collect();

    assert_eq!(relax_block(&mut built.block, None).unwrap(), 6);
    assert_eq!(relax_block(&mut built.block, None).unwrap(), 0);

    values.resize(built.block.vars().len(), 0.0);
    for (d, mode) in built.block.disjunctions().iter().zip(chosen) {
        values[d.indicator(mode).unwrap().index()] = 1.0;
    }
    assert!(built.block.relaxed_violations(&values, 1e-9).is_empty());
}

#[test]
fn trajectory_longer_than_horizon_is_rejected() {
    let dynamics = DynamicsParams {
        su_time: 4,
        ..DynamicsParams::default()
    };
    let time = TimeIndex::new(4).unwrap();
    let result = construct_technology(&turbine(dynamics, Some(0.5)), &time, &deferred());
    assert!(matches!(
        result,
        Err(EhubError::TrajectoryExceedsHorizon { length: 4, horizon: 4, .. })
    ));
}
