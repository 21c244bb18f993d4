//! Performance curve compiler.
//!
//! Turns a [`PerformanceFit`](ehub_core::technology::PerformanceFit) into
//! input/output relations on a technology block.
//!
//! | function type | without state indicators | with state indicators |
//! |---------------|--------------------------|-----------------------|
//! | 1 (through origin) | plain equalities | off/on disjunction |
//! | 2 (with offset) | off/on disjunction | off/on disjunction, `x` pinned |
//! | 3 (piecewise) | off ∪ segments disjunction | same, `x` pinned |
//!
//! The relation input is the total input for CONV1/CONV2 and the main input
//! carrier for CONV3. Intercepts are per unit size:
//! `output = alpha2 · input + alpha1 · size`.

use crate::dynamics::StateIndicators;
use crate::record_warning;
use ehub_core::disjunction::{Disjunction, Mode};
use ehub_core::technology::{
    CurtailmentMode, PerformanceFunction, TechnologyModel, TechnologySpec,
};
use ehub_core::{
    CarrierId, Diagnostics, EhubError, EhubResult, LinExpr, LinearConstraint, TechnologyBlock,
    TimeStep, VarDomain,
};
use tracing::debug;

const CONTINUITY_TOLERANCE: f64 = 1e-6;

/// Input the performance relation is expressed in: the main carrier for
/// CONV3, the sum over input carriers otherwise.
pub(crate) fn relation_input(
    block: &TechnologyBlock,
    spec: &TechnologySpec,
    t: TimeStep,
) -> EhubResult<LinExpr> {
    match spec.main_carrier() {
        Some(main) => block.input(t, main).map(LinExpr::from).ok_or_else(|| {
            EhubError::config(&spec.name, format!("{} is not an input carrier", main))
        }),
        None => Ok(block.total_input(t)),
    }
}

/// Every input and output of step `t` pinned to zero.
pub(crate) fn off_constraints(block: &TechnologyBlock, t: TimeStep) -> Vec<LinearConstraint> {
    let inputs = block
        .input_carriers()
        .iter()
        .zip(block.inputs_at(t))
        .map(|(c, v)| LinearConstraint::eq(format!("input_off[{},{}]", t, c), *v, 0.0));
    let outputs = block
        .output_carriers()
        .iter()
        .zip(block.outputs_at(t))
        .map(|(c, v)| LinearConstraint::eq(format!("output_off[{},{}]", t, c), *v, 0.0));
    inputs.chain(outputs).collect()
}

/// Outputs pinned to zero, inputs left free.
pub(crate) fn outputs_off(block: &TechnologyBlock, t: TimeStep) -> Vec<LinearConstraint> {
    block
        .output_carriers()
        .iter()
        .zip(block.outputs_at(t))
        .map(|(c, v)| LinearConstraint::eq(format!("output_off[{},{}]", t, c), *v, 0.0))
        .collect()
}

/// `(slope, intercept)` of a segment for one output carrier (or all, for CONV1).
fn slope_intercept(
    spec: &TechnologySpec,
    carrier: Option<&CarrierId>,
    segment: usize,
) -> EhubResult<(f64, f64)> {
    let name = spec.name.as_str();
    let fit = &spec.fit;
    let lookup = |coefficient: &'static str| -> EhubResult<f64> {
        let values = if coefficient == "alpha1" {
            fit.alpha1(name)?
        } else {
            fit.alpha2(name)?
        };
        match carrier {
            Some(c) => values.for_carrier(name, coefficient, c, segment),
            None => values.uniform(name, coefficient, segment),
        }
    };
    match fit.function_type() {
        PerformanceFunction::LinearThroughOrigin => Ok((lookup("alpha1")?, 0.0)),
        _ => Ok((lookup("alpha2")?, lookup("alpha1")?)),
    }
}

/// Input/output relation of one curve segment at step `t`.
///
/// `intercept_scale` multiplies the size term; trajectories use the rated
/// power here, the plain compiler uses 1.
pub(crate) fn nominal_relations(
    block: &TechnologyBlock,
    spec: &TechnologySpec,
    t: TimeStep,
    segment: usize,
    intercept_scale: f64,
) -> EhubResult<Vec<LinearConstraint>> {
    let input = relation_input(block, spec, t)?;
    let size = block.size();

    if spec.technology_model == TechnologyModel::Conv1 {
        let (slope, intercept) = slope_intercept(spec, None, segment)?;
        return Ok(vec![LinearConstraint::eq(
            format!("input_output[{}]", t),
            block.total_output(t),
            slope * input + (intercept * intercept_scale) * size,
        )]);
    }

    block
        .output_carriers()
        .iter()
        .zip(block.outputs_at(t))
        .map(|(carrier, output)| -> EhubResult<LinearConstraint> {
            let (slope, intercept) = slope_intercept(spec, Some(carrier), segment)?;
            Ok(LinearConstraint::eq(
                format!("input_output[{},{}]", t, carrier),
                *output,
                slope * input.clone() + (intercept * intercept_scale) * size,
            ))
        })
        .collect()
}

/// `relation input ≤ size · rated_power` for conversion technologies.
pub fn add_size_limit(block: &mut TechnologyBlock, spec: &TechnologySpec) -> EhubResult<()> {
    let rated = spec.fit.rated_power;
    for t in block.time().steps() {
        let input = relation_input(block, spec, t)?;
        let limit = LinearConstraint::le(format!("size_limit[{}]", t), input, rated * block.size());
        block.add_constraint(limit);
    }
    Ok(())
}

/// CONV3 secondary inputs follow the main input at fixed ratios.
pub fn add_input_ratios(block: &mut TechnologyBlock, spec: &TechnologySpec) -> EhubResult<()> {
    let Some(main) = spec.main_carrier() else {
        return Ok(());
    };
    for t in block.time().steps() {
        let main_var = block
            .input(t, main)
            .ok_or_else(|| EhubError::config(&spec.name, format!("{} is not an input carrier", main)))?;
        for (carrier, ratio) in &spec.fit.input_ratios {
            let var = block.input(t, carrier).ok_or_else(|| {
                EhubError::config(&spec.name, format!("{} is not an input carrier", carrier))
            })?;
            block.add_constraint(LinearConstraint::eq(
                format!("input_ratio[{},{}]", t, carrier),
                var,
                *ratio * main_var,
            ));
        }
    }
    Ok(())
}

/// Emit the performance relations of `spec` into `block`.
///
/// With `states`, "off" alternatives pin `x[t] = 0` and every "on" or
/// segment alternative pins `x[t] = 1`.
pub fn compile_performance(
    block: &mut TechnologyBlock,
    spec: &TechnologySpec,
    states: Option<&StateIndicators>,
    diagnostics: &mut Diagnostics,
) -> EhubResult<()> {
    match spec.technology_model {
        TechnologyModel::Res => compile_renewable(block, spec, diagnostics),
        TechnologyModel::Conv1 | TechnologyModel::Conv2 | TechnologyModel::Conv3 => {
            add_input_ratios(block, spec)?;
            compile_conversion(block, spec, states, diagnostics)
        }
        TechnologyModel::Stor | TechnologyModel::OceanBattery => Ok(()),
    }
}

fn compile_renewable(
    block: &mut TechnologyBlock,
    spec: &TechnologySpec,
    diagnostics: &mut Diagnostics,
) -> EhubResult<()> {
    let (mode, defaulted) = spec.fit.resolve_curtailment(&spec.name)?;
    if defaulted {
        record_warning(
            diagnostics,
            "defaults",
            &spec.name,
            "curtailment not set, assuming no curtailment",
        );
    }
    let cf = &spec.fit.capacity_factor;
    if cf.len() != block.time().len() {
        return Err(EhubError::SeriesLength {
            technology: spec.name.clone(),
            series: "capacity_factor",
            expected: block.time().len(),
            found: cf.len(),
        });
    }

    let active_units = if mode == CurtailmentMode::Discrete {
        let units = block.add_series("active_units", VarDomain::Integer, 0.0, spec.size_max);
        for t in block.time().steps() {
            let c = LinearConstraint::le(
                format!("active_units_limit[{}]", t),
                units[t.index()],
                block.size(),
            );
            block.add_constraint(c);
        }
        Some(units)
    } else {
        None
    };

    let size = block.size();
    let steps: Vec<TimeStep> = block.time().steps().collect();
    for t in steps {
        let factor = cf[t.index()];
        let outputs: Vec<_> = block
            .output_carriers()
            .iter()
            .cloned()
            .zip(block.outputs_at(t).iter().copied())
            .collect();
        for (carrier, output) in outputs {
            let name = format!("capacity_factor[{},{}]", t, carrier);
            let c = match (mode, &active_units) {
                (CurtailmentMode::None, _) => LinearConstraint::eq(name, output, factor * size),
                (CurtailmentMode::Discrete, Some(units)) => {
                    LinearConstraint::le(name, output, factor * units[t.index()])
                }
                _ => LinearConstraint::le(name, output, factor * size),
            };
            block.add_constraint(c);
        }
    }
    debug!(technology = %spec.name, curtailment = ?mode, "compiled renewable output");
    Ok(())
}

fn compile_conversion(
    block: &mut TechnologyBlock,
    spec: &TechnologySpec,
    states: Option<&StateIndicators>,
    diagnostics: &mut Diagnostics,
) -> EhubResult<()> {
    let fit = &spec.fit;
    let function = fit.function_type();

    if function == PerformanceFunction::LinearWithOffset
        && fit.min_part_load.unwrap_or(0.0) == 0.0
    {
        record_warning(
            diagnostics,
            "performance",
            &spec.name,
            "linear performance with offset but no min_part_load, using 0",
        );
    }
    if function == PerformanceFunction::PiecewiseLinear {
        check_continuity(spec, diagnostics)?;
    }

    let min_part_load = fit.min_part_load.unwrap_or(0.0);
    let size = block.size();
    let steps: Vec<TimeStep> = block.time().steps().collect();
    for t in steps {
        let pin_x = |value: f64| -> Vec<LinearConstraint> {
            states
                .map(|s| vec![LinearConstraint::eq(format!("state[{}]", t), s.on(t), value)])
                .unwrap_or_default()
        };

        if function == PerformanceFunction::LinearThroughOrigin && states.is_none() {
            let relations = nominal_relations(block, spec, t, 0, 1.0)?;
            block.add_constraints(relations);
            continue;
        }

        let mut off = off_constraints(block, t);
        off.extend(pin_x(0.0));
        let mut disjunction = Disjunction::new(format!("input_output[{}]", t)).with(Mode::Off, off);

        match function {
            PerformanceFunction::LinearThroughOrigin => {
                let mut on = nominal_relations(block, spec, t, 0, 1.0)?;
                on.extend(pin_x(1.0));
                disjunction.push(Mode::On, on);
            }
            PerformanceFunction::LinearWithOffset => {
                let mut on = nominal_relations(block, spec, t, 0, 1.0)?;
                on.push(LinearConstraint::ge(
                    format!("min_part_load[{}]", t),
                    relation_input(block, spec, t)?,
                    min_part_load * size,
                ));
                on.extend(pin_x(1.0));
                disjunction.push(Mode::On, on);
            }
            PerformanceFunction::PiecewiseLinear => {
                for (segment, bp) in fit.bp_x.windows(2).enumerate() {
                    let input = relation_input(block, spec, t)?;
                    let mut seg = vec![
                        LinearConstraint::ge(
                            format!("segment_lower[{},{}]", t, segment + 1),
                            input.clone(),
                            bp[0] * size,
                        ),
                        LinearConstraint::le(
                            format!("segment_upper[{},{}]", t, segment + 1),
                            input,
                            bp[1] * size,
                        ),
                    ];
                    seg.extend(nominal_relations(block, spec, t, segment, 1.0)?);
                    seg.extend(pin_x(1.0));
                    disjunction.push(Mode::Segment(segment + 1), seg);
                }
            }
        }
        block.add_disjunction(disjunction);
    }
    debug!(
        technology = %spec.name,
        function = u8::from(function),
        disjunctions = block.disjunctions().len(),
        "compiled performance curve"
    );
    Ok(())
}

/// Warn when adjacent segments of a piecewise fit disagree at a breakpoint.
fn check_continuity(spec: &TechnologySpec, diagnostics: &mut Diagnostics) -> EhubResult<()> {
    let carriers: Vec<Option<&CarrierId>> = if spec.technology_model == TechnologyModel::Conv1 {
        vec![None]
    } else {
        spec.output_carriers.iter().map(Some).collect()
    };
    let bp = &spec.fit.bp_x;
    for carrier in carriers {
        for i in 1..bp.len().saturating_sub(1) {
            let (slope_l, icpt_l) = slope_intercept(spec, carrier, i - 1)?;
            let (slope_r, icpt_r) = slope_intercept(spec, carrier, i)?;
            let left = slope_l * bp[i] + icpt_l;
            let right = slope_r * bp[i] + icpt_r;
            if (left - right).abs() > CONTINUITY_TOLERANCE {
                let message = match carrier {
                    Some(c) => format!(
                        "piecewise fit is discontinuous at breakpoint {} for {} ({} vs {})",
                        i, c, left, right
                    ),
                    None => format!(
                        "piecewise fit is discontinuous at breakpoint {} ({} vs {})",
                        i, left, right
                    ),
                };
                record_warning(diagnostics, "performance", &spec.name, &message);
            }
        }
    }
    Ok(())
}
