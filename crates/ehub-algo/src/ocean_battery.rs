//! Multi-component storage: a reservoir fed by pump slots and drained by
//! turbine slots.
//!
//! Every pump slot either stays unused or takes one of the configured pump
//! archetypes; turbine slots share a single archetype and only choose their
//! size. Slot variables live in the technology's arena, grouped into one
//! [`SubBlock`] per slot.

use ehub_core::disjunction::{Disjunction, Mode};
use ehub_core::technology::{OceanBatteryParams, TechnologySpec};
use ehub_core::{
    EhubError, EhubResult, LinExpr, LinearConstraint, SubBlock, TechnologyBlock, VarDomain, VarId,
};
use tracing::debug;

/// Variables of one pump or turbine slot
#[derive(Debug, Clone)]
pub struct SlotVariables {
    pub size: VarId,
    pub capex: VarId,
    /// Electricity drawn (pumps) or delivered (turbines)
    pub flow: Vec<VarId>,
    /// Water moved into (pumps) or out of (turbines) the reservoir
    pub water: Vec<VarId>,
}

/// Handles returned by [`add_ocean_battery`]
#[derive(Debug, Clone)]
pub struct OceanBatteryVariables {
    pub level: Vec<VarId>,
    pub total_inflow: Vec<VarId>,
    pub total_outflow: Vec<VarId>,
    pub capex: VarId,
    pub pumps: Vec<SlotVariables>,
    pub turbines: Vec<SlotVariables>,
}

pub fn add_ocean_battery(
    block: &mut TechnologyBlock,
    spec: &TechnologySpec,
) -> EhubResult<OceanBatteryVariables> {
    let name = spec.name.as_str();
    let params = spec
        .ocean_battery
        .as_ref()
        .ok_or_else(|| EhubError::config(name, "ocean battery parameters missing"))?;
    let input_carrier = block
        .input_carriers()
        .first()
        .cloned()
        .ok_or_else(|| EhubError::config(name, "ocean battery needs an input carrier"))?;
    let output_carrier = block
        .output_carriers()
        .first()
        .cloned()
        .ok_or_else(|| EhubError::config(name, "ocean battery needs an output carrier"))?;
    let time = block.time().clone();
    let size = block.size();

    let inflow_max = params.pump_slots as f64 * params.slot_size_max;
    let outflow_max = params.turbine_slots as f64 * params.slot_size_max;
    let level = block.add_series("level", VarDomain::Continuous, 0.0, spec.size_max);
    let total_inflow = block.add_series("total_inflow", VarDomain::Continuous, 0.0, inflow_max);
    let total_outflow = block.add_series("total_outflow", VarDomain::Continuous, 0.0, outflow_max);

    let pumps: Vec<SlotVariables> = (1..=params.pump_slots)
        .map(|slot| add_pump_slot(block, params, slot))
        .collect();
    let turbines: Vec<SlotVariables> = (1..=params.turbine_slots)
        .map(|slot| add_turbine_slot(block, params, slot))
        .collect();

    let decay = (1.0 - params.lambda).powi(time.averaged_steps() as i32);
    let gain: f64 = (0..time.averaged_steps())
        .map(|i| (1.0 - params.lambda).powi(i as i32))
        .sum();

    for t in time.steps() {
        let i = t.index();
        let p = time.previous(t);
        block.add_constraint(LinearConstraint::le(
            format!("level_max[{}]", t),
            level[i],
            size,
        ));
        block.add_constraint(LinearConstraint::ge(
            format!("level_min[{}]", t),
            level[i],
            params.min_fill * size,
        ));
        block.add_constraint(LinearConstraint::eq(
            format!("level[{}]", t),
            level[i],
            decay * level[p.index()] + gain * (total_inflow[i] - total_outflow[i]),
        ));

        let input = block
            .input(t, &input_carrier)
            .ok_or_else(|| EhubError::config(name, "ocean battery input missing"))?;
        let output = block
            .output(t, &output_carrier)
            .ok_or_else(|| EhubError::config(name, "ocean battery output missing"))?;
        let pumped: LinExpr = pumps.iter().map(|s| s.flow[i]).sum();
        let generated: LinExpr = turbines.iter().map(|s| s.flow[i]).sum();
        let inflow: LinExpr = pumps.iter().map(|s| s.water[i]).sum();
        let outflow: LinExpr = turbines.iter().map(|s| s.water[i]).sum();
        block.add_constraints([
            LinearConstraint::eq(format!("total_input[{}]", t), input, pumped),
            LinearConstraint::eq(format!("total_output[{}]", t), output, generated),
            LinearConstraint::eq(format!("total_inflow[{}]", t), total_inflow[i], inflow),
            LinearConstraint::eq(format!("total_outflow[{}]", t), total_outflow[i], outflow),
        ]);
    }

    let slot_capex_max = params.pump_slots as f64 * pump_capex_max(params)
        + params.turbine_slots as f64 * params.turbine_capex_rate * params.slot_size_max;
    let capex_max = params.base_capex_rate * spec.size_max + slot_capex_max;
    let capex = block.add_scalar("capex", VarDomain::Continuous, 0.0, capex_max);
    let slot_capex: LinExpr = pumps.iter().chain(turbines.iter()).map(|s| s.capex).sum();
    block.add_constraint(LinearConstraint::eq(
        "capex",
        capex,
        params.base_capex_rate * size + slot_capex,
    ));

    debug!(
        technology = %name,
        pump_slots = params.pump_slots,
        turbine_slots = params.turbine_slots,
        archetypes = params.pump_archetypes.len(),
        "added ocean battery"
    );
    Ok(OceanBatteryVariables {
        level,
        total_inflow,
        total_outflow,
        capex,
        pumps,
        turbines,
    })
}

fn pump_capex_max(params: &OceanBatteryParams) -> f64 {
    let factor = params
        .pump_archetypes
        .iter()
        .map(|a| a.capex_factor)
        .fold(0.0, f64::max);
    params.pump_capex_rate * factor * params.slot_size_max
}

fn slot_variables(
    block: &mut TechnologyBlock,
    prefix: &str,
    flow_max: f64,
    water_max: f64,
    capex_max: f64,
) -> SlotVariables {
    let time = block.time().clone();
    let vars = block.vars_mut();
    let size = vars.add(format!("{}.size", prefix), VarDomain::Continuous, 0.0, water_max);
    let capex = vars.add(format!("{}.capex", prefix), VarDomain::Continuous, 0.0, capex_max);
    let flow = time
        .steps()
        .map(|t| vars.add(format!("{}.flow[{}]", prefix, t), VarDomain::Continuous, 0.0, flow_max))
        .collect();
    let water = time
        .steps()
        .map(|t| vars.add(format!("{}.water[{}]", prefix, t), VarDomain::Continuous, 0.0, water_max))
        .collect();
    SlotVariables {
        size,
        capex,
        flow,
        water,
    }
}

fn add_pump_slot(block: &mut TechnologyBlock, params: &OceanBatteryParams, slot: usize) -> SlotVariables {
    let prefix = format!("pump[{}]", slot);
    let max_efficiency = params
        .pump_archetypes
        .iter()
        .map(|a| a.efficiency)
        .fold(0.0, f64::max);
    let pump = slot_variables(
        block,
        &prefix,
        params.slot_size_max * max_efficiency,
        params.slot_size_max,
        pump_capex_max(params),
    );
    let time = block.time().clone();

    let mut unused = vec![
        LinearConstraint::eq(format!("{}.size_unused", prefix), pump.size, 0.0),
        LinearConstraint::eq(format!("{}.capex_unused", prefix), pump.capex, 0.0),
    ];
    for t in time.steps() {
        let i = t.index();
        unused.push(LinearConstraint::eq(
            format!("{}.input_unused[{}]", prefix, t),
            pump.flow[i],
            0.0,
        ));
        unused.push(LinearConstraint::eq(
            format!("{}.inflow_unused[{}]", prefix, t),
            pump.water[i],
            0.0,
        ));
    }
    let mut disjunction = Disjunction::new(format!("{}.archetype", prefix)).with(Mode::SlotUnused, unused);

    for (a, archetype) in params.pump_archetypes.iter().enumerate() {
        let mode = Mode::SlotArchetype(a + 1);
        let mut constraints = vec![LinearConstraint::eq(
            format!("{}.{}.capex", prefix, mode),
            pump.capex,
            (params.pump_capex_rate * archetype.capex_factor) * pump.size,
        )];
        for t in time.steps() {
            let i = t.index();
            constraints.push(LinearConstraint::le(
                format!("{}.{}.inflow[{}]", prefix, mode, t),
                pump.water[i],
                pump.size,
            ));
            constraints.push(LinearConstraint::eq(
                format!("{}.{}.efficiency[{}]", prefix, mode, t),
                pump.flow[i],
                archetype.efficiency * pump.water[i],
            ));
        }
        disjunction.push(mode, constraints);
    }

    let mut sub_block = SubBlock::new(prefix);
    sub_block.disjunctions.push(disjunction);
    block.add_sub_block(sub_block);
    pump
}

fn add_turbine_slot(
    block: &mut TechnologyBlock,
    params: &OceanBatteryParams,
    slot: usize,
) -> SlotVariables {
    let prefix = format!("turbine[{}]", slot);
    let turbine = slot_variables(
        block,
        &prefix,
        params.slot_size_max * params.turbine_efficiency,
        params.slot_size_max,
        params.turbine_capex_rate * params.slot_size_max,
    );
    let time = block.time().clone();

    let mut sub_block = SubBlock::new(prefix.clone());
    sub_block.constraints.push(LinearConstraint::eq(
        format!("{}.capex", prefix),
        turbine.capex,
        params.turbine_capex_rate * turbine.size,
    ));
    for t in time.steps() {
        let i = t.index();
        sub_block.constraints.push(LinearConstraint::le(
            format!("{}.outflow[{}]", prefix, t),
            turbine.water[i],
            turbine.size,
        ));
        sub_block.constraints.push(LinearConstraint::eq(
            format!("{}.efficiency[{}]", prefix, t),
            turbine.flow[i],
            params.turbine_efficiency * turbine.water[i],
        ));
    }
    block.add_sub_block(sub_block);
    turbine
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::{flow_bounds, size_bounds};
    use ehub_core::technology::TechnologyModel;
    use ehub_core::TimeIndex;

    fn reservoir(pumps: usize, turbines: usize) -> TechnologySpec {
        let mut spec = TechnologySpec::new("ocean", TechnologyModel::OceanBattery, 100.0)
            .with_carriers(&["electricity"], &["electricity"]);
        spec.ocean_battery = Some(OceanBatteryParams::new(pumps, turbines));
        spec
    }

    fn build(spec: &TechnologySpec, time: TimeIndex) -> (TechnologyBlock, OceanBatteryVariables) {
        let mut block = TechnologyBlock::new(
            spec.name.clone(),
            time,
            spec.input_carriers.clone(),
            spec.output_carriers.clone(),
            size_bounds(spec),
            flow_bounds(spec),
        );
        let vars = add_ocean_battery(&mut block, spec).unwrap();
        (block, vars)
    }

    #[test]
    fn test_slot_structure() {
        let (block, vars) = build(&reservoir(2, 1), TimeIndex::new(3).unwrap());
        assert_eq!(block.sub_blocks().len(), 3);
        assert_eq!(vars.pumps.len(), 2);
        let pump = block.sub_block("pump[1]").unwrap();
        let modes: Vec<Mode> = pump.disjunctions[0].modes().collect();
        assert_eq!(
            modes,
            vec![Mode::SlotUnused, Mode::SlotArchetype(1), Mode::SlotArchetype(2)]
        );
        assert!(block.sub_block("turbine[1]").unwrap().disjunctions.is_empty());
    }

    #[test]
    fn test_level_recursion_with_averaged_steps() {
        let mut spec = reservoir(1, 1);
        if let Some(p) = spec.ocean_battery.as_mut() {
            p.lambda = 0.1;
        }
        let time = TimeIndex::new(2).unwrap().with_averaged_steps(2).unwrap();
        let (block, vars) = build(&spec, time);
        let first = block
            .constraints()
            .iter()
            .find(|c| c.name == "level[1]")
            .unwrap();
        assert!((first.expr.coefficient(vars.level[1]) + 0.81).abs() < 1e-12);
        assert!((first.expr.coefficient(vars.total_inflow[0]) + 1.9).abs() < 1e-12);
        assert!((first.expr.coefficient(vars.total_outflow[0]) - 1.9).abs() < 1e-12);
    }

    #[test]
    fn test_archetype_choice_is_logically_consistent() {
        let (block, vars) = build(&reservoir(1, 1), TimeIndex::new(1).unwrap());
        let pump = &vars.pumps[0];
        let mut values = block.zero_assignment();
        values[pump.size.index()] = 4.0;
        values[pump.capex.index()] = 16.0;
        values[pump.water[0].index()] = 4.0;
        values[pump.flow[0].index()] = 2.8;

        let d = &block.sub_block("pump[1]").unwrap().disjunctions[0];
        assert_eq!(d.satisfied_modes(&values, 1e-9), vec![Mode::SlotArchetype(2)]);
    }
}
