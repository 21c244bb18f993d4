//! Technology construction driver.
//!
//! Runs the engines in a fixed order for each technology:
//!
//! 1. validate the specification against the horizon
//! 2. declare size and flow variables with finite bounds
//! 3. conversion size limit and state indicators (when dynamics are set)
//! 4. performance relations, or trajectories for slow dynamics
//! 5. ramping limit, storage recursion or reservoir slots
//! 6. big-M relaxation, when enabled
//!
//! Any error aborts the technology; [`construct_all`] then aborts the model.

use crate::bounds::{flow_bounds, size_bounds};
use crate::dynamics::{
    add_fast_dynamics, add_ramping_limit, add_slow_dynamics, add_state_logic, StateIndicators,
};
use crate::ocean_battery::{add_ocean_battery, OceanBatteryVariables};
use crate::performance::{add_input_ratios, add_size_limit, compile_performance};
use crate::record_warning;
use crate::relax::relax_block;
use crate::storage::add_storage;
use ehub_core::technology::TechnologyModel;
use ehub_core::{
    Diagnostics, EhubResult, ModelConfig, RelaxationConfig, TechnologyBlock, TechnologySpec,
    TimeIndex,
};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::info;

/// A technology block together with the handles the engines returned
#[derive(Debug, Clone)]
pub struct ConstructedTechnology {
    pub name: String,
    pub block: TechnologyBlock,
    pub states: Option<StateIndicators>,
    pub ocean_battery: Option<OceanBatteryVariables>,
    /// Disjunctions turned into big-M constraints during construction
    pub relaxed: usize,
    pub diagnostics: Diagnostics,
}

pub fn construct_technology(
    spec: &TechnologySpec,
    time: &TimeIndex,
    relaxation: &RelaxationConfig,
) -> EhubResult<ConstructedTechnology> {
    spec.validate(time)?;

    let mut diagnostics = Diagnostics::new();
    let mut block = TechnologyBlock::new(
        spec.name.clone(),
        time.clone(),
        spec.input_carriers.clone(),
        spec.output_carriers.clone(),
        size_bounds(spec),
        flow_bounds(spec),
    );

    if spec.technology_model.is_conversion() {
        if spec.fit.performance_function_type.is_none() {
            record_warning(
                &mut diagnostics,
                "defaults",
                &spec.name,
                "performance_function_type not set, using 1 (linear through origin)",
            );
        }
        add_size_limit(&mut block, spec)?;
    }

    let states = match &spec.dynamics {
        Some(dynamics) => Some(add_state_logic(&mut block, spec, dynamics)?),
        None => None,
    };

    match (&spec.dynamics, &states) {
        (Some(dynamics), Some(s)) if dynamics.is_slow() => {
            add_input_ratios(&mut block, spec)?;
            add_slow_dynamics(&mut block, spec, dynamics, s, &mut diagnostics)?;
        }
        (Some(dynamics), Some(s)) => {
            compile_performance(&mut block, spec, Some(s), &mut diagnostics)?;
            add_fast_dynamics(&mut block, spec, dynamics, s)?;
        }
        _ => compile_performance(&mut block, spec, None, &mut diagnostics)?,
    }
    if let Some(dynamics) = &spec.dynamics {
        add_ramping_limit(&mut block, spec, dynamics)?;
    }

    let ocean_battery = match spec.technology_model {
        TechnologyModel::Stor => {
            add_storage(&mut block, spec)?;
            None
        }
        TechnologyModel::OceanBattery => Some(add_ocean_battery(&mut block, spec)?),
        _ => None,
    };

    let relaxed = if relaxation.enabled {
        relax_block(&mut block, relaxation.fallback_big_m)?
    } else {
        0
    };

    let summary = block.summary();
    info!(
        technology = %spec.name,
        model = %spec.technology_model,
        variables = summary.variables,
        constraints = summary.constraints,
        disjunctions = summary.disjunctions,
        relaxed,
        warnings = diagnostics.warning_count(),
        "constructed technology"
    );

    Ok(ConstructedTechnology {
        name: spec.name.clone(),
        block,
        states,
        ocean_battery,
        relaxed,
        diagnostics,
    })
}

/// Build every technology of the model.
///
/// Technologies are independent and are built in parallel when the
/// `parallel` feature is enabled. Returns an error as soon as one technology
/// fails; no partial result is handed back.
pub fn construct_all(model: &ModelConfig) -> EhubResult<(Vec<ConstructedTechnology>, Diagnostics)> {
    model.check_names()?;
    let time = model.time_index()?;
    let relaxation = &model.relaxation;

    #[cfg(feature = "parallel")]
    let built: EhubResult<Vec<ConstructedTechnology>> = model
        .technologies
        .par_iter()
        .map(|spec| construct_technology(spec, &time, relaxation))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let built: EhubResult<Vec<ConstructedTechnology>> = model
        .technologies
        .iter()
        .map(|spec| construct_technology(spec, &time, relaxation))
        .collect();
    let built = built?;

    let mut diagnostics = Diagnostics::new();
    for tech in &built {
        diagnostics.merge(tech.diagnostics.clone());
    }
    info!(
        technologies = built.len(),
        horizon = time.len(),
        "{}",
        diagnostics.summary()
    );
    Ok((built, diagnostics))
}
