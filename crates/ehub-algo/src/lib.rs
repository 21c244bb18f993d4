//! # ehub-algo: Constraint Engines for Energy-Hub Technologies
//!
//! This crate turns a [`TechnologySpec`](ehub_core::TechnologySpec) into the
//! variables, constraints and disjunctions of its technology block.
//!
//! ## Engines
//!
//! | Module | Builds | Technology models |
//! |--------|--------|-------------------|
//! | [`performance`] | input/output relations, curtailment, part load | RES, CONV1-3 |
//! | [`storage`] | cyclic level recursion | STOR |
//! | [`dynamics`] | startup/shutdown logic, load limits, trajectories | CONV1-3 |
//! | [`ocean_battery`] | reservoir with pump and turbine slots | OCEAN_BATTERY |
//! | [`relax`] | big-M reformulation of every disjunction | all |
//!
//! [`construct`] runs the engines in order for one technology or a whole
//! model. [`clustering`] links full-resolution series to clustered ones and
//! [`export`] hands a relaxed block to `good_lp`.
//!
//! ## Example
//!
//! ```ignore
//! use ehub_algo::construct_all;
//! use ehub_core::load_model_from_path;
//!
//! let model = load_model_from_path("hub.yaml".as_ref())?;
//! let (technologies, diagnostics) = construct_all(&model)?;
//! for tech in &technologies {
//!     println!("{}: {:?}", tech.name, tech.block.summary());
//! }
//! println!("{}", diagnostics.summary());
//! ```

pub mod bounds;
pub mod clustering;
pub mod construct;
pub mod dynamics;
pub mod export;
pub mod ocean_battery;
pub mod performance;
pub mod relax;
pub mod storage;

pub use bounds::{flow_bounds, size_bounds};
pub use clustering::link_full_resolution_to_clustered;
pub use construct::{construct_all, construct_technology, ConstructedTechnology};
pub use dynamics::StateIndicators;
pub use export::{LpExport, LpSolution};
pub use ocean_battery::{add_ocean_battery, OceanBatteryVariables};
pub use performance::compile_performance;
pub use relax::{relax_block, relax_disjunction};
pub use storage::add_storage;

use ehub_core::Diagnostics;

/// Log a configuration warning and keep it for the caller.
pub(crate) fn record_warning(
    diagnostics: &mut Diagnostics,
    category: &str,
    technology: &str,
    message: &str,
) {
    tracing::warn!(technology = %technology, category = %category, "{}", message);
    diagnostics.add_warning_with_entity(category, message, technology);
}
