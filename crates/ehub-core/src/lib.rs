//! # ehub-core: Energy-Hub Technology Modeling Core
//!
//! Data structures shared by the constraint engines in `ehub-algo`.
//!
//! ## Design Philosophy
//!
//! Every technology owns a [`TechnologyBlock`]: a self-contained sub-model
//! holding its decision variables, plain linear constraints and disjunctions.
//! Constraints are kept symbolic ([`LinExpr`]) until export so that:
//! - the big-M relaxation can derive bounding constants from variable bounds
//! - constructed blocks can be checked against a candidate assignment without a solver
//! - technologies can be built independently (and in parallel)
//!
//! ## Quick Start
//!
//! ```rust
//! use ehub_core::block::{FlowBounds, SizeBounds, TechnologyBlock};
//! use ehub_core::{CarrierId, LinearConstraint, TimeIndex};
//!
//! let mut block = TechnologyBlock::new(
//!     "boiler",
//!     TimeIndex::new(24).unwrap(),
//!     vec![CarrierId::new("gas")],
//!     vec![CarrierId::new("heat")],
//!     SizeBounds { min: 0.0, max: 10.0, integer: false },
//!     FlowBounds { input_max: 10.0, output_max: 9.0 },
//! );
//!
//! for t in block.time().steps().collect::<Vec<_>>() {
//!     let cap = LinearConstraint::le(format!("cap[{}]", t), block.total_input(t), block.size());
//!     block.add_constraint(cap);
//! }
//! assert_eq!(block.constraints().len(), 24);
//! ```
//!
//! ## Modules
//!
//! - [`time`] - 1-based cyclic time index
//! - [`expr`] / [`constraint`] - linear expressions and named constraints
//! - [`disjunction`] - one-of-N constraint groups with per-group relaxation status
//! - [`block`] - technology sub-models and their variable arena
//! - [`technology`] - technology specifications and fitted performance data
//! - [`config`] - model files (YAML/JSON)
//! - [`diagnostics`] - configuration warnings

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod block;
pub mod config;
pub mod constraint;
pub mod diagnostics;
pub mod disjunction;
pub mod error;
pub mod expr;
pub mod technology;
pub mod time;

pub use block::{SubBlock, TechnologyBlock, VariableArena};
pub use config::{load_model_from_path, ModelConfig, RelaxationConfig};
pub use constraint::{LinearConstraint, Sense};
pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use disjunction::{Disjunct, Disjunction, Mode, RelaxationStatus};
pub use error::{EhubError, EhubResult};
pub use expr::{LinExpr, VarDomain, VarId};
pub use technology::{PerformanceFit, PerformanceFunction, TechnologyModel, TechnologySpec};
pub use time::{TimeIndex, TimeStep};

/// Energy or material carrier (e.g. `electricity`, `heat`, `gas`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CarrierId(String);

impl CarrierId {
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        CarrierId(name.into())
    }
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CarrierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CarrierId {
    fn from(name: &str) -> Self {
        CarrierId::new(name)
    }
}
