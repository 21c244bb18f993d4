//! Startup/shutdown dynamics of conversion technologies.
//!
//! [`logic`] declares the state indicators `x` (on), `y` (startup) and
//! `z` (shutdown) and the transition rules between them. [`ramp`] uses those
//! indicators to limit load around startups and shutdowns, either with
//! load-limit disjunctions (fast dynamics, no ramp steps) or with full
//! startup/shutdown trajectories (slow dynamics).

pub mod logic;
pub mod ramp;

pub use logic::{add_state_logic, StateIndicators};
pub use ramp::{add_fast_dynamics, add_ramping_limit, add_slow_dynamics, trajectories};
