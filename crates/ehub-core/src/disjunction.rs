//! Disjunctive constraint groups.
//!
//! A [`Disjunction`] is a "one of N" choice between alternative constraint
//! sets. Each alternative is tagged with the operating [`Mode`] it stands
//! for. Disjunctions are built in their logical form and later rewritten by
//! the big-M pass in `ehub-algo`. Every disjunction carries its own
//! [`RelaxationStatus`], so relaxing twice is a no-op and blocks built on
//! different threads never share state.

use crate::constraint::LinearConstraint;
use crate::expr::VarId;
use std::fmt;

/// Operating mode selected by one alternative of a disjunction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Technology off: all flows zero
    Off,
    /// Technology on, single operating line
    On,
    /// Technology on within curve segment `i` (1-based)
    Segment(usize),
    /// No startup event at this step
    NoStartup,
    /// Startup event at this step
    Startup,
    NoShutdown,
    Shutdown,
    /// `k`-th step (1-based) of the startup trajectory
    StartingUp(usize),
    /// `k`-th step (1-based) of the shutdown trajectory
    ShuttingDown(usize),
    Charging,
    Discharging,
    /// Component slot left empty
    SlotUnused,
    /// Component slot filled with archetype `i` (1-based)
    SlotArchetype(usize),
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Off => write!(f, "off"),
            Mode::On => write!(f, "on"),
            Mode::Segment(i) => write!(f, "segment{}", i),
            Mode::NoStartup => write!(f, "no_startup"),
            Mode::Startup => write!(f, "startup"),
            Mode::NoShutdown => write!(f, "no_shutdown"),
            Mode::Shutdown => write!(f, "shutdown"),
            Mode::StartingUp(k) => write!(f, "starting_up{}", k),
            Mode::ShuttingDown(k) => write!(f, "shutting_down{}", k),
            Mode::Charging => write!(f, "charging"),
            Mode::Discharging => write!(f, "discharging"),
            Mode::SlotUnused => write!(f, "unused"),
            Mode::SlotArchetype(i) => write!(f, "archetype{}", i),
        }
    }
}

/// One alternative of a disjunction
#[derive(Debug, Clone)]
pub struct Disjunct {
    pub mode: Mode,
    pub constraints: Vec<LinearConstraint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelaxationStatus {
    /// Logical form only; must be relaxed before export
    Pending,
    /// Indicators and big-M constraints have been generated
    Relaxed,
}

#[derive(Debug, Clone)]
pub struct Disjunction {
    pub name: String,
    disjuncts: Vec<Disjunct>,
    status: RelaxationStatus,
    indicators: Vec<VarId>,
    relaxed: Vec<LinearConstraint>,
}

impl Disjunction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            disjuncts: Vec::new(),
            status: RelaxationStatus::Pending,
            indicators: Vec::new(),
            relaxed: Vec::new(),
        }
    }

    /// Add an alternative (builder style)
    pub fn with(mut self, mode: Mode, constraints: Vec<LinearConstraint>) -> Self {
        self.push(mode, constraints);
        self
    }

    pub fn push(&mut self, mode: Mode, constraints: Vec<LinearConstraint>) {
        self.disjuncts.push(Disjunct { mode, constraints });
    }

    pub fn disjuncts(&self) -> &[Disjunct] {
        &self.disjuncts
    }

    pub fn modes(&self) -> impl Iterator<Item = Mode> + '_ {
        self.disjuncts.iter().map(|d| d.mode)
    }

    pub fn disjunct(&self, mode: Mode) -> Option<&Disjunct> {
        self.disjuncts.iter().find(|d| d.mode == mode)
    }

    pub fn status(&self) -> RelaxationStatus {
        self.status
    }

    pub fn is_pending(&self) -> bool {
        self.status == RelaxationStatus::Pending
    }

    /// One indicator per disjunct, in disjunct order. Empty until relaxed.
    pub fn indicators(&self) -> &[VarId] {
        &self.indicators
    }

    pub fn indicator(&self, mode: Mode) -> Option<VarId> {
        self.disjuncts
            .iter()
            .position(|d| d.mode == mode)
            .and_then(|i| self.indicators.get(i).copied())
    }

    pub fn relaxed_constraints(&self) -> &[LinearConstraint] {
        &self.relaxed
    }

    /// Store the output of a relaxation pass and flip the status.
    ///
    /// # Panics
    ///
    /// Panics if the disjunction was already relaxed or if the indicator
    /// count does not match the number of disjuncts.
    pub fn complete_relaxation(&mut self, indicators: Vec<VarId>, relaxed: Vec<LinearConstraint>) {
        assert!(self.is_pending(), "disjunction {} relaxed twice", self.name);
        assert_eq!(indicators.len(), self.disjuncts.len());
        self.indicators = indicators;
        self.relaxed = relaxed;
        self.status = RelaxationStatus::Relaxed;
    }

    /// Modes whose constraint sets all hold for the assignment.
    pub fn satisfied_modes(&self, values: &[f64], tolerance: f64) -> Vec<Mode> {
        self.disjuncts
            .iter()
            .filter(|d| d.constraints.iter().all(|c| c.is_satisfied(values, tolerance)))
            .map(|d| d.mode)
            .collect()
    }

    /// Logical satisfaction: at least one alternative holds.
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        !self.satisfied_modes(values, tolerance).is_empty()
    }

    pub fn constraint_count(&self) -> usize {
        self.disjuncts.iter().map(|d| d.constraints.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::VariableArena;
    use crate::expr::VarDomain;

    #[test]
    fn test_satisfied_modes() {
        let mut vars = VariableArena::new();
        let x = vars.add("x", VarDomain::Continuous, 0.0, 10.0);

        let d = Disjunction::new("dis")
            .with(Mode::Off, vec![LinearConstraint::eq("off", x, 0.0)])
            .with(
                Mode::On,
                vec![
                    LinearConstraint::ge("lo", x, 2.0),
                    LinearConstraint::le("hi", x, 8.0),
                ],
            );

        assert_eq!(d.satisfied_modes(&[0.0], 1e-9), vec![Mode::Off]);
        assert_eq!(d.satisfied_modes(&[5.0], 1e-9), vec![Mode::On]);
        assert!(!d.is_satisfied(&[1.0], 1e-9));
        assert_eq!(d.constraint_count(), 3);
    }

    #[test]
    fn test_status_flips_once() {
        let mut vars = VariableArena::new();
        let b0 = vars.add("b0", VarDomain::Binary, 0.0, 1.0);
        let b1 = vars.add("b1", VarDomain::Binary, 0.0, 1.0);
        let mut d = Disjunction::new("dis")
            .with(Mode::Off, Vec::new())
            .with(Mode::On, Vec::new());
        assert!(d.is_pending());
        assert_eq!(d.indicator(Mode::On), None);

        d.complete_relaxation(vec![b0, b1], Vec::new());
        assert_eq!(d.status(), RelaxationStatus::Relaxed);
        assert_eq!(d.indicator(Mode::On), Some(b1));
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::Segment(2).to_string(), "segment2");
        assert_eq!(Mode::StartingUp(1).to_string(), "starting_up1");
        assert_eq!(Mode::SlotArchetype(1).to_string(), "archetype1");
    }
}
