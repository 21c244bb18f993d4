//! Time index shared by every technology sub-model.
//!
//! Time steps are 1-based so that the constraint algebra reads like the
//! model equations (`t = 1 .. N`). The index is cyclic: the predecessor of
//! step 1 is step N, which is how storage levels close their cycle.

use crate::error::{EhubError, EhubResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 1-based time step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeStep(usize);

impl TimeStep {
    pub fn new(step: usize) -> Self {
        debug_assert!(step >= 1, "time steps are 1-based");
        TimeStep(step)
    }

    pub fn value(&self) -> usize {
        self.0
    }

    /// Zero-based position, for indexing per-step vectors.
    pub fn index(&self) -> usize {
        self.0 - 1
    }
}

impl fmt::Display for TimeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered, cyclic sequence of time steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeIndex {
    len: usize,
    averaged_steps: usize,
}

impl TimeIndex {
    /// Create an index with `len` steps, each representing one real step.
    pub fn new(len: usize) -> EhubResult<Self> {
        if len == 0 {
            return Err(EhubError::Parse("time horizon must have at least one step".into()));
        }
        Ok(Self {
            len,
            averaged_steps: 1,
        })
    }

    /// Number of real time steps each step of this index stands for.
    pub fn with_averaged_steps(mut self, averaged_steps: usize) -> EhubResult<Self> {
        if averaged_steps == 0 {
            return Err(EhubError::Parse("averaged_steps must be at least 1".into()));
        }
        self.averaged_steps = averaged_steps;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn averaged_steps(&self) -> usize {
        self.averaged_steps
    }

    pub fn first(&self) -> TimeStep {
        TimeStep(1)
    }

    pub fn last(&self) -> TimeStep {
        TimeStep(self.len)
    }

    pub fn steps(&self) -> impl Iterator<Item = TimeStep> + Clone {
        (1..=self.len).map(TimeStep)
    }

    pub fn contains(&self, step: TimeStep) -> bool {
        (1..=self.len).contains(&step.0)
    }

    /// Cyclic predecessor: step 1 wraps to the last step.
    pub fn previous(&self, step: TimeStep) -> TimeStep {
        if step.0 <= 1 {
            self.last()
        } else {
            TimeStep(step.0 - 1)
        }
    }

    /// Non-cyclic predecessor; `None` for the first step.
    pub fn predecessor(&self, step: TimeStep) -> Option<TimeStep> {
        self.shift(step, -1)
    }

    /// Move `delta` steps without wrapping; `None` outside the horizon.
    pub fn shift(&self, step: TimeStep, delta: isize) -> Option<TimeStep> {
        let target = step.0 as isize + delta;
        if target >= 1 && target <= self.len as isize {
            Some(TimeStep(target as usize))
        } else {
            None
        }
    }

    /// Steps `from..=to` clipped to the horizon.
    pub fn window(&self, from: isize, to: isize) -> impl Iterator<Item = TimeStep> {
        let lo = from.max(1);
        let hi = to.min(self.len as isize);
        (lo..=hi).map(|s| TimeStep(s as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_previous_wraps_to_last() {
        let time = TimeIndex::new(4).unwrap();
        assert_eq!(time.previous(TimeStep::new(1)), TimeStep::new(4));
        assert_eq!(time.previous(TimeStep::new(3)), TimeStep::new(2));
    }

    #[test]
    fn test_previous_is_injective() {
        let time = TimeIndex::new(6).unwrap();
        let mut seen: Vec<usize> = time.steps().map(|t| time.previous(t).value()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (1..=6).collect::<Vec<_>>());
    }

    #[test]
    fn test_predecessor_does_not_wrap() {
        let time = TimeIndex::new(3).unwrap();
        assert_eq!(time.predecessor(TimeStep::new(1)), None);
        assert_eq!(time.predecessor(TimeStep::new(2)), Some(TimeStep::new(1)));
    }

    #[test]
    fn test_shift_and_window_clip_to_horizon() {
        let time = TimeIndex::new(5).unwrap();
        assert_eq!(time.shift(TimeStep::new(4), 2), None);
        assert_eq!(time.shift(TimeStep::new(4), 1), Some(TimeStep::new(5)));

        let window: Vec<usize> = time.window(-1, 2).map(|t| t.value()).collect();
        assert_eq!(window, vec![1, 2]);
        let window: Vec<usize> = time.window(4, 9).map(|t| t.value()).collect();
        assert_eq!(window, vec![4, 5]);
    }

    #[test]
    fn test_empty_horizon_rejected() {
        assert!(TimeIndex::new(0).is_err());
        assert!(TimeIndex::new(2).unwrap().with_averaged_steps(0).is_err());
    }
}
