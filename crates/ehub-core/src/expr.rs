//! Linear expressions over technology variables.
//!
//! The engines build constraints symbolically so that the big-M relaxation
//! can inspect coefficients and variable bounds before anything reaches a
//! solver. Expressions support the usual operators:
//!
//! ```
//! use ehub_core::block::VariableArena;
//! use ehub_core::expr::{LinExpr, VarDomain};
//!
//! let mut vars = VariableArena::new();
//! let x = vars.add("x", VarDomain::Continuous, 0.0, 10.0);
//! let y = vars.add("y", VarDomain::Continuous, 0.0, 5.0);
//!
//! let e: LinExpr = 2.0 * x - y + 1.0;
//! assert_eq!(e.evaluate(&[3.0, 4.0]), 3.0);
//! assert_eq!(e.bounds(&vars), (-4.0, 21.0));
//! ```

use crate::block::VariableArena;
use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Handle to a variable in a [`VariableArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    pub(crate) fn new(index: usize) -> Self {
        VarId(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Domain of a decision variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarDomain {
    Continuous,
    Integer,
    /// Integer restricted to {0, 1}
    Binary,
}

/// `Σ coef·var + constant`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinExpr {
    terms: BTreeMap<VarId, f64>,
    constant: f64,
}

impl LinExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_constant(constant: f64) -> Self {
        Self {
            terms: BTreeMap::new(),
            constant,
        }
    }

    /// Add `coef·var`, merging with an existing term for the same variable.
    pub fn add_term(&mut self, var: VarId, coef: f64) {
        let entry = self.terms.entry(var).or_insert(0.0);
        *entry += coef;
        if *entry == 0.0 {
            self.terms.remove(&var);
        }
    }

    pub fn terms(&self) -> impl Iterator<Item = (VarId, f64)> + '_ {
        self.terms.iter().map(|(v, c)| (*v, *c))
    }

    pub fn coefficient(&self, var: VarId) -> f64 {
        self.terms.get(&var).copied().unwrap_or(0.0)
    }

    pub fn constant_term(&self) -> f64 {
        self.constant
    }

    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Value of the expression for a full assignment indexed by [`VarId::index`].
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(v, c)| c * values[v.index()])
            .sum::<f64>()
            + self.constant
    }

    /// Smallest and largest value the expression can take within variable bounds.
    pub fn bounds(&self, vars: &VariableArena) -> (f64, f64) {
        let mut lo = self.constant;
        let mut hi = self.constant;
        for (var, coef) in self.terms() {
            let def = vars.get(var);
            if coef > 0.0 {
                lo += coef * def.lower;
                hi += coef * def.upper;
            } else {
                lo += coef * def.upper;
                hi += coef * def.lower;
            }
        }
        (lo, hi)
    }

    fn scale(mut self, factor: f64) -> Self {
        if factor == 0.0 {
            return LinExpr::new();
        }
        for coef in self.terms.values_mut() {
            *coef *= factor;
        }
        self.constant *= factor;
        self
    }
}

impl fmt::Display for LinExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (var, coef) in self.terms() {
            if first {
                write!(f, "{}·v{}", coef, var.index())?;
                first = false;
            } else if coef < 0.0 {
                write!(f, " - {}·v{}", -coef, var.index())?;
            } else {
                write!(f, " + {}·v{}", coef, var.index())?;
            }
        }
        if first {
            write!(f, "{}", self.constant)
        } else if self.constant != 0.0 {
            write!(f, " + {}", self.constant)
        } else {
            Ok(())
        }
    }
}

impl From<VarId> for LinExpr {
    fn from(var: VarId) -> Self {
        let mut expr = LinExpr::new();
        expr.add_term(var, 1.0);
        expr
    }
}

impl From<f64> for LinExpr {
    fn from(constant: f64) -> Self {
        LinExpr::from_constant(constant)
    }
}

impl<T: Into<LinExpr>> AddAssign<T> for LinExpr {
    fn add_assign(&mut self, rhs: T) {
        let rhs = rhs.into();
        for (var, coef) in rhs.terms() {
            self.add_term(var, coef);
        }
        self.constant += rhs.constant;
    }
}

impl<T: Into<LinExpr>> SubAssign<T> for LinExpr {
    fn sub_assign(&mut self, rhs: T) {
        *self += rhs.into().scale(-1.0);
    }
}

impl<T: Into<LinExpr>> Add<T> for LinExpr {
    type Output = LinExpr;

    fn add(mut self, rhs: T) -> LinExpr {
        self += rhs;
        self
    }
}

impl<T: Into<LinExpr>> Sub<T> for LinExpr {
    type Output = LinExpr;

    fn sub(mut self, rhs: T) -> LinExpr {
        self -= rhs;
        self
    }
}

impl<T: Into<LinExpr>> Add<T> for VarId {
    type Output = LinExpr;

    fn add(self, rhs: T) -> LinExpr {
        LinExpr::from(self) + rhs
    }
}

impl<T: Into<LinExpr>> Sub<T> for VarId {
    type Output = LinExpr;

    fn sub(self, rhs: T) -> LinExpr {
        LinExpr::from(self) - rhs
    }
}

impl Add<VarId> for f64 {
    type Output = LinExpr;

    fn add(self, rhs: VarId) -> LinExpr {
        LinExpr::from_constant(self) + rhs
    }
}

impl Sub<VarId> for f64 {
    type Output = LinExpr;

    fn sub(self, rhs: VarId) -> LinExpr {
        LinExpr::from_constant(self) - rhs
    }
}

impl Sub<LinExpr> for f64 {
    type Output = LinExpr;

    fn sub(self, rhs: LinExpr) -> LinExpr {
        LinExpr::from_constant(self) - rhs
    }
}

impl Neg for LinExpr {
    type Output = LinExpr;

    fn neg(self) -> LinExpr {
        self.scale(-1.0)
    }
}

impl Mul<f64> for LinExpr {
    type Output = LinExpr;

    fn mul(self, rhs: f64) -> LinExpr {
        self.scale(rhs)
    }
}

impl Mul<LinExpr> for f64 {
    type Output = LinExpr;

    fn mul(self, rhs: LinExpr) -> LinExpr {
        rhs.scale(self)
    }
}

impl Mul<VarId> for f64 {
    type Output = LinExpr;

    fn mul(self, rhs: VarId) -> LinExpr {
        let mut expr = LinExpr::new();
        expr.add_term(rhs, self);
        expr
    }
}

impl Mul<f64> for VarId {
    type Output = LinExpr;

    fn mul(self, rhs: f64) -> LinExpr {
        rhs * self
    }
}

impl Sum<LinExpr> for LinExpr {
    fn sum<I: Iterator<Item = LinExpr>>(iter: I) -> Self {
        iter.fold(LinExpr::new(), |acc, e| acc + e)
    }
}

impl Sum<VarId> for LinExpr {
    fn sum<I: Iterator<Item = VarId>>(iter: I) -> Self {
        iter.fold(LinExpr::new(), |acc, v| acc + v)
    }
}

impl<'a> Sum<&'a VarId> for LinExpr {
    fn sum<I: Iterator<Item = &'a VarId>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> (VariableArena, VarId, VarId) {
        let mut vars = VariableArena::new();
        let a = vars.add("a", VarDomain::Continuous, 0.0, 4.0);
        let b = vars.add("b", VarDomain::Continuous, -1.0, 1.0);
        (vars, a, b)
    }

    #[test]
    fn test_terms_merge_and_cancel() {
        let (_, a, b) = arena();
        let e = a + b - a;
        assert_eq!(e.coefficient(a), 0.0);
        assert_eq!(e.coefficient(b), 1.0);
        assert_eq!(e.terms().count(), 1);
    }

    #[test]
    fn test_scaling_and_constants() {
        let (_, a, b) = arena();
        let e = 3.0 * (a - 2.0 * b) + 5.0;
        assert_eq!(e.coefficient(a), 3.0);
        assert_eq!(e.coefficient(b), -6.0);
        assert_eq!(e.constant_term(), 5.0);
        assert_eq!(e.evaluate(&[1.0, 1.0]), 2.0);
    }

    #[test]
    fn test_bounds_follow_coefficient_sign() {
        let (vars, a, b) = arena();
        let e = 2.0 * a - 3.0 * b;
        assert_eq!(e.bounds(&vars), (-3.0, 11.0));
    }

    #[test]
    fn test_bounds_ignore_cancelled_unbounded_terms() {
        let mut vars = VariableArena::new();
        let free = vars.add("free", VarDomain::Continuous, f64::NEG_INFINITY, f64::INFINITY);
        let e = free - free + 2.0;
        assert_eq!(e.bounds(&vars), (2.0, 2.0));
    }

    #[test]
    fn test_sum_of_variables() {
        let (_, a, b) = arena();
        let e: LinExpr = [a, b].iter().sum();
        assert_eq!(e.evaluate(&[2.0, 3.0]), 5.0);
        let zero: LinExpr = std::iter::empty::<VarId>().sum();
        assert!(zero.is_constant());
    }
}
