//! Named linear constraints in normal form `expr (≤ | ≥ | =) 0`.

use crate::expr::LinExpr;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sense::Le => write!(f, "<="),
            Sense::Ge => write!(f, ">="),
            Sense::Eq => write!(f, "=="),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub name: String,
    pub expr: LinExpr,
    pub sense: Sense,
}

impl LinearConstraint {
    pub fn new(name: impl Into<String>, expr: LinExpr, sense: Sense) -> Self {
        Self {
            name: name.into(),
            expr,
            sense,
        }
    }

    /// `lhs <= rhs`
    pub fn le(name: impl Into<String>, lhs: impl Into<LinExpr>, rhs: impl Into<LinExpr>) -> Self {
        Self::new(name, lhs.into() - rhs.into(), Sense::Le)
    }

    /// `lhs >= rhs`
    pub fn ge(name: impl Into<String>, lhs: impl Into<LinExpr>, rhs: impl Into<LinExpr>) -> Self {
        Self::new(name, lhs.into() - rhs.into(), Sense::Ge)
    }

    /// `lhs == rhs`
    pub fn eq(name: impl Into<String>, lhs: impl Into<LinExpr>, rhs: impl Into<LinExpr>) -> Self {
        Self::new(name, lhs.into() - rhs.into(), Sense::Eq)
    }

    /// Signed violation for an assignment; zero when satisfied.
    pub fn violation(&self, values: &[f64]) -> f64 {
        let v = self.expr.evaluate(values);
        match self.sense {
            Sense::Le => v.max(0.0),
            Sense::Ge => (-v).max(0.0),
            Sense::Eq => v.abs(),
        }
    }

    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        self.violation(values) <= tolerance
    }
}

impl fmt::Display for LinearConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {} 0", self.name, self.expr, self.sense)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::VariableArena;
    use crate::expr::VarDomain;

    #[test]
    fn test_normal_form_and_violation() {
        let mut vars = VariableArena::new();
        let x = vars.add("x", VarDomain::Continuous, 0.0, 10.0);

        let c = LinearConstraint::le("cap", x, 4.0);
        assert!(c.is_satisfied(&[4.0], 1e-9));
        assert!((c.violation(&[6.0]) - 2.0).abs() < 1e-12);

        let c = LinearConstraint::ge("floor", x, 4.0);
        assert!(!c.is_satisfied(&[3.0], 1e-9));

        let c = LinearConstraint::eq("pin", 2.0 * x, 4.0);
        assert!(c.is_satisfied(&[2.0], 1e-9));
        assert!((c.violation(&[1.0]) - 2.0).abs() < 1e-12);
    }
}
