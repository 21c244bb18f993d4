//! Big-M relaxation of disjunctions.
//!
//! Each disjunction `∨_i D_i` is rewritten with one binary indicator `b_i` per
//! alternative and `Σ b_i = 1`. Every constraint of alternative `i` is
//! deactivated when `b_i = 0`:
//!
//! ```text
//! e ≤ 0   →   e ≤ M⁺·(1 − b_i)        M⁺ = max e over the variable bounds
//! e ≥ 0   →   e ≥ M⁻·(1 − b_i)        M⁻ = min e over the variable bounds
//! e = 0   →   both of the above
//! ```
//!
//! A side whose bound already implies the constraint (`M⁺ ≤ 0` or `M⁻ ≥ 0`)
//! needs no big-M row and is dropped. An infinite bound takes the configured
//! fallback, or fails with [`EhubError::UnboundedBigM`].
//!
//! The pass only touches disjunctions whose status is `Pending`, so running it
//! again over a block is a no-op.

use ehub_core::constraint::{LinearConstraint, Sense};
use ehub_core::disjunction::Disjunction;
use ehub_core::{EhubError, EhubResult, LinExpr, TechnologyBlock, VarDomain, VariableArena};
use tracing::debug;

/// Big-M constants for one constraint; `None` marks a redundant side.
#[derive(Debug, Clone, Copy)]
struct BigM {
    upper: Option<f64>,
    lower: Option<f64>,
}

fn finite_or_fallback(bound: f64, fallback: Option<f64>, constraint: &str) -> EhubResult<f64> {
    if bound.is_finite() {
        return Ok(bound);
    }
    match fallback {
        Some(m) => Ok(if bound > 0.0 { m } else { -m }),
        None => Err(EhubError::UnboundedBigM {
            constraint: constraint.to_string(),
        }),
    }
}

fn big_m_for(
    constraint: &LinearConstraint,
    vars: &VariableArena,
    fallback: Option<f64>,
) -> EhubResult<BigM> {
    let (lo, hi) = constraint.expr.bounds(vars);
    let needs_upper = matches!(constraint.sense, Sense::Le | Sense::Eq) && hi > 0.0;
    let needs_lower = matches!(constraint.sense, Sense::Ge | Sense::Eq) && lo < 0.0;
    Ok(BigM {
        upper: if needs_upper {
            Some(finite_or_fallback(hi, fallback, &constraint.name)?)
        } else {
            None
        },
        lower: if needs_lower {
            Some(finite_or_fallback(lo, fallback, &constraint.name)?)
        } else {
            None
        },
    })
}

/// Relax one disjunction in place.
///
/// Returns `false` when the disjunction was already relaxed. On error the
/// disjunction stays `Pending` and the arena is left untouched.
pub fn relax_disjunction(
    vars: &mut VariableArena,
    disjunction: &mut Disjunction,
    fallback_big_m: Option<f64>,
) -> EhubResult<bool> {
    if !disjunction.is_pending() {
        return Ok(false);
    }

    let constants = disjunction
        .disjuncts()
        .iter()
        .map(|d| {
            d.constraints
                .iter()
                .map(|c| big_m_for(c, vars, fallback_big_m))
                .collect::<EhubResult<Vec<_>>>()
        })
        .collect::<EhubResult<Vec<_>>>()?;

    let indicators: Vec<_> = disjunction
        .modes()
        .map(|mode| vars.add(format!("{}.{}", disjunction.name, mode), VarDomain::Binary, 0.0, 1.0))
        .collect();

    let mut relaxed = vec![LinearConstraint::eq(
        format!("{}.select", disjunction.name),
        indicators.iter().sum::<LinExpr>(),
        1.0,
    )];

    for ((disjunct, b), ms) in disjunction
        .disjuncts()
        .iter()
        .zip(indicators.iter().copied())
        .zip(&constants)
    {
        for (c, m) in disjunct.constraints.iter().zip(ms) {
            let prefix = format!("{}.{}.{}", disjunction.name, disjunct.mode, c.name);
            if let Some(m_up) = m.upper {
                // e ≤ M⁺(1 − b)
                relaxed.push(LinearConstraint::new(
                    format!("{}.ub", prefix),
                    c.expr.clone() + m_up * b - m_up,
                    Sense::Le,
                ));
            }
            if let Some(m_lo) = m.lower {
                // e ≥ M⁻(1 − b)
                relaxed.push(LinearConstraint::new(
                    format!("{}.lb", prefix),
                    c.expr.clone() + m_lo * b - m_lo,
                    Sense::Ge,
                ));
            }
        }
    }

    debug!(
        disjunction = %disjunction.name,
        alternatives = indicators.len(),
        constraints = relaxed.len(),
        "relaxed disjunction"
    );
    disjunction.complete_relaxation(indicators, relaxed);
    Ok(true)
}

/// Relax every pending disjunction of a block and its sub-blocks.
///
/// Returns the number of disjunctions transformed by this call.
pub fn relax_block(block: &mut TechnologyBlock, fallback_big_m: Option<f64>) -> EhubResult<usize> {
    let (vars, disjunctions) = block.relaxation_parts();
    let mut count = 0;
    for disjunction in disjunctions {
        if relax_disjunction(vars, disjunction, fallback_big_m)? {
            count += 1;
        }
    }
    Ok(count)
}
