//! Simple storage recursion.
//!
//! One carrier, stored with charging efficiency `η_in`, discharging
//! efficiency `η_out`, self-discharge `λ` and an ambient loss series `θ`:
//!
//! ```text
//! level[t] = level[p]·(1 − λ) − θ[t]·level[p] + η_in·input[t] − output[t]/η_out
//! ```
//!
//! where `p` is the cyclic predecessor of `t`, so the first step continues
//! from the last one.

use ehub_core::disjunction::{Disjunction, Mode};
use ehub_core::technology::TechnologySpec;
use ehub_core::{EhubError, EhubResult, LinearConstraint, TechnologyBlock, VarDomain, VarId};
use tracing::debug;

pub fn add_storage(block: &mut TechnologyBlock, spec: &TechnologySpec) -> EhubResult<Vec<VarId>> {
    let name = spec.name.as_str();
    let coeff = spec
        .storage
        .as_ref()
        .ok_or_else(|| EhubError::config(name, "storage coefficients missing"))?;
    let time = block.time().clone();
    let ambient_loss = if coeff.ambient_loss.is_empty() {
        vec![0.0; time.len()]
    } else if coeff.ambient_loss.len() == time.len() {
        coeff.ambient_loss.clone()
    } else {
        return Err(EhubError::SeriesLength {
            technology: name.to_string(),
            series: "ambient_loss",
            expected: time.len(),
            found: coeff.ambient_loss.len(),
        });
    };
    let carrier = block
        .input_carriers()
        .first()
        .cloned()
        .ok_or_else(|| EhubError::config(name, "storage needs one carrier"))?;

    let size = block.size();
    let level = block.add_series("level", VarDomain::Continuous, 0.0, spec.size_max);

    for t in time.steps() {
        let p = time.previous(t);
        let input = block
            .input(t, &carrier)
            .ok_or_else(|| EhubError::config(name, "storage input missing"))?;
        let output = block
            .output(t, &carrier)
            .ok_or_else(|| EhubError::config(name, "storage output missing"))?;
        let retained = 1.0 - coeff.lambda - ambient_loss[t.index()];

        block.add_constraint(LinearConstraint::le(
            format!("level_max[{}]", t),
            level[t.index()],
            size,
        ));
        block.add_constraint(LinearConstraint::eq(
            format!("level[{}]", t),
            level[t.index()],
            retained * level[p.index()] + coeff.eta_in * input - (1.0 / coeff.eta_out) * output,
        ));
        block.add_constraint(LinearConstraint::le(
            format!("charge_max[{}]", t),
            input,
            coeff.eta_in * size,
        ));
        block.add_constraint(LinearConstraint::le(
            format!("discharge_max[{}]", t),
            output,
            coeff.eta_out * size,
        ));

        if coeff.allow_only_one_direction {
            block.add_disjunction(
                Disjunction::new(format!("direction[{}]", t))
                    .with(
                        Mode::Charging,
                        vec![LinearConstraint::eq(format!("no_discharge[{}]", t), output, 0.0)],
                    )
                    .with(
                        Mode::Discharging,
                        vec![LinearConstraint::eq(format!("no_charge[{}]", t), input, 0.0)],
                    ),
            );
        }
    }
    debug!(
        technology = %name,
        eta_in = coeff.eta_in,
        eta_out = coeff.eta_out,
        lambda = coeff.lambda,
        "added storage recursion"
    );
    Ok(level)
}
