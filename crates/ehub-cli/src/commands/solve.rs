use anyhow::{anyhow, bail, Context, Result};
use ehub_algo::construct_technology;
use ehub_algo::export::LpExport;
use ehub_core::{CarrierId, LinExpr, LinearConstraint, RelaxationConfig, VarId};
use serde::Serialize;
use std::path::Path;

use super::{load_model, write_json};

#[derive(Debug, Serialize)]
struct SolveReport {
    technology: String,
    carrier: String,
    demand: f64,
    size: f64,
    objective: f64,
    output: Vec<f64>,
}

/// Minimise the technology's capex (or size, when it has no capex term)
/// subject to `Σ_t output[t, carrier] ≥ demand`, with integrality relaxed.
pub fn handle(
    path: &Path,
    technology: &str,
    carrier: &str,
    demand: f64,
    json: Option<&Path>,
) -> Result<()> {
    let model = load_model(path)?;
    let time = model.time_index()?;
    let spec = model
        .technologies
        .iter()
        .find(|t| t.name == technology)
        .ok_or_else(|| anyhow!("technology '{}' not found in {}", technology, path.display()))?;
    let relaxation = RelaxationConfig {
        enabled: true,
        fallback_big_m: model.relaxation.fallback_big_m,
    };
    let built = construct_technology(spec, &time, &relaxation)?;
    let block = &built.block;

    let carrier_id = CarrierId::new(carrier);
    if !block.output_carriers().contains(&carrier_id) {
        bail!("{} has no output carrier '{}'", technology, carrier);
    }
    let outputs: Vec<VarId> = time
        .steps()
        .map(|t| block.output(t, &carrier_id))
        .collect::<Option<_>>()
        .context("output variables missing")?;
    let total: LinExpr = outputs.iter().sum();

    let export = LpExport::from_block(block, true)?
        .with_constraint(&LinearConstraint::ge("demand", total, demand));
    let objective = LinExpr::from(block.scalar("capex").unwrap_or(block.size()));
    let solution = export.solve_clarabel(&objective)?;

    let report = SolveReport {
        technology: technology.to_string(),
        carrier: carrier.to_string(),
        demand,
        size: solution.value(block.size()),
        objective: solution.objective,
        output: outputs.iter().map(|v| solution.value(*v)).collect(),
    };
    println!("Technology: {}", report.technology);
    println!("Size: {:.4}", report.size);
    println!("Objective: {:.4}", report.objective);
    for (t, value) in time.steps().zip(&report.output) {
        println!("  output[{}] = {:.4}", t, value);
    }
    if let Some(out) = json {
        write_json(out, &report)?;
        println!("Solution written to {}", out.display());
    }
    Ok(())
}
