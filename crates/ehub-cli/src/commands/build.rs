use anyhow::Result;
use ehub_algo::construct_all;
use ehub_core::block::BlockSummary;
use ehub_core::Diagnostics;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use tabwriter::TabWriter;

use super::{load_model, write_json};

#[derive(Debug, Serialize)]
struct BuildReport {
    steps: usize,
    technologies: Vec<TechnologyReport>,
    diagnostics: Diagnostics,
}

#[derive(Debug, Serialize)]
struct TechnologyReport {
    name: String,
    technology_model: String,
    relaxed_disjunctions: usize,
    #[serde(flatten)]
    summary: BlockSummary,
}

pub fn handle(path: &Path, json: Option<&Path>, no_relax: bool) -> Result<()> {
    let mut model = load_model(path)?;
    if no_relax {
        model.relaxation.enabled = false;
    }
    let (built, diagnostics) = construct_all(&model)?;

    let report = BuildReport {
        steps: model.horizon.steps,
        technologies: built
            .iter()
            .zip(&model.technologies)
            .map(|(tech, spec)| TechnologyReport {
                name: tech.name.clone(),
                technology_model: spec.technology_model.to_string(),
                relaxed_disjunctions: tech.relaxed,
                summary: tech.block.summary(),
            })
            .collect(),
        diagnostics,
    };

    print_table(&report)?;
    for issue in &report.diagnostics.issues {
        println!("{}", issue);
    }
    if let Some(out) = json {
        write_json(out, &report)?;
        println!("Report written to {}", out.display());
    }
    Ok(())
}

fn print_table(report: &BuildReport) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "TECHNOLOGY\tMODEL\tVARIABLES\tINTEGER\tCONSTRAINTS\tDISJUNCTIONS\tRELAXED")?;
    for tech in &report.technologies {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            tech.name,
            tech.technology_model,
            tech.summary.variables,
            tech.summary.integer_variables,
            tech.summary.constraints + tech.summary.relaxed_constraints,
            tech.summary.disjunctions,
            tech.relaxed_disjunctions
        )?;
    }
    writer.flush()?;
    Ok(())
}
