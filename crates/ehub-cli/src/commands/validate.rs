use anyhow::{bail, Result};
use ehub_algo::construct_technology;
use ehub_core::{Diagnostics, RelaxationConfig};
use std::path::Path;

use super::load_model;

/// Validate every technology and dry-run its construction so that
/// configuration warnings are reported too.
pub fn handle(path: &Path) -> Result<()> {
    let model = load_model(path)?;
    model.check_names()?;
    let time = model.time_index()?;
    let dry_run = RelaxationConfig {
        enabled: false,
        fallback_big_m: model.relaxation.fallback_big_m,
    };

    let mut diagnostics = Diagnostics::new();
    for spec in &model.technologies {
        match construct_technology(spec, &time, &dry_run) {
            Ok(built) => diagnostics.merge(built.diagnostics),
            Err(e) => diagnostics.add_error_with_entity("config", &e.to_string(), &spec.name),
        }
    }

    for issue in &diagnostics.issues {
        println!("{}", issue);
    }
    if diagnostics.has_errors() {
        bail!("model {} is invalid: {}", path.display(), diagnostics.summary());
    }
    println!(
        "Model valid: {} technologies, {} steps ({})",
        model.technologies.len(),
        time.len(),
        diagnostics.summary()
    );
    Ok(())
}
