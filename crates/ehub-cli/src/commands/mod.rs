pub mod build;
pub mod solve;
pub mod validate;

use anyhow::{Context, Result};
use ehub_core::{load_model_from_path, ModelConfig};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

pub(crate) fn load_model(path: &Path) -> Result<ModelConfig> {
    let model = load_model_from_path(path)
        .with_context(|| format!("loading model from {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        technologies = model.technologies.len(),
        steps = model.horizon.steps,
        "loaded model"
    );
    Ok(model)
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("writing JSON to {}", path.display()))?;
    Ok(())
}
