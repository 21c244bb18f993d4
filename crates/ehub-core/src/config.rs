//! Model files.
//!
//! A model file declares the horizon, the relaxation settings and the list of
//! technologies to build. YAML and JSON are both accepted; the format is
//! picked from the file extension, falling back to trying YAML then JSON.
//!
//! ```yaml
//! horizon:
//!   steps: 24
//! relaxation:
//!   fallback_big_m: 1.0e4
//! technologies:
//!   - name: boiler
//!     technology_model: CONV1
//!     input_carriers: [gas]
//!     output_carriers: [heat]
//!     size_max: 10
//!     fit:
//!       performance_function_type: 1
//!       alpha1: 0.9
//! ```

use crate::error::{EhubError, EhubResult};
use crate::technology::TechnologySpec;
use crate::time::TimeIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub horizon: Horizon,
    #[serde(default)]
    pub relaxation: RelaxationConfig,
    #[serde(default)]
    pub technologies: Vec<TechnologySpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Horizon {
    pub steps: usize,
    #[serde(default = "default_averaged_steps")]
    pub averaged_steps: usize,
}

fn default_averaged_steps() -> usize {
    1
}

/// Settings for the big-M pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaxationConfig {
    /// Relax disjunctions right after construction
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Big-M used when an expression has no finite bound
    #[serde(default)]
    pub fallback_big_m: Option<f64>,
}

fn default_enabled() -> bool {
    true
}

impl Default for RelaxationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            fallback_big_m: None,
        }
    }
}

impl ModelConfig {
    pub fn time_index(&self) -> EhubResult<TimeIndex> {
        TimeIndex::new(self.horizon.steps)?.with_averaged_steps(self.horizon.averaged_steps)
    }

    /// Structural checks across technologies; per-technology checks live in
    /// [`TechnologySpec::validate`].
    pub fn check_names(&self) -> EhubResult<()> {
        let mut seen = HashSet::new();
        for tec in &self.technologies {
            if tec.name.trim().is_empty() {
                return Err(EhubError::Parse("technology name cannot be empty".into()));
            }
            if !seen.insert(tec.name.as_str()) {
                return Err(EhubError::Parse(format!(
                    "duplicate technology name '{}'",
                    tec.name
                )));
            }
        }
        if let Some(m) = self.relaxation.fallback_big_m {
            if !(m.is_finite() && m > 0.0) {
                return Err(EhubError::Parse(format!(
                    "fallback_big_m must be positive and finite, got {}",
                    m
                )));
            }
        }
        Ok(())
    }
}

pub fn load_model_from_path(path: &Path) -> EhubResult<ModelConfig> {
    let data = fs::read_to_string(path)?;
    let model: ModelConfig = match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            serde_yaml::from_str(&data)?
        }
        Some(ext) if ext.eq_ignore_ascii_case("json") => serde_json::from_str(&data)?,
        _ => match serde_yaml::from_str(&data) {
            Ok(model) => model,
            Err(_) => serde_json::from_str(&data)?,
        },
    };
    model.check_names()?;
    Ok(model)
}
