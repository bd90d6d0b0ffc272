pub mod config;
pub mod formula;
pub mod validation;

pub use config::*;
pub use formula::Formula;
pub use validation::{CompiledCategory, CompiledRubric};

use anyhow::{Context, Result};
use std::path::Path;

/// Load a rubric from a YAML file.
///
/// The result is not validated yet; pass it to [`CompiledRubric::compile`].
pub fn load_rubric(path: &Path) -> Result<Rubric> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read rubric file: {}", path.display()))?;
    let rubric: Rubric = serde_saphyr::from_str(&content)
        .with_context(|| format!("Failed to parse rubric YAML: {}", path.display()))?;
    Ok(rubric)
}
