mod schema;

pub use schema::{Config, PromptConfig, DEFAULT_PROMPT_MAX_CHARS};

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

const APP_DIR: &str = "pitch-score";

/// Get the config directory path (e.g. ~/.config/pitch-score/)
pub fn get_config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine the user config directory")?;
    Ok(base.join(APP_DIR))
}

/// Get the default config file path (e.g. ~/.config/pitch-score/config.yaml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.yaml"))
}

/// Default location for stored reports (e.g. ~/.local/share/pitch-score/reports)
pub fn default_reports_dir() -> Result<PathBuf> {
    let base = dirs::data_dir().context("Could not determine the user data directory")?;
    Ok(base.join(APP_DIR).join("reports"))
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses the default path and
///   falls back to built-in defaults when that file does not exist.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found at {}", path.display());
            }
            path
        }
        None => {
            let default_path = get_config_path()?;
            if !default_path.exists() {
                tracing::debug!(path = %default_path.display(), "no config file, using defaults");
                return Ok(Config::default());
            }
            default_path
        }
    };

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content).with_context(|| {
        format!(
            "Failed to parse config: invalid YAML in {}",
            config_path.display()
        )
    })?;

    Ok(config)
}

impl Config {
    /// Reports directory from the config, or the platform default.
    pub fn reports_dir(&self) -> Result<PathBuf> {
        match &self.reports_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_reports_dir(),
        }
    }
}
