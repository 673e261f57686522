//! Configuration loading and discovery for `spritecheck.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::SpritecheckConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name searched for when discovering configuration.
pub const CONFIG_FILE: &str = "spritecheck.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse spritecheck.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override the sprite palette cap
    pub sprite_max_colors: Option<usize>,
    /// Override the per-tile portrait palette cap
    pub portrait_max_colors: Option<usize>,
    /// Enable error collection
    pub collect_errors: Option<bool>,
}

/// Locate the configuration file for this invocation.
///
/// The nearest `spritecheck.toml` in the working directory or one of its
/// ancestors wins; the per-user file under `$XDG_CONFIG_HOME/spritecheck/`
/// (or `~/.config/spritecheck/`) is the fallback.
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(|cwd| find_config_from(&cwd)).or_else(find_xdg_config)
}

/// Per-user configuration file, if present.
pub fn find_xdg_config() -> Option<PathBuf> {
    let base = match env::var_os("XDG_CONFIG_HOME") {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from(env::var_os("HOME")?).join(".config"),
    };
    let candidate = base.join("spritecheck").join(CONFIG_FILE);
    candidate.is_file().then_some(candidate)
}

/// Nearest `spritecheck.toml` in `start` or any of its ancestors.
pub fn find_config_from(start: &Path) -> Option<PathBuf> {
    start.ancestors().map(|dir| dir.join(CONFIG_FILE)).find(|candidate| candidate.is_file())
}

/// Load configuration.
///
/// If a path is provided, loads from that file. Otherwise, uses
/// `find_config()` to locate one. If no config file is found, the
/// defaults are returned.
pub fn load_config(path: Option<&Path>) -> Result<SpritecheckConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(SpritecheckConfig::default()),
    }
}

/// Load configuration from a specific file path.
fn load_config_file(path: &Path) -> Result<SpritecheckConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: SpritecheckConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    log::debug!("loaded configuration from {}", path.display());
    Ok(config)
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut SpritecheckConfig, overrides: &CliOverrides) {
    if let Some(max) = overrides.sprite_max_colors {
        config.sprite.max_colors = max;
    }
    if let Some(max) = overrides.portrait_max_colors {
        config.portrait.max_colors = max;
    }
    if let Some(collect_errors) = overrides.collect_errors {
        config.telemetry.collect_errors = collect_errors;
    }
}
