use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::pacer::PacerConfig;
use crate::types::PacerError;

/// Environment variable naming a pacer config file.
pub const CONFIG_ENV: &str = "REPLAY_PACER_CONFIG";

/// Errors raised while loading or rendering a pacer config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read pacer config {path}: {source}")]
    Read {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not valid TOML for a pacer config.
    #[error("failed to parse pacer config {path}: {source}")]
    Parse {
        /// Path that failed.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    /// The config could not be rendered as TOML.
    #[error("failed to serialize pacer config: {source}")]
    Serialize {
        /// Underlying TOML error.
        source: toml::ser::Error,
    },
    /// The file parsed but violates a config invariant.
    #[error("pacer config {path} is invalid: {source}")]
    Invalid {
        /// Path that failed.
        path: PathBuf,
        /// Validation failure.
        source: PacerError,
    },
}

/// Per-user config location, `<config dir>/sombra/replay-pacer.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("sombra").join("replay-pacer.toml"))
}

/// Loads the pacer config.
///
/// An explicit path must exist. Without one the per-user file is used when
/// present, otherwise the defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<PacerConfig, ConfigError> {
    if let Some(path) = explicit {
        return read_file(path);
    }
    match default_config_path() {
        Some(path) if path.exists() => read_file(&path),
        _ => Ok(PacerConfig::default()),
    }
}

/// Renders `cfg` as TOML.
pub fn render_config(cfg: &PacerConfig) -> Result<String, ConfigError> {
    toml::to_string_pretty(cfg).map_err(|source| ConfigError::Serialize { source })
}

fn read_file(path: &Path) -> Result<PacerConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: PacerConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    cfg.validate().map_err(|source| ConfigError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "replay.pacer.config_loaded");
    Ok(cfg)
}
