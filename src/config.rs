//! Configuration file support for reqpin
//!
//! Reads configuration from `~/.config/reqpin/config.json`:
//!
//! ```json
//! {
//!   "preferred_index": "https://mirror.example/simple",
//!   "default_index": "https://pypi.org/simple",
//!   "timeout_secs": 10,
//!   "compiler": {
//!     "program": "pip-compile",
//!     "args": ["--quiet"]
//!   }
//! }
//! ```
//!
//! Every field is optional. Command-line flags take precedence.

use crate::index::DEFAULT_INDEX_URL;
use crate::lock::DEFAULT_COMPILER;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot determine config directory. HOME environment variable not set.")]
    NoConfigDir,

    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Lock compiler settings
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CompilerConfig {
    #[serde(default = "default_compiler")]
    pub program: String,

    /// Extra arguments placed before `--generate-hashes`
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            program: default_compiler(),
            args: Vec::new(),
        }
    }
}

fn default_compiler() -> String {
    DEFAULT_COMPILER.to_string()
}

/// Top-level configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    pub preferred_index: Option<String>,

    pub default_index: Option<String>,

    /// HTTP timeout for index probes; unset keeps the client default
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub compiler: CompilerConfig,
}

impl Config {
    /// Load configuration from the default path or return defaults if not found
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(std::env::var("XDG_CONFIG_HOME").ok(), dirs::home_dir())
    }

    fn load_with(
        xdg_config_home: Option<String>,
        home: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let path = match config_path_from(xdg_config_home, home) {
            Ok(path) => path,
            Err(ConfigError::NoConfigDir) => {
                tracing::debug!("No config directory, using defaults");
                return Ok(Config::default());
            }
            Err(e) => return Err(e),
        };

        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::ReadError {
            path: path.clone(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::ParseError { path, source })
    }

    pub fn default_index(&self) -> &str {
        self.default_index.as_deref().unwrap_or(DEFAULT_INDEX_URL)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Returns the config file path: `$XDG_CONFIG_HOME/reqpin/config.json`, or
/// `~/.config/reqpin/config.json` when `XDG_CONFIG_HOME` is unset or empty
fn config_path_from(
    xdg_config_home: Option<String>,
    home: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    let config_base = xdg_config_home
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| home.map(|h| h.join(".config")))
        .ok_or(ConfigError::NoConfigDir)?;

    Ok(config_base.join("reqpin").join("config.json"))
}
