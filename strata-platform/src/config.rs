// Facade configuration - strata.json plus STRATA_* environment overrides

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use strata_resolver::{FallbackRoot, ModuleResolver};

use crate::env;

pub const CONFIG_FILE: &str = "strata.json";
pub const ENV_FILE_ENV: &str = "STRATA_ENV_FILE";
pub const COLOR_ENV: &str = "STRATA_COLOR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {var}: '{value}'")]
    InvalidValue { var: String, value: String },
}

/// Terminal color policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Let the terminal and `NO_COLOR` / `CLICOLOR` decide
    #[default]
    Auto,
    Always,
    Never,
}

impl FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(ColorMode::Auto),
            "always" => Ok(ColorMode::Always),
            "never" => Ok(ColorMode::Never),
            other => Err(format!("unknown color mode '{}'", other)),
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorMode::Auto => write!(f, "auto"),
            ColorMode::Always => write!(f, "always"),
            ColorMode::Never => write!(f, "never"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Fallback driver root; the working-directory root when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_root: Option<PathBuf>,

    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,

    #[serde(default)]
    pub color: ColorMode,
}

fn default_env_file() -> PathBuf {
    PathBuf::from(".env")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            driver_root: None,
            env_file: default_env_file(),
            color: ColorMode::Auto,
        }
    }
}

impl Config {
    /// Parse strata.json from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// `strata.json` from the current directory when present, defaults
    /// otherwise, then environment overrides
    pub fn discover() -> Result<Self, ConfigError> {
        let config = if Path::new(CONFIG_FILE).is_file() {
            log::debug!("loading {}", CONFIG_FILE);
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.with_env_overrides()
    }

    /// Apply `STRATA_ENV_FILE` and `STRATA_COLOR`.
    ///
    /// `STRATA_DRIVER_ROOT` is left to [`FallbackRoot::WorkingDirectory`],
    /// which reads it on every resolution when `driverRoot` is unset.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(file) = env::get_var(ENV_FILE_ENV).filter(|v| !v.is_empty()) {
            self.env_file = PathBuf::from(file);
        }
        if let Some(color) = env::get_var(COLOR_ENV).filter(|v| !v.is_empty()) {
            self.color = color.parse().map_err(|_| ConfigError::InvalidValue {
                var: COLOR_ENV.to_string(),
                value: color,
            })?;
        }
        Ok(self)
    }

    pub fn fallback_root(&self) -> FallbackRoot {
        match &self.driver_root {
            Some(root) => FallbackRoot::Fixed(root.clone()),
            None => FallbackRoot::WorkingDirectory,
        }
    }

    /// Resolver over the known capability table using this driver root
    pub fn resolver(&self) -> ModuleResolver {
        ModuleResolver::new().with_fallback_root(self.fallback_root())
    }

    /// Install the color policy for all console output
    pub fn apply_color(&self) {
        match self.color {
            ColorMode::Always => colored::control::set_override(true),
            ColorMode::Never => colored::control::set_override(false),
            ColorMode::Auto => colored::control::unset_override(),
        }
    }
}
