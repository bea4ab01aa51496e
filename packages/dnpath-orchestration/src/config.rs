//! Configuration (YAML file + environment)
//!
//! Resolution order, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. YAML file (`version: 1` required)
//! 3. `DNPATH_*` environment variables
//! 4. Command-line flags ([`Settings::with_overrides`])
//!
//! ```yaml
//! version: 1
//! server: /var/lib/dnpath/corp.example.db
//! data_dir: /var/lib/dnpath
//! dry_run: false
//! quiet: false
//! ```

use crate::materializer::MaterializeOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_SERVER: &str = "DNPATH_SERVER";
pub const ENV_DATA_DIR: &str = "DNPATH_DATA_DIR";
pub const ENV_DRY_RUN: &str = "DNPATH_DRY_RUN";
pub const ENV_QUIET: &str = "DNPATH_QUIET";

const SUPPORTED_VERSIONS: &[u32] = &[1];

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing version field in YAML
    #[error("Missing 'version' field in configuration file. Add 'version: 1' to the top of your YAML file.")]
    MissingVersion,

    /// Unsupported version
    #[error("Unsupported configuration version {found}. Supported versions: {}", supported.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))]
    UnsupportedVersion { found: u32, supported: Vec<u32> },

    /// Environment variable holds an unusable value
    #[error("Invalid value '{value}' for {variable}. {hint}")]
    InvalidValue {
        variable: String,
        value: String,
        hint: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// YAML schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFileV1 {
    version: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    server: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    data_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    dry_run: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    quiet: Option<bool>,
}

/// Resolved settings for one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Preferred endpoint; discovery runs when absent or unreachable
    pub server: Option<String>,
    /// Where the locator looks for `<domain>.db` directory files
    pub data_dir: PathBuf,
    pub dry_run: bool,
    pub quiet: bool,
}

/// Command-line values layered over file and environment settings
///
/// Flags can only switch `dry_run` and `quiet` on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    pub server: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub dry_run: bool,
    pub quiet: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: None,
            data_dir: PathBuf::from("."),
            dry_run: false,
            quiet: false,
        }
    }
}

impl Settings {
    /// Defaults, then `path` (if any), then the process environment
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut settings = match path {
            Some(path) => Self::from_yaml(path)?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_yaml(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let file: SettingsFileV1 = serde_yaml::from_str(content)?;

        match file.version {
            None => return Err(ConfigError::MissingVersion),
            Some(found) if !SUPPORTED_VERSIONS.contains(&found) => {
                return Err(ConfigError::UnsupportedVersion {
                    found,
                    supported: SUPPORTED_VERSIONS.to_vec(),
                })
            }
            Some(_) => {}
        }

        let defaults = Self::default();
        Ok(Self {
            server: file.server,
            data_dir: file.data_dir.unwrap_or(defaults.data_dir),
            dry_run: file.dry_run.unwrap_or(defaults.dry_run),
            quiet: file.quiet.unwrap_or(defaults.quiet),
        })
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        let file = SettingsFileV1 {
            version: Some(1),
            server: self.server.clone(),
            data_dir: Some(self.data_dir.clone()),
            dry_run: Some(self.dry_run),
            quiet: Some(self.quiet),
        };
        Ok(serde_yaml::to_string(&file)?)
    }

    /// Apply `DNPATH_*` overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(server) = lookup(ENV_SERVER).filter(|s| !s.is_empty()) {
            self.server = Some(server);
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|s| !s.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup(ENV_DRY_RUN) {
            self.dry_run = parse_bool(ENV_DRY_RUN, &value)?;
        }
        if let Some(value) = lookup(ENV_QUIET) {
            self.quiet = parse_bool(ENV_QUIET, &value)?;
        }
        Ok(())
    }

    /// Apply command-line overrides, which win over file and environment
    pub fn with_overrides(mut self, overrides: SettingsOverrides) -> Self {
        if let Some(server) = overrides.server {
            self.server = Some(server);
        }
        if let Some(dir) = overrides.data_dir {
            self.data_dir = dir;
        }
        self.dry_run |= overrides.dry_run;
        self.quiet |= overrides.quiet;
        self
    }

    pub fn options(&self) -> MaterializeOptions {
        MaterializeOptions {
            dry_run: self.dry_run,
            quiet: self.quiet,
        }
    }
}

fn parse_bool(variable: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            variable: variable.to_string(),
            value: value.to_string(),
            hint: "Use true/false, yes/no, on/off or 1/0.".to_string(),
        }),
    }
}
