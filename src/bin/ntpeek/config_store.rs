//! User defaults read from `config.toml`.
//!
//! ```toml
//! [defaults]
//! timeout = 2.5
//! format = "json"
//! version = 4
//! ```

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use toml::Value;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("filesystem error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Defaults {
    pub timeout: Option<f64>,
    pub format: Option<String>,
    pub version: Option<u8>,
}

pub struct ConfigStore {
    path: PathBuf,
    pub defaults: Defaults,
}

impl ConfigStore {
    /// Load the file at the default location; a missing file yields empty defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(default_path())
    }

    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self {
                path,
                defaults: Defaults::default(),
            });
        }
        let content = fs::read_to_string(&path)?;
        let parsed: Value = content.parse::<Value>()?;
        let defaults = parse_value(&parsed)?;
        Ok(Self { path, defaults })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn default_path() -> PathBuf {
    resolve_config_dir().join("config.toml")
}

fn parse_value(root: &Value) -> Result<Defaults, ConfigError> {
    let mut defaults = Defaults::default();
    let Some(table) = root.get("defaults").and_then(Value::as_table) else {
        return Ok(defaults);
    };

    if let Some(timeout_value) = table.get("timeout") {
        let timeout = timeout_value
            .as_float()
            .or_else(|| timeout_value.as_integer().map(|i| i as f64))
            .ok_or_else(|| ConfigError::Invalid("defaults.timeout must be a number".into()))?;
        if !Duration::try_from_secs_f64(timeout).is_ok_and(|d| !d.is_zero()) {
            return Err(ConfigError::Invalid(format!(
                "defaults.timeout must be a positive number of seconds, got {timeout}"
            )));
        }
        defaults.timeout = Some(timeout);
    }
    if let Some(format) = table.get("format") {
        let format = format
            .as_str()
            .ok_or_else(|| ConfigError::Invalid("defaults.format must be a string".into()))?;
        defaults.format = Some(format.to_string());
    }
    if let Some(version) = table.get("version") {
        let version = version
            .as_integer()
            .filter(|v| (2..=4).contains(v))
            .ok_or_else(|| ConfigError::Invalid("defaults.version must be 2, 3 or 4".into()))?;
        defaults.version = Some(version as u8);
    }
    Ok(defaults)
}

fn resolve_config_dir() -> PathBuf {
    if let Some(val) = env::var_os("NTPEEK_CONFIG_DIR") {
        let path = PathBuf::from(val);
        if path.is_absolute() {
            return path;
        }
        return env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| PathBuf::from("."));
    }
    if let Some(base) = dirs::config_dir() {
        return base.join("ntpeek");
    }
    PathBuf::from(".ntpeek")
}
