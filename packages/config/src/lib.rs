#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Settings shared by the server and CLI.
//!
//! Settings come from a TOML file (`$ESTAT_DENSITY_CONFIG`, else
//! `estat_density.toml` in the working directory, else built-in defaults),
//! then `DATASET_PATH`, `BIND_ADDR`, and `PORT` from the environment
//! override the file. Every key is optional.
//!
//! ```toml
//! [dataset]
//! path = "data/base_2014_ec_2020_pop_level2.parquet"
//!
//! [server]
//! bind_addr = "127.0.0.1"
//! port = 8080
//! cache_capacity = 256
//!
//! [display]
//! population_floor = 5000
//! limit = 50
//! metric = "est"
//!
//! [benchmarks]
//! establishments_max = 10000000
//! employees_max = 100000000
//! population_max = 130000000
//! ```

use std::path::{Path, PathBuf};

use estat_density_models::{BenchmarkCeilings, DensityQuery, Metric};
use serde::{Deserialize, Deserializer};

/// Environment variable naming the settings file.
pub const CONFIG_ENV: &str = "ESTAT_DENSITY_CONFIG";

/// Settings file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "estat_density.toml";

/// Errors that can occur while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The settings file is not valid TOML or has unexpected values.
    #[error("Invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// An override variable holds an unusable value.
    #[error("Invalid value '{value}' for environment variable {name}")]
    InvalidEnv { name: &'static str, value: String },
}

/// All settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub dataset: DatasetSettings,
    pub server: ServerSettings,
    pub display: DisplaySettings,
    pub benchmarks: BenchmarkCeilings,
}

/// `[dataset]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetSettings {
    /// Joined census file (`.parquet` or `.csv`).
    pub path: PathBuf,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/base_2014_ec_2020_pop_level2.parquet"),
        }
    }
}

/// `[server]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    pub bind_addr: String,
    pub port: u16,
    /// Maximum number of memoised query reports.
    pub cache_capacity: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            cache_capacity: 256,
        }
    }
}

/// `[display]`: defaults for query parameters a caller leaves out.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplaySettings {
    pub population_floor: u64,
    pub limit: usize,
    /// `"est"`/`"establishmentDensity"` or `"emp"`/`"employmentDensity"`.
    #[serde(deserialize_with = "deserialize_metric")]
    pub metric: Metric,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            population_floor: DensityQuery::DEFAULT_POPULATION_FLOOR,
            limit: DensityQuery::DEFAULT_LIMIT,
            metric: Metric::default(),
        }
    }
}

fn deserialize_metric<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Metric, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse()
        .map_err(|_| serde::de::Error::custom(format!("unknown metric '{raw}'")))
}

impl Settings {
    /// Parses settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not valid settings TOML.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded settings from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Loads settings from `explicit` if given, else the file named by
    /// `$ESTAT_DENSITY_CONFIG`, else `estat_density.toml` when it exists,
    /// else defaults; then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a named file cannot be read or parsed, or
    /// an override variable is invalid.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let default_file = Path::new(DEFAULT_CONFIG_FILE);

        let mut settings = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path)?,
            None if default_file.is_file() => Self::from_file(default_file)?,
            None => {
                log::debug!("No settings file found, using defaults");
                Self::default()
            }
        };

        settings.apply_env_overrides(|name| std::env::var(name).ok())?;
        Ok(settings)
    }

    /// Applies `DATASET_PATH`, `BIND_ADDR`, and `PORT` as returned by
    /// `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if `PORT` is not a valid port.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(path) = lookup("DATASET_PATH") {
            self.dataset.path = PathBuf::from(path);
        }
        if let Some(addr) = lookup("BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: "PORT",
                value: port,
            })?;
        }
        Ok(())
    }
}
