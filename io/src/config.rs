//! Bundle configuration.
//!
//! Defines the YAML-serializable configuration that controls output format
//! and remote reference handling. Every field has a default, so an empty
//! file (or no file at all) is valid.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! output:
//!   format: yaml
//! remote:
//!   enabled: true
//!   timeout_secs: 30
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::output::OutputFormat;

/// Conventional config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".schema-bundle.yml";

/// Output settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Format used when it cannot be inferred from the output path.
    pub format: OutputFormat,
}

/// Remote reference settings.
///
/// # Examples
///
/// ```
/// # use schema_bundle_io::RemoteConfig;
/// let remote = RemoteConfig::default();
/// assert!(remote.enabled);
/// assert_eq!(remote.timeout().as_secs(), 30);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Fetch `http(s)://` references. When disabled they fail the bundle.
    pub enabled: bool,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: crate::fetch::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// Top-level configuration, typically `.schema-bundle.yml`.
///
/// ```no_run
/// use schema_bundle_io::BundleConfig;
///
/// let config = BundleConfig::load(".schema-bundle.yml").unwrap();
/// println!("remote references enabled: {}", config.remote.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// Configuration format version.
    pub version: String,
    pub output: OutputConfig,
    pub remote: RemoteConfig,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            output: OutputConfig::default(),
            remote: RemoteConfig::default(),
        }
    }
}

impl BundleConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::IoError::IoError) if the file cannot be
    /// read, or [`YamlError`](crate::IoError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        // An empty file deserializes to unit, not to a mapping.
        let config: Option<Self> = serde_yaml::from_reader(reader)?;
        Ok(config.unwrap_or_default())
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::IoError::IoError) if the file cannot be
    /// written, or [`YamlError`](crate::IoError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}
