//! TOML-based configuration for schema-intel.
//!
//! Supports a config file (schema-intel.toml) with environment variable
//! expansion in the sampling dialect.
//!
//! Example configuration:
//! ```toml
//! [inference]
//! enabled = true
//! min_confidence = 0.7
//!
//! [sampling]
//! enabled = true
//! sample_size = 10000
//! concurrency = 4
//! timeout_ms = 5000
//! dialect = "${SCHEMA_INTEL_DIALECT}"
//!
//! [paths]
//! max_hops = 4
//!
//! [graph]
//! confidence_penalty = 4.0
//! size_factor = 0.25
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::semantic::graph::EdgeWeights;
use crate::semantic::inference::{thresholds, SampleDialect, SamplingConfig};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "SCHEMA_INTEL_CONFIG";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unsupported dialect: {0}. Supported: postgres, mysql, sqlite, duckdb, tsql")]
    UnsupportedDialect(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Naming-convention inference.
    pub inference: InferenceSettings,

    /// Multiplicity sampling.
    pub sampling: SamplingSettings,

    /// Join path search.
    pub paths: PathSettings,

    /// Edge weighting.
    pub graph: GraphSettings,
}

/// Inference settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InferenceSettings {
    /// Enable relationship inference.
    pub enabled: bool,

    /// Minimum confidence threshold (0.0 to 1.0).
    pub min_confidence: f64,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            min_confidence: thresholds::confidence::FLOOR,
        }
    }
}

/// Sampling settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SamplingSettings {
    /// Refine multiplicity from live data when an executor is available.
    pub enabled: bool,

    /// Rows sampled per side.
    pub sample_size: u32,

    /// Maximum concurrent sampling queries.
    pub concurrency: usize,

    /// Per-query timeout in milliseconds.
    pub timeout_ms: u64,

    /// SQL dialect (supports ${ENV_VAR} expansion).
    pub dialect: String,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_size: thresholds::sampling::DEFAULT_SAMPLE_SIZE,
            concurrency: thresholds::sampling::DEFAULT_CONCURRENCY,
            timeout_ms: thresholds::sampling::DEFAULT_TIMEOUT_MS,
            dialect: SampleDialect::default().as_str().to_string(),
        }
    }
}

impl SamplingSettings {
    /// Get the dialect with environment variables expanded.
    pub fn dialect_type(&self) -> Result<SampleDialect, SettingsError> {
        let resolved = expand_env_vars(&self.dialect)?;
        SampleDialect::parse(&resolved).ok_or(SettingsError::UnsupportedDialect(resolved))
    }

    /// Build the calculator configuration.
    pub fn to_config(&self) -> Result<SamplingConfig, SettingsError> {
        Ok(SamplingConfig {
            sample_size: self.sample_size,
            concurrency: self.concurrency,
            timeout: Duration::from_millis(self.timeout_ms),
            dialect: self.dialect_type()?,
        })
    }
}

/// Join path settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PathSettings {
    /// Default hop limit for path search.
    pub max_hops: usize,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self { max_hops: 4 }
    }
}

/// Edge weight settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GraphSettings {
    pub confidence_penalty: f64,
    pub size_factor: f64,
}

impl Default for GraphSettings {
    fn default() -> Self {
        let weights = EdgeWeights::default();
        Self {
            confidence_penalty: weights.confidence_penalty,
            size_factor: weights.size_factor,
        }
    }
}

impl GraphSettings {
    pub fn edge_weights(&self) -> EdgeWeights {
        EdgeWeights {
            confidence_penalty: self.confidence_penalty,
            size_factor: self.size_factor,
        }
    }
}

impl Settings {
    /// Load and validate settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SCHEMA_INTEL_CONFIG`
    /// 2. `./schema-intel.toml`
    /// 3. `~/.config/schema-intel/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        // Check environment variable first
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return Self::from_file(&path);
        }

        // Check local directory
        let local_config = PathBuf::from("schema-intel.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        // Check user config directory
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("schema-intel").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        // Return defaults if no config file found
        Ok(Settings::default())
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |msg: &str| Err(SettingsError::InvalidConfig(msg.to_string()));

        if !(0.0..=1.0).contains(&self.inference.min_confidence) {
            return invalid("inference.min_confidence must be between 0.0 and 1.0");
        }
        if self.sampling.sample_size == 0 {
            return invalid("sampling.sample_size must be greater than 0");
        }
        if self.sampling.concurrency == 0 {
            return invalid("sampling.concurrency must be greater than 0");
        }
        if self.sampling.timeout_ms == 0 {
            return invalid("sampling.timeout_ms must be greater than 0");
        }
        if self.paths.max_hops == 0 {
            return invalid("paths.max_hops must be greater than 0");
        }
        if self.graph.confidence_penalty < 0.0 || self.graph.size_factor < 0.0 {
            return invalid("graph weights must not be negative");
        }
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let braced = chars.peek() == Some(&'{');
        if braced {
            chars.next(); // consume '{'
        }

        let mut var_name = String::new();
        while let Some(&ch) = chars.peek() {
            if braced && ch == '}' {
                chars.next(); // consume '}'
                break;
            }
            if !braced && !(ch.is_alphanumeric() || ch == '_') {
                break;
            }
            var_name.push(ch);
            chars.next();
        }

        if var_name.is_empty() && !braced {
            // Just a lone $, keep it
            result.push('$');
            continue;
        }

        let value = env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
