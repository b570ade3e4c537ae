//! Configuration system for CspForge.
//!
//! Selects the clause encoding algorithm and its tuning limits from TOML or
//! YAML without code changes.
//!
//! # Examples
//!
//! Load configuration from TOML string:
//!
//! ```
//! use cspforge_config::{AlgorithmConfig, EncoderConfig};
//!
//! let config = EncoderConfig::from_toml_str(r#"
//!     propagate = false
//!
//!     [algorithm]
//!     type = "compact_order"
//!     base = 4
//!
//!     [limits]
//!     split_threshold = 256
//! "#).unwrap();
//!
//! assert_eq!(config.algorithm.base(), Some(4));
//! assert!(!config.propagate);
//! assert_eq!(config.limits.split_threshold, 256);
//! assert_eq!(config.limits.max_set_size, 128);
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use cspforge_config::EncoderConfig;
//!
//! let config = EncoderConfig::load("encoder.toml").unwrap_or_default();
//! // Proceeds with the order encoding if the file doesn't exist
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number base of the compact order encoding.
pub const DEFAULT_BASE: i64 = 10;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main encoder configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EncoderConfig {
    /// Clause encoding algorithm.
    #[serde(default)]
    pub algorithm: AlgorithmConfig,

    /// Run bound propagation before encoding.
    #[serde(default = "default_true")]
    pub propagate: bool,

    /// Size limits.
    #[serde(default)]
    pub limits: LimitsConfig,
}

fn default_true() -> bool {
    true
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            algorithm: AlgorithmConfig::default(),
            propagate: true,
            limits: LimitsConfig::default(),
        }
    }
}

impl EncoderConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist, contains invalid TOML or fails
    /// validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let AlgorithmConfig::CompactOrder(compact) = &self.algorithm {
            if compact.base < 2 {
                return Err(ConfigError::Invalid(format!(
                    "compact order base must be at least 2, got {}",
                    compact.base
                )));
            }
        }
        if self.limits.max_set_size == 0 {
            return Err(ConfigError::Invalid("max_set_size must be positive".to_string()));
        }
        if self.limits.split_threshold < 2 {
            return Err(ConfigError::Invalid(format!(
                "split_threshold must be at least 2, got {}",
                self.limits.split_threshold
            )));
        }
        Ok(())
    }

    /// Sets the encoding algorithm.
    pub fn with_algorithm(mut self, algorithm: AlgorithmConfig) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Enables or disables propagation.
    pub fn with_propagation(mut self, propagate: bool) -> Self {
        self.propagate = propagate;
        self
    }

    /// Sets the sparse domain cardinality cap.
    pub fn with_max_set_size(mut self, max_set_size: usize) -> Self {
        self.limits.max_set_size = max_set_size;
        self
    }

    /// Sets the combined domain size above which linear literals are split.
    pub fn with_split_threshold(mut self, split_threshold: u64) -> Self {
        self.limits.split_threshold = split_threshold;
        self
    }

    /// Enables or disables the redundant all-different bound clauses.
    pub fn with_all_different_bounds(mut self, enabled: bool) -> Self {
        self.limits.all_different_bounds = enabled;
        self
    }
}

/// Clause encoding algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlgorithmConfig {
    /// One threshold indicator chain per variable.
    #[default]
    Order,

    /// Digit decomposition in a fixed base, each digit order encoded.
    CompactOrder(CompactOrderConfig),
}

impl AlgorithmConfig {
    /// Compact order encoding with the given base.
    pub fn compact_order(base: i64) -> Self {
        AlgorithmConfig::CompactOrder(CompactOrderConfig { base })
    }

    /// The base of the compact encoding, `None` for the order encoding.
    pub fn base(&self) -> Option<i64> {
        match self {
            AlgorithmConfig::Order => None,
            AlgorithmConfig::CompactOrder(c) => Some(c.base),
        }
    }

    /// Short name used in log events.
    pub fn name(&self) -> &'static str {
        match self {
            AlgorithmConfig::Order => "order",
            AlgorithmConfig::CompactOrder(_) => "compact_order",
        }
    }
}

/// Compact order encoding configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CompactOrderConfig {
    /// Number base of the digit decomposition.
    #[serde(default = "default_base")]
    pub base: i64,
}

fn default_base() -> i64 {
    DEFAULT_BASE
}

impl Default for CompactOrderConfig {
    fn default() -> Self {
        CompactOrderConfig { base: DEFAULT_BASE }
    }
}

/// Size limits. None of them changes which assignments are solutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LimitsConfig {
    /// Sparse domains with more values become ranges.
    #[serde(default = "default_max_set_size")]
    pub max_set_size: usize,

    /// Linear literals whose variables' domain sizes multiply beyond this
    /// are split with auxiliary sums before order encoding.
    #[serde(default = "default_split_threshold")]
    pub split_threshold: u64,

    /// Emit the two redundant bound clauses of all-different.
    #[serde(default = "default_true")]
    pub all_different_bounds: bool,
}

fn default_max_set_size() -> usize {
    128
}

fn default_split_threshold() -> u64 {
    1024
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig {
            max_set_size: default_max_set_size(),
            split_threshold: default_split_threshold(),
            all_different_bounds: true,
        }
    }
}
