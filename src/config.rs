//! Configuration for evaluation runs.
//!
//! Supports both environment variables and YAML config file.
//! Environment variables take precedence over config file values.

use crate::error::{Result, VqaError};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Largest number of decimal places accepted for reported accuracies.
pub const MAX_PRECISION: u32 = 10;

/// Scoring and reporting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Number of decimal places kept in reported accuracies.
    #[serde(default = "default_precision")]
    pub precision: u32,

    /// Number of human answers each question is expected to carry.
    #[serde(default = "default_expected_references")]
    pub expected_references: usize,

    /// Number of agreeing annotators needed for full credit.
    #[serde(default = "default_agreement_threshold")]
    pub agreement_threshold: usize,

    /// Per-question score (fraction) under which a question counts as poorly answered.
    #[serde(default = "default_low_score_threshold")]
    pub low_score_threshold: f64,
}

fn default_precision() -> u32 {
    2
}

fn default_expected_references() -> usize {
    10
}

fn default_agreement_threshold() -> usize {
    3
}

fn default_low_score_threshold() -> f64 {
    0.35
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            precision: default_precision(),
            expected_references: default_expected_references(),
            agreement_threshold: default_agreement_threshold(),
            low_score_threshold: default_low_score_threshold(),
        }
    }
}

impl EvalConfig {
    /// Reject settings that cannot produce a meaningful report.
    pub fn validate(&self) -> Result<()> {
        if self.precision > MAX_PRECISION {
            return Err(VqaError::InvalidConfig(format!(
                "precision must be at most {}, got {}",
                MAX_PRECISION, self.precision
            )));
        }

        if self.expected_references == 0 {
            return Err(VqaError::InvalidConfig(
                "expected_references must be at least 1".to_string(),
            ));
        }

        if self.agreement_threshold == 0 {
            return Err(VqaError::InvalidConfig(
                "agreement_threshold must be at least 1".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.low_score_threshold) {
            return Err(VqaError::InvalidConfig(format!(
                "low_score_threshold must lie in [0, 1], got {}",
                self.low_score_threshold
            )));
        }

        Ok(())
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Evaluation settings
    #[serde(default)]
    pub eval: EvalConfig,
}

/// Configuration file structure (YAML format).
#[derive(Debug, Deserialize)]
struct ConfigFile {
    eval: Option<EvalFileSection>,
}

#[derive(Debug, Deserialize)]
struct EvalFileSection {
    precision: Option<u32>,
    expected_references: Option<usize>,
    agreement_threshold: Option<usize>,
    low_score_threshold: Option<f64>,
}

impl Config {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (VQA_PRECISION, VQA_EXPECTED_REFERENCES,
    ///    VQA_AGREEMENT_THRESHOLD, VQA_LOW_SCORE_THRESHOLD)
    /// 2. Config file (~/.config/vqa-tools/config.yaml)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                config = Self::load_from_file(&config_path)?;
                tracing::info!("Loaded configuration from {}", config_path.display());
            }
        }

        if let Some(precision) = env_parse("VQA_PRECISION") {
            config.eval.precision = precision;
        }

        if let Some(expected) = env_parse("VQA_EXPECTED_REFERENCES") {
            config.eval.expected_references = expected;
        }

        if let Some(threshold) = env_parse("VQA_AGREEMENT_THRESHOLD") {
            config.eval.agreement_threshold = threshold;
        }

        if let Some(low) = env_parse("VQA_LOW_SCORE_THRESHOLD") {
            config.eval.low_score_threshold = low;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| VqaError::io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text, filling gaps with defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file_config: ConfigFile = serde_yaml::from_str(content)
            .map_err(|e| VqaError::Config(format!("Failed to parse config file: {}", e)))?;

        let mut config = Config::default();

        if let Some(eval) = file_config.eval {
            if let Some(precision) = eval.precision {
                config.eval.precision = precision;
            }
            if let Some(expected) = eval.expected_references {
                config.eval.expected_references = expected;
            }
            if let Some(threshold) = eval.agreement_threshold {
                config.eval.agreement_threshold = threshold;
            }
            if let Some(low) = eval.low_score_threshold {
                config.eval.low_score_threshold = low;
            }
        }

        Ok(config)
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "vqa-tools")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Validate the evaluation settings.
    pub fn validate(&self) -> Result<()> {
        self.eval.validate()
    }

    /// Create a config with an explicit precision (useful for testing).
    pub fn with_precision(precision: u32) -> Self {
        Self {
            eval: EvalConfig {
                precision,
                ..Default::default()
            },
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.trim().parse().ok())
}
