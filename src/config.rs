use crate::core::evaluation::SplitOptions;
use crate::core::predictor::PredictorSettings;
use crate::core::scoring::ScoringPolicy;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub predictor: PredictorConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

/// Scoring coefficients, overridable for tuning experiments.
///
/// The defaults are the production weights and changing them changes
/// which facility wins; treat overrides as experiments, not defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_critical_distance_weight")]
    pub critical_distance: f64,
    #[serde(default = "default_critical_wait_weight")]
    pub critical_wait: f64,
    #[serde(default = "default_distance_weight")]
    pub distance: f64,
    #[serde(default = "default_wait_weight")]
    pub wait: f64,
    #[serde(default = "default_occupancy_weight")]
    pub occupancy: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            critical_distance: default_critical_distance_weight(),
            critical_wait: default_critical_wait_weight(),
            distance: default_distance_weight(),
            wait: default_wait_weight(),
            occupancy: default_occupancy_weight(),
        }
    }
}

fn default_critical_distance_weight() -> f64 {
    0.7
}
fn default_critical_wait_weight() -> f64 {
    0.3
}
fn default_distance_weight() -> f64 {
    0.4
}
fn default_wait_weight() -> f64 {
    0.3
}
fn default_occupancy_weight() -> f64 {
    0.3
}

impl From<&WeightsConfig> for ScoringPolicy {
    fn from(weights: &WeightsConfig) -> Self {
        Self {
            critical_distance: weights.critical_distance,
            critical_wait: weights.critical_wait,
            distance: weights.distance,
            wait: weights.wait,
            occupancy: weights.occupancy,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictorConfig {
    #[serde(default = "default_n_trees")]
    pub n_trees: u16,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_min_wait_minutes")]
    pub min_wait_minutes: u32,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            n_trees: default_n_trees(),
            seed: default_seed(),
            min_wait_minutes: default_min_wait_minutes(),
        }
    }
}

fn default_n_trees() -> u16 {
    100
}
fn default_seed() -> u64 {
    42
}
fn default_min_wait_minutes() -> u32 {
    5
}

impl From<&PredictorConfig> for PredictorSettings {
    fn from(config: &PredictorConfig) -> Self {
        Self {
            n_trees: config.n_trees,
            seed: config.seed,
            min_wait_minutes: config.min_wait_minutes,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            test_fraction: default_test_fraction(),
            seed: default_seed(),
            min_samples: default_min_samples(),
        }
    }
}

fn default_test_fraction() -> f64 {
    0.2
}
fn default_min_samples() -> usize {
    20
}

impl From<&EvaluationConfig> for SplitOptions {
    fn from(config: &EvaluationConfig) -> Self {
        Self {
            test_fraction: config.test_fraction,
            seed: config.seed,
            min_samples: config.min_samples,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml, config/local.toml)
    /// 3. Environment variables (prefixed with REFERRAL_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., REFERRAL__PREDICTOR__N_TREES -> predictor.n_trees
            .add_source(
                Environment::with_prefix("REFERRAL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("REFERRAL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}
