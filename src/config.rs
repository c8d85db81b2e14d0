//! Configuration management for the hypertension risk service

use crate::preprocessor::PreprocessOptions;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Environment variable overriding the configuration file location
pub const CONFIG_PATH_ENV: &str = "HYPERTENSION_CONFIG";

/// Prefix for per-key environment overrides, e.g. `HYPERTENSION__SERVER__PORT`
const ENV_PREFIX: &str = "HYPERTENSION";

/// Which artifact format `models.model_path` points at
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelBackend {
    /// ONNX classifier run with ONNX Runtime
    #[default]
    Onnx,
    /// Logistic regression coefficients in JSON
    Logistic,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub models: ModelsConfig,
    #[serde(default)]
    pub preprocessing: PreprocessingConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Trained classifier file
    pub model_path: String,
    /// Fitted scaler file (JSON)
    #[serde(default)]
    pub scaler_path: Option<String>,
    #[serde(default)]
    pub backend: ModelBackend,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

/// Preprocessing switches
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Fill missing categoricals with the column mode instead of "Unknown"
    pub impute_with_mode: bool,
    /// Clamp numeric columns to their IQR fences
    pub cap_outliers: bool,
    /// Standardize features with the scaler before inference
    pub apply_scaler: bool,
}

impl PreprocessingConfig {
    pub fn options(&self) -> PreprocessOptions {
        PreprocessOptions {
            impute_with_mode: self.impute_with_mode,
            cap_outliers: self.cap_outliers,
        }
    }
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        let options = PreprocessOptions::default();
        Self {
            impute_with_mode: options.impute_with_mode,
            cap_outliers: options.cap_outliers,
            apply_scaler: false,
        }
    }
}

/// Decision configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Probability at or above which a record is classed high risk
    pub threshold: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self { threshold: 0.5 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Metrics reporting configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Seconds between logged summaries; 0 disables the reporter
    pub report_interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: 60,
        }
    }
}

impl AppConfig {
    /// Load configuration from `HYPERTENSION_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path, with environment overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.detection.threshold),
            "detection.threshold must be within [0, 1], got {}",
            self.detection.threshold
        );
        anyhow::ensure!(
            !self.preprocessing.apply_scaler || self.models.scaler_path.is_some(),
            "preprocessing.apply_scaler requires models.scaler_path"
        );
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            models: ModelsConfig {
                model_path: "models/hypertension_model.onnx".to_string(),
                scaler_path: Some("models/hypertension_scaler.json".to_string()),
                backend: ModelBackend::Onnx,
                onnx_threads: 1,
            },
            preprocessing: PreprocessingConfig::default(),
            detection: DetectionConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}
