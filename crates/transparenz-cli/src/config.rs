//! Configuration management for the CLI
//!
//! Environment-level defaults live in `~/.transparenz/config.toml`; every
//! job and query can override them through command-line flags.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use transparenz_domain::JobConfig;
use transparenz_monitor::QualityThresholds;

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite document store
    #[serde(default = "default_store_path")]
    pub store_path: String,

    /// Endpoint of the external OCR service
    #[serde(default = "default_ocr_endpoint")]
    pub ocr_endpoint: String,

    /// Default job configuration (chunk size, timeout, retries)
    #[serde(default)]
    pub job: JobConfig,

    /// Verification thresholds
    #[serde(default)]
    pub verification: VerificationSettings,

    /// Quality monitor thresholds
    #[serde(default)]
    pub quality: QualityThresholds,
}

/// Confidence thresholds for the fact checker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationSettings {
    /// Confidence at or above this is Verified
    pub high_threshold: f64,
    /// Confidence below this is Rejected
    pub low_threshold: f64,
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self {
            high_threshold: 0.7,
            low_threshold: 0.4,
        }
    }
}

impl Config {
    /// Get the configuration file path
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".transparenz").join("config.toml"))
    }

    /// Load configuration from a file, or defaults when it does not exist
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Load from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(&path, contents)?;
        Ok(())
    }

    /// Check invariants across the configuration
    pub fn validate(&self) -> Result<()> {
        self.job.validate().map_err(CliError::Config)?;
        if self.verification.low_threshold >= self.verification.high_threshold {
            return Err(CliError::Config(format!(
                "low_threshold {} must be below high_threshold {}",
                self.verification.low_threshold, self.verification.high_threshold
            )));
        }
        Ok(())
    }

}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            ocr_endpoint: default_ocr_endpoint(),
            job: JobConfig::default(),
            verification: VerificationSettings::default(),
            quality: QualityThresholds::default(),
        }
    }
}

fn default_store_path() -> String {
    "transparenz.db".to_string()
}

fn default_ocr_endpoint() -> String {
    transparenz_ocr::http::DEFAULT_ENDPOINT.to_string()
}
