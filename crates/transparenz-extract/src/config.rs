//! Configuration for the extractor

use serde::{Deserialize, Serialize};

/// Configuration for the extractor adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Maximum accepted file size in bytes
    pub max_file_size_bytes: u64,

    /// Native extraction below this many characters per page falls back to
    /// OCR for that page
    pub min_chars_per_page: usize,

    /// Language hint passed to the OCR service
    pub ocr_language: String,
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_file_size_bytes == 0 {
            return Err("max_file_size_bytes must be greater than 0".to_string());
        }
        if self.min_chars_per_page == 0 {
            return Err("min_chars_per_page must be greater than 0".to_string());
        }
        if self.ocr_language.is_empty() {
            return Err("ocr_language must not be empty".to_string());
        }
        Ok(())
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to a TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 100 * 1024 * 1024,
            min_chars_per_page: 32,
            ocr_language: transparenz_ocr::DEFAULT_LANGUAGE.to_string(),
        }
    }
}
