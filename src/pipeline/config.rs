//! Pipeline configuration and file loading.
//!
//! A [`PipelineConfig`] groups the configuration of every stage. It can be loaded from
//! JSON or TOML; missing sections and fields fall back to their defaults, and the loaded
//! configuration is validated before it is returned.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::OCRError;
use crate::core::config::{ConfigError, ConfigValidator, ParallelPolicy};
use crate::pipeline::recognition::RecognitionConfig;
use crate::processors::{ClusterConfig, ColorMaskConfig, DiagnosticConfig, ExtractionConfig};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Configuration of a whole [`InkPipeline`](crate::pipeline::InkPipeline).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Keep the computed mask in the result.
    pub keep_mask: bool,
    pub color_mask: ColorMaskConfig,
    pub extraction: ExtractionConfig,
    pub clustering: ClusterConfig,
    pub recognition: RecognitionConfig,
    pub parallel: ParallelPolicy,
    pub diagnostic: DiagnosticConfig,
}

impl PipelineConfig {
    /// Load configuration from a file, detecting the format from the extension.
    ///
    /// ```rust,no_run
    /// use inkread::pipeline::PipelineConfig;
    ///
    /// let config = PipelineConfig::from_file("ink.toml")?;
    /// # Ok::<(), inkread::core::OCRError>(())
    /// ```
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, OCRError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_extension(path).ok_or_else(|| {
            OCRError::config_error(format!(
                "Unsupported config file extension: {:?}",
                path.extension()
            ))
        })?;
        let content = read_config(path)?;
        Self::from_str_with_format(&content, format)
    }

    /// Load a JSON configuration file regardless of its extension.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, OCRError> {
        let content = read_config(path.as_ref())?;
        Self::from_json_str(&content)
    }

    pub fn from_str_with_format(content: &str, format: ConfigFormat) -> Result<Self, OCRError> {
        match format {
            ConfigFormat::Toml => Self::from_toml_str(content),
            ConfigFormat::Json => Self::from_json_str(content),
        }
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(content: &str) -> Result<Self, OCRError> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| OCRError::config_error(format!("Failed to parse JSON config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML configuration.
    pub fn from_toml_str(content: &str) -> Result<Self, OCRError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| OCRError::config_error(format!("Failed to parse TOML config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, OCRError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| OCRError::config_error(format!("Failed to serialize config to JSON: {e}")))
    }

    pub fn to_toml_string(&self) -> Result<String, OCRError> {
        toml::to_string_pretty(self)
            .map_err(|e| OCRError::config_error(format!("Failed to serialize config to TOML: {e}")))
    }

    /// Save configuration to a file, detecting the format from the extension.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), OCRError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_extension(path).ok_or_else(|| {
            OCRError::config_error(format!(
                "Unsupported config file extension: {:?}",
                path.extension()
            ))
        })?;
        let content = match format {
            ConfigFormat::Toml => self.to_toml_string()?,
            ConfigFormat::Json => self.to_json_string()?,
        };
        std::fs::write(path, content).map_err(|e| {
            OCRError::config_error(format!(
                "Failed to write config file {}: {}",
                path.display(),
                e
            ))
        })
    }
}

fn read_config(path: &Path) -> Result<String, OCRError> {
    std::fs::read_to_string(path).map_err(|e| {
        OCRError::config_error(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })
}

impl ConfigValidator for PipelineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.color_mask.validate()?;
        self.extraction.validate()?;
        self.clustering.validate()?;
        self.recognition.validate()?;
        self.parallel.validate()?;
        self.diagnostic.validate()?;
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}
