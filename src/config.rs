//! Generator configuration.
//!
//! Board constants and power-up defaults. A configuration file is plain JSON;
//! missing fields take the defaults below:
//!
//! ```json
//! { "reference_clock_hz": 25000000.0, "echo": false }
//! ```

use crate::chip::register::{Encoder, RECTANGLE_HALF_RATE_THRESHOLD_HZ, REFERENCE_CLOCK_HZ};
use serde::{Serialize, Deserialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Master clock feeding the chip.
    pub reference_clock_hz: f64,
    /// Rectangles below this frequency run the accumulator at half rate.
    pub rectangle_threshold_hz: f64,
    /// Echo state after power-up.
    pub echo: bool,
    /// Debug trace state after power-up.
    pub debug: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            reference_clock_hz: REFERENCE_CLOCK_HZ,
            rectangle_threshold_hz: RECTANGLE_HALF_RATE_THRESHOLD_HZ,
            echo: true,
            debug: false,
        }
    }
}

impl GeneratorConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: GeneratorConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.reference_clock_hz.is_finite() || self.reference_clock_hz <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "reference_clock_hz must be positive, got {}",
                self.reference_clock_hz
            )));
        }
        if !self.rectangle_threshold_hz.is_finite() || self.rectangle_threshold_hz < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "rectangle_threshold_hz must not be negative, got {}",
                self.rectangle_threshold_hz
            )));
        }
        Ok(())
    }

    /// The frequency encoder for this board.
    pub fn encoder(&self) -> Encoder {
        Encoder::new(self.reference_clock_hz, self.rectangle_threshold_hz)
    }
}

/// Errors that can occur while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.reference_clock_hz, 25_000_000.0);
        assert!(config.echo);
        assert!(!config.debug);
        assert_eq!(config.encoder(), Encoder::default());
    }

    #[test]
    fn test_partial_json() {
        let config = GeneratorConfig::from_json(r#"{ "echo": false, "debug": true }"#).unwrap();
        assert!(!config.echo);
        assert!(config.debug);
        assert_eq!(config.reference_clock_hz, 25_000_000.0);
    }

    #[test]
    fn test_rejects_bad_clock() {
        let err = GeneratorConfig::from_json(r#"{ "reference_clock_hz": 0.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_malformed() {
        let err = GeneratorConfig::from_json("{ echo: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = GeneratorConfig::load("/nonexistent/tinyad9833.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
