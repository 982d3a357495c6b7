//! Camera scanner settings and their JSON form.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Camera scanner settings, fixed for the lifetime of a scanner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Device index
    pub device_id: u32,
    /// Requested frame width
    pub width: u32,
    /// Requested frame height
    pub height: u32,
    /// Requested frame rate
    pub target_fps: u32,
    /// Decode only the centred region of interest
    pub use_roi: bool,
    /// Fraction of each side covered by the region, in `(0, 1]`
    pub roi_ratio: f64,
    /// Draw the region guide on output frames
    pub show_roi_overlay: bool,
    /// Seconds before the same barcode is reported again
    pub duplicate_timeout_seconds: f64,
    /// Log frame counters and draw the debug strip
    pub debug_mode: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            width: 1280,
            height: 720,
            target_fps: 30,
            use_roi: true,
            roi_ratio: 0.7,
            show_roi_overlay: true,
            duplicate_timeout_seconds: 3.0,
            debug_mode: false,
        }
    }
}

impl CameraConfig {
    /// Parse and validate a JSON document; missing fields take defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Check every field is within range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.roi_ratio > 0.0 && self.roi_ratio <= 1.0) {
            return Err(ConfigError::InvalidField {
                field: "roi_ratio",
                reason: format!("{} is outside (0, 1]", self.roi_ratio),
            });
        }
        for (field, value) in [
            ("width", self.width),
            ("height", self.height),
            ("target_fps", self.target_fps),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidField {
                    field,
                    reason: "must be non-zero".to_string(),
                });
            }
        }
        if !self.duplicate_timeout_seconds.is_finite() || self.duplicate_timeout_seconds < 0.0 {
            return Err(ConfigError::InvalidField {
                field: "duplicate_timeout_seconds",
                reason: format!("{} is not a finite, non-negative number", self.duplicate_timeout_seconds),
            });
        }
        Ok(())
    }

    /// Duplicate suppression window
    pub fn duplicate_timeout(&self) -> Duration {
        if self.duplicate_timeout_seconds.is_finite() && self.duplicate_timeout_seconds > 0.0 {
            Duration::from_secs_f64(self.duplicate_timeout_seconds)
        } else {
            Duration::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CameraConfig::default();
        assert_eq!((config.width, config.height, config.target_fps), (1280, 720, 30));
        assert_eq!(config.roi_ratio, 0.7);
        assert!(config.use_roi && config.show_roi_overlay && !config.debug_mode);
        assert_eq!(config.duplicate_timeout(), Duration::from_secs(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = CameraConfig::from_json_str(r#"{"device_id": 2, "roi_ratio": 0.5}"#).unwrap();
        assert_eq!(config.device_id, 2);
        assert_eq!(config.roi_ratio, 0.5);
        assert_eq!(config.width, 1280);
    }

    #[test]
    fn test_rejects_out_of_range_fields() {
        for json in [
            r#"{"roi_ratio": 0.0}"#,
            r#"{"roi_ratio": 1.5}"#,
            r#"{"width": 0}"#,
            r#"{"target_fps": 0}"#,
            r#"{"duplicate_timeout_seconds": -1.0}"#,
        ] {
            let err = CameraConfig::from_json_str(json).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidField { .. }), "{json}: {err}");
        }
        assert!(matches!(
            CameraConfig::from_json_str("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = CameraConfig::from_json_file("/nonexistent/barscan.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
