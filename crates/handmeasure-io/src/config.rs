//! JSON configuration for the measurement tools.

use crate::error::PersistError;
use crate::schema::{DecodeLimits, DEFAULT_MAX_COORDINATE};
use crate::store::write_atomic;
use handmeasure_core::ImageSize;
use handmeasure_scale::{CalibrationError, ScaleCalibrator, APRILTAG_SIZE_CM};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error("max_coordinate must be positive")]
    ZeroMaxCoordinate,
    #[error("MediaPipe fallback size {0:?} is empty")]
    EmptyMediaPipeFallback(ImageSize),
}

fn default_reference_size_cm() -> f64 {
    APRILTAG_SIZE_CM
}

fn default_max_coordinate() -> u32 {
    DEFAULT_MAX_COORDINATE
}

fn default_pretty() -> bool {
    true
}

fn default_mediapipe_fallback_size() -> ImageSize {
    ImageSize::new(1920, 1080)
}

/// Settings shared by the command-line tools. Every field has a default, so
/// `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureConfig {
    /// Printed edge length of the reference marker.
    #[serde(default = "default_reference_size_cm")]
    pub reference_size_cm: f64,
    #[serde(default = "default_max_coordinate")]
    pub max_coordinate: u32,
    #[serde(default = "default_pretty")]
    pub pretty: bool,
    /// Image size assumed by the MediaPipe export when the image itself
    /// cannot be read.
    #[serde(default = "default_mediapipe_fallback_size")]
    pub mediapipe_fallback_size: ImageSize,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            reference_size_cm: default_reference_size_cm(),
            max_coordinate: default_max_coordinate(),
            pretty: default_pretty(),
            mediapipe_fallback_size: default_mediapipe_fallback_size(),
        }
    }
}

impl MeasureConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON, replacing any existing file atomically.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, json.as_bytes())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ScaleCalibrator::new(self.reference_size_cm)?;
        if self.max_coordinate == 0 {
            return Err(ConfigError::ZeroMaxCoordinate);
        }
        if self.mediapipe_fallback_size.is_empty() {
            return Err(ConfigError::EmptyMediaPipeFallback(self.mediapipe_fallback_size));
        }
        Ok(())
    }

    pub fn calibrator(&self) -> Result<ScaleCalibrator, ConfigError> {
        Ok(ScaleCalibrator::new(self.reference_size_cm)?)
    }

    pub fn decode_limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_coordinate: self.max_coordinate,
        }
    }
}
