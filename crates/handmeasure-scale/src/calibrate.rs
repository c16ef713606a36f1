//! Pixel-per-centimeter ratio from marker edges.
//!
//! The ratio is the mean of the primary marker's four edge lengths divided by
//! the marker's physical side. Averaging damps single-corner noise and mild
//! perspective skew; the residual bias under strong skew is not corrected.

use crate::detection::MarkerDetection;
use log::{debug, info, warn};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Default physical side of the reference AprilTag, in centimeters.
pub const APRILTAG_SIZE_CM: f64 = 7.0;

/// Edges shorter than this (in pixels) count as coincident corners.
const MIN_EDGE_PX: f64 = 1e-6;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("reference size must be a positive finite length, got {size_cm} cm")]
    InvalidReferenceSize { size_cm: f64 },
    #[error("marker {id} is degenerate: edge {edge} has length {length_px} px")]
    DegenerateMarker { id: u32, edge: usize, length_px: f64 },
    #[error("marker {id} has a non-finite corner coordinate")]
    NonFiniteCorner { id: u32 },
    #[error("pixels per cm must be positive and finite, got {value}")]
    InvalidRatio { value: f64 },
}

/// Outcome of calibrating one image.
///
/// `pixels_per_cm` is `None` when no usable marker was found; measurements
/// then carry pixel distances only.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleCalibration {
    reference_size_cm: f64,
    pixels_per_cm: Option<f64>,
}

impl ScaleCalibration {
    pub fn uncalibrated(reference_size_cm: f64) -> Result<Self, CalibrationError> {
        validate_reference_size(reference_size_cm)?;
        Ok(Self {
            reference_size_cm,
            pixels_per_cm: None,
        })
    }

    pub fn from_ratio(pixels_per_cm: f64, reference_size_cm: f64) -> Result<Self, CalibrationError> {
        validate_reference_size(reference_size_cm)?;
        if !pixels_per_cm.is_finite() || pixels_per_cm <= 0.0 {
            return Err(CalibrationError::InvalidRatio {
                value: pixels_per_cm,
            });
        }
        Ok(Self {
            reference_size_cm,
            pixels_per_cm: Some(pixels_per_cm),
        })
    }

    #[inline]
    pub fn is_calibrated(&self) -> bool {
        self.pixels_per_cm.is_some()
    }

    #[inline]
    pub fn pixels_per_cm(&self) -> Option<f64> {
        self.pixels_per_cm
    }

    #[inline]
    pub fn reference_size_cm(&self) -> f64 {
        self.reference_size_cm
    }

    /// Convert a pixel length; `None` when uncalibrated.
    #[inline]
    pub fn to_cm(&self, pixels: f64) -> Option<f64> {
        self.pixels_per_cm.map(|ratio| pixels / ratio)
    }
}

impl Default for ScaleCalibration {
    fn default() -> Self {
        Self {
            reference_size_cm: APRILTAG_SIZE_CM,
            pixels_per_cm: None,
        }
    }
}

fn validate_reference_size(size_cm: f64) -> Result<(), CalibrationError> {
    if size_cm.is_finite() && size_cm > 0.0 {
        Ok(())
    } else {
        Err(CalibrationError::InvalidReferenceSize { size_cm })
    }
}

/// The detection used for calibration: lowest id, first occurrence on ties.
pub fn primary_detection(detections: &[MarkerDetection]) -> Option<&MarkerDetection> {
    detections.iter().min_by_key(|d| d.id)
}

/// Mean edge length of a marker, rejecting degenerate quads.
pub fn mean_edge_length(det: &MarkerDetection) -> Result<f64, CalibrationError> {
    if det
        .corners
        .iter()
        .any(|p| !p.x.is_finite() || !p.y.is_finite())
    {
        return Err(CalibrationError::NonFiniteCorner { id: det.id });
    }
    let edges = det.edge_lengths();
    if let Some((edge, &length_px)) = edges
        .iter()
        .enumerate()
        .find(|(_, len)| **len < MIN_EDGE_PX)
    {
        return Err(CalibrationError::DegenerateMarker {
            id: det.id,
            edge,
            length_px,
        });
    }
    Ok(edges.iter().sum::<f64>() / edges.len() as f64)
}

/// Marker-based calibrator with a fixed physical reference size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleCalibrator {
    reference_size_cm: f64,
}

impl Default for ScaleCalibrator {
    fn default() -> Self {
        Self {
            reference_size_cm: APRILTAG_SIZE_CM,
        }
    }
}

impl ScaleCalibrator {
    pub fn new(reference_size_cm: f64) -> Result<Self, CalibrationError> {
        validate_reference_size(reference_size_cm)?;
        Ok(Self { reference_size_cm })
    }

    #[inline]
    pub fn reference_size_cm(&self) -> f64 {
        self.reference_size_cm
    }

    /// Calibrate from zero or more detections.
    ///
    /// No detections is not an error: the result is uncalibrated. A degenerate
    /// primary marker is an error; see [`Self::calibrate_or_uncalibrated`] for
    /// the fail-closed variant.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, detections), fields(markers = detections.len()))
    )]
    pub fn calibrate(
        &self,
        detections: &[MarkerDetection],
    ) -> Result<ScaleCalibration, CalibrationError> {
        let Some(primary) = primary_detection(detections) else {
            debug!("no markers detected, scale stays uncalibrated");
            return ScaleCalibration::uncalibrated(self.reference_size_cm);
        };
        if detections.len() > 1 {
            debug!(
                "{} markers detected, calibrating from lowest id {}",
                detections.len(),
                primary.id
            );
        }
        let edge_px = mean_edge_length(primary)?;
        let ratio = edge_px / self.reference_size_cm;
        let calib = ScaleCalibration::from_ratio(ratio, self.reference_size_cm)?;
        info!(
            "scale calibrated from marker {}: {ratio:.4} px/cm (mean edge {edge_px:.2} px)",
            primary.id
        );
        Ok(calib)
    }

    /// Like [`Self::calibrate`], but a degenerate marker yields the uncalibrated state.
    pub fn calibrate_or_uncalibrated(&self, detections: &[MarkerDetection]) -> ScaleCalibration {
        self.calibrate(detections).unwrap_or_else(|err| {
            warn!("calibration rejected: {err}");
            ScaleCalibration {
                reference_size_cm: self.reference_size_cm,
                pixels_per_cm: None,
            }
        })
    }
}

/// One-shot calibration with an explicit reference size.
pub fn calibrate(
    detections: &[MarkerDetection],
    reference_size_cm: f64,
) -> Result<ScaleCalibration, CalibrationError> {
    ScaleCalibrator::new(reference_size_cm)?.calibrate(detections)
}
