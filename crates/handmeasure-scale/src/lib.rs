//! Scale calibration from a fiducial marker of known physical size.
//!
//! Marker *detection* is an external capability: callers hand in
//! [`MarkerDetection`]s (an id plus four ordered image-space corners) and get
//! back a [`ScaleCalibration`] expressed in pixels per centimeter.

mod calibrate;
mod detection;

pub use calibrate::{
    calibrate, mean_edge_length, primary_detection, CalibrationError, ScaleCalibration,
    ScaleCalibrator, APRILTAG_SIZE_CM,
};
pub use detection::{MarkerDetection, MARKER_CORNERS};
