//! High-level facade crate for the `handmeasure-*` workspace.
//!
//! This crate provides:
//! - re-exports of the underlying crates under short module names
//! - a segment colour palette for overlays
//! - a headless [`replay`] driver that pushes scripted UI events through the
//!   whole pipeline and produces a persisted document
//! - a plain-text [`summary`] of a loaded document
//! - (feature `image`) image size probing for the MediaPipe export
//!
//! ## Quickstart
//!
//! ```no_run
//! use handmeasure::annotate::AnnotationSession;
//! use handmeasure::core::{ImageSize, JointPoint};
//! use handmeasure::io::AnnotationRecord;
//! use handmeasure::scale::ScaleCalibrator;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = AnnotationSession::new(ImageSize::new(1920, 1080))?;
//! session.place_point(JointPoint::new(412, 1000))?;
//! session.place_point(JointPoint::new(430, 880))?;
//!
//! let calibration = ScaleCalibrator::default().calibrate(&[])?;
//! let record = AnnotationRecord::from_session("hand.jpg", &session, calibration, vec![]);
//! record.save("hand_landmarks.json", true)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `handmeasure::core`: segments, joint points, landmark table, display mapping, logger.
//! - `handmeasure::scale`: marker detections and pixels-per-cm calibration.
//! - `handmeasure::annotate`: the annotation session and measurement engine.
//! - `handmeasure::io`: document schema, validation, atomic save, config, MediaPipe export.

pub use handmeasure_annotate as annotate;
pub use handmeasure_core as core;
pub use handmeasure_io as io;
pub use handmeasure_scale as scale;

pub use handmeasure_annotate::{AnnotationSession, MeasurementTable};
pub use handmeasure_core::{ImageSize, JointPoint, Landmarks, Segment};
pub use handmeasure_io::{AnnotationRecord, MeasureConfig};
pub use handmeasure_scale::{MarkerDetection, ScaleCalibration, ScaleCalibrator};

pub mod palette;
pub mod replay;
pub mod summary;

#[cfg(feature = "image")]
pub mod probe;
