//! Headless annotation driver.
//!
//! A [`ReplayScript`] is the recorded input of one annotation run: the image
//! reference, the size it was rendered at, the marker detections and the
//! user's events in order. [`replay`] pushes the events through the display
//! mapping and the session exactly as an interactive front-end would, then
//! calibrates and measures. Events the session refuses are collected in
//! [`ReplayOutcome::rejected`]; they never abort the run.

use handmeasure_annotate::{AnnotateError, AnnotationSession};
use handmeasure_core::{DisplayMapping, DisplaySize, ImageSize, JointPoint, MapError, Segment};
use handmeasure_io::{AnnotationRecord, PersistError};
use handmeasure_scale::{MarkerDetection, ScaleCalibrator};
use log::{debug, info};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// One user action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ReplayEvent {
    /// Make `segment` the active one.
    Select { segment: Segment },
    /// Pointer click in display coordinates.
    Click { x: f64, y: f64 },
    /// Point given directly in source pixels.
    Place { x: u32, y: u32 },
    Undo,
    /// Clear `segment`, or the active segment when omitted.
    ClearSegment {
        #[serde(default)]
        segment: Option<Segment>,
    },
    ClearAll,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayScript {
    pub image_path: String,
    /// Source image size. Front-ends that can read the image may leave it out
    /// and fill it in before replaying.
    #[serde(default)]
    pub image_size: Option<ImageSize>,
    /// Size the image was rendered at; defaults to the source size.
    #[serde(default)]
    pub display_size: Option<DisplaySize>,
    #[serde(default)]
    pub detections: Vec<MarkerDetection>,
    #[serde(default)]
    pub events: Vec<ReplayEvent>,
}

impl ReplayScript {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ReplayError {
    #[error("replay script for {0} does not give an image size")]
    MissingImageSize(String),
    #[error(transparent)]
    Session(#[from] AnnotateError),
    #[error(transparent)]
    Display(#[from] MapError),
}

#[derive(Clone, Debug, PartialEq)]
pub struct RejectedEvent {
    /// Position in [`ReplayScript::events`].
    pub index: usize,
    pub event: ReplayEvent,
    pub reason: AnnotateError,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReplayOutcome {
    pub record: AnnotationRecord,
    pub rejected: Vec<RejectedEvent>,
    pub active_segment: Segment,
}

/// Run `script` to completion.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(image = %script.image_path, events = script.events.len()))
)]
pub fn replay(
    script: &ReplayScript,
    calibrator: &ScaleCalibrator,
) -> Result<ReplayOutcome, ReplayError> {
    let image_size = script
        .image_size
        .ok_or_else(|| ReplayError::MissingImageSize(script.image_path.clone()))?;
    let mut session = AnnotationSession::new(image_size)?;
    let display = script.display_size.unwrap_or_else(|| image_size.into());
    let mapping = DisplayMapping::new(image_size, display)?;

    let mut rejected = Vec::new();
    for (index, event) in script.events.iter().enumerate() {
        if let Err(reason) = apply(&mut session, &mapping, event) {
            debug!("event {index} rejected: {reason}");
            rejected.push(RejectedEvent {
                index,
                event: event.clone(),
                reason,
            });
        }
    }

    let calibration = calibrator.calibrate_or_uncalibrated(&script.detections);
    let record = AnnotationRecord::from_session(
        script.image_path.clone(),
        &session,
        calibration,
        script.detections.clone(),
    );
    info!(
        "replayed {} events ({} rejected), {} points placed",
        script.events.len(),
        rejected.len(),
        record.landmarks.total()
    );
    Ok(ReplayOutcome {
        record,
        rejected,
        active_segment: session.active_segment(),
    })
}

fn apply(
    session: &mut AnnotationSession,
    mapping: &DisplayMapping,
    event: &ReplayEvent,
) -> Result<(), AnnotateError> {
    match *event {
        ReplayEvent::Select { segment } => session.select_segment(segment),
        ReplayEvent::Click { x, y } => {
            session.place_display_point(mapping, Point2::new(x, y))?;
        }
        ReplayEvent::Place { x, y } => {
            session.place_point(JointPoint::new(x, y))?;
        }
        ReplayEvent::Undo => {
            session.undo_last();
        }
        ReplayEvent::ClearSegment { segment: Some(s) } => session.clear_segment(s),
        ReplayEvent::ClearSegment { segment: None } => session.clear_active(),
        ReplayEvent::ClearAll => session.clear_all(),
    }
    Ok(())
}
