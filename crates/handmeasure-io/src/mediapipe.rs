//! Export to the 21-point MediaPipe hand landmark layout.
//!
//! Index 0 is the wrist, approximated by the first thumb point. Each segment
//! then occupies four consecutive indices: thumb 1..=4, index 5..=8,
//! middle 9..=12, ring 13..=16, pinky 17..=20. Coordinates are normalized by
//! the image size; depth is always zero and visibility always one.

use crate::error::PersistError;
use crate::store::write_atomic;
use handmeasure_core::{ImageSize, Landmarks, Segment, JOINTS_PER_SEGMENT};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MEDIAPIPE_FORMAT: &str = "mediapipe_hand_landmarks";
pub const MEDIAPIPE_LANDMARKS: usize = 21;
const WRIST: usize = 0;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("cannot normalize by an empty image size {0:?}")]
    EmptyImage(ImageSize),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MediaPipeLandmark {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub visibility: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MediaPipeHand {
    pub format: String,
    pub hand_landmarks: Vec<MediaPipeLandmark>,
    pub description: String,
}

/// MediaPipe index of `joint` on `segment`.
#[inline]
pub fn mediapipe_index(segment: Segment, joint: usize) -> usize {
    1 + JOINTS_PER_SEGMENT * segment.index() + joint
}

/// Convert placed points; joints not yet placed are simply absent.
pub fn to_mediapipe(
    landmarks: &Landmarks,
    image_size: ImageSize,
) -> Result<MediaPipeHand, ExportError> {
    if image_size.is_empty() {
        return Err(ExportError::EmptyImage(image_size));
    }
    let w = f64::from(image_size.width);
    let h = f64::from(image_size.height);
    let landmark = |index, x: u32, y: u32| MediaPipeLandmark {
        index,
        x: f64::from(x) / w,
        y: f64::from(y) / h,
        z: 0.0,
        visibility: 1.0,
    };

    let mut out = Vec::with_capacity(MEDIAPIPE_LANDMARKS);
    if let Some(p) = landmarks.points(Segment::Thumb).first() {
        out.push(landmark(WRIST, p.x, p.y));
    }
    for (segment, points) in landmarks.iter() {
        for (joint, p) in points.iter().enumerate() {
            out.push(landmark(mediapipe_index(segment, joint), p.x, p.y));
        }
    }
    log::debug!("exported {} of {MEDIAPIPE_LANDMARKS} landmarks", out.len());

    Ok(MediaPipeHand {
        format: MEDIAPIPE_FORMAT.to_owned(),
        hand_landmarks: out,
        description: format!("Hand landmarks in MediaPipe format ({MEDIAPIPE_LANDMARKS} points)"),
    })
}

impl MediaPipeHand {
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, json.as_bytes())
    }
}
