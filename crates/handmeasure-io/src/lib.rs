//! Persisted form of a hand annotation.
//!
//! One JSON document per annotated image ties together the image reference,
//! the raw joint points, the scale calibration, the derived measurements and
//! the marker detections. Every downstream tool (viewer, converter, report
//! generator) reads and writes through this format only.
//!
//! ```text
//! {
//!   "image_path": "...",
//!   "landmarks": { "thumb_0": {"x": 412, "y": 1180}, ... },
//!   "scale_info": { "calibrated": true, "pixels_per_cm": 37.1, "apriltag_size_cm": 7.0 },
//!   "measurements": { "thumb": [ {"from_joint": 0, "to_joint": 1,
//!                                 "pixel_distance": 151.2, "cm_distance": 4.07} ], ... },
//!   "apriltags": [ {"id": 0, "corners": [[x, y], [x, y], [x, y], [x, y]]} ]
//! }
//! ```
//!
//! Loading validates the whole document before anything is built: on any
//! [`SchemaViolation`] no record is returned.

mod config;
mod document;
mod error;
mod mediapipe;
mod schema;
mod store;

pub use config::{ConfigError, MeasureConfig};
pub use document::{
    AnnotationDocument, AprilTagEntry, MeasurementEntry, OrderedMap, PixelXY, ScaleInfo,
};
pub use error::PersistError;
pub use mediapipe::{
    mediapipe_index, to_mediapipe, ExportError, MediaPipeHand, MediaPipeLandmark,
    MEDIAPIPE_FORMAT, MEDIAPIPE_LANDMARKS,
};
pub use schema::{
    deserialize, serialize, AnnotationRecord, DecodeLimits, SchemaViolation, DEFAULT_MAX_COORDINATE,
};
pub use store::write_atomic;
