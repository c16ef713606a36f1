//! Joint annotation and measurement.
//!
//! [`AnnotationSession`] is the only mutable state: which joint points are
//! placed on which segment, and which segment receives the next click.
//! [`compute`] turns a landmark table plus a scale calibration into
//! consecutive-joint distances.

mod measure;
mod session;

pub use measure::{
    compute, compute_segment, Measurement, MeasurementError, MeasurementTable, SegmentLength,
};
pub use session::{AnnotateError, AnnotationSession};
