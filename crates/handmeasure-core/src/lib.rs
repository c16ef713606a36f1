//! Core types for hand joint annotation.
//!
//! This crate is small and purely geometric. It knows nothing about marker
//! detection, calibration or file formats; those live in the sibling
//! `handmeasure-*` crates.
//!
//! - [`Segment`] / [`JointRole`]: the fixed finger and joint vocabulary.
//! - [`JointPoint`] / [`ImageSize`]: integer pixel coordinates in source-image space.
//! - [`Landmarks`]: the per-segment point table with its 4-point capacity invariant.
//! - [`DisplayMapping`]: display surface -> source image coordinate transform.

mod coords;
mod landmarks;
mod logger;
mod point;
mod segment;

pub use coords::{to_source, DisplayMapping, DisplaySize, MapError};
pub use landmarks::{LandmarkError, Landmarks, SegmentState};
pub use point::{ImageSize, JointPoint};
pub use segment::{JointRole, ParseSegmentError, Segment, JOINTS_PER_SEGMENT};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_from_verbosity};
