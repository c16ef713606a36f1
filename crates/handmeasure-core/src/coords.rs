//! Display surface to source image coordinate mapping.
//!
//! A host UI usually renders the source image scaled to fit a viewport. Pointer
//! events arrive in that scaled *display* space; every persisted coordinate
//! lives in *source* pixel space.

use crate::point::{ImageSize, JointPoint};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Size of the rendered (possibly scaled) image surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplaySize {
    pub width: f64,
    pub height: f64,
}

impl DisplaySize {
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl From<ImageSize> for DisplaySize {
    fn from(size: ImageSize) -> Self {
        Self::new(f64::from(size.width), f64::from(size.height))
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MapError {
    #[error("display point ({x}, {y}) lies outside the rendered image")]
    OutOfBounds { x: f64, y: f64 },
    #[error("source image has no pixels ({width}x{height})")]
    EmptySource { width: u32, height: u32 },
    #[error("invalid display surface size ({width}x{height})")]
    InvalidDisplay { width: f64, height: f64 },
}

/// Per-axis scale between a display surface and the source pixel grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayMapping {
    source: ImageSize,
    display: DisplaySize,
}

impl DisplayMapping {
    pub fn new(source: ImageSize, display: DisplaySize) -> Result<Self, MapError> {
        if source.is_empty() {
            return Err(MapError::EmptySource {
                width: source.width,
                height: source.height,
            });
        }
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(display.width) || !valid(display.height) {
            return Err(MapError::InvalidDisplay {
                width: display.width,
                height: display.height,
            });
        }
        Ok(Self { source, display })
    }

    /// Identity mapping (image rendered at 1:1).
    pub fn identity(source: ImageSize) -> Result<Self, MapError> {
        Self::new(source, source.into())
    }

    #[inline]
    pub fn source(&self) -> ImageSize {
        self.source
    }

    #[inline]
    pub fn display(&self) -> DisplaySize {
        self.display
    }

    #[inline]
    pub fn scale_x(&self) -> f64 {
        f64::from(self.source.width) / self.display.width
    }

    #[inline]
    pub fn scale_y(&self) -> f64 {
        f64::from(self.source.height) / self.display.height
    }

    /// True if `p` falls on the rendered image.
    pub fn contains(&self, p: Point2<f64>) -> bool {
        p.x.is_finite()
            && p.y.is_finite()
            && (0.0..self.display.width).contains(&p.x)
            && (0.0..self.display.height).contains(&p.y)
    }

    /// Map a display point to the source pixel it lands on.
    ///
    /// Coordinates are truncated toward zero and clamped to the pixel grid, so
    /// the result is always a valid pixel index. Points off the rendered image
    /// are rejected.
    pub fn to_source(&self, p: Point2<f64>) -> Result<JointPoint, MapError> {
        if !self.contains(p) {
            return Err(MapError::OutOfBounds { x: p.x, y: p.y });
        }
        let x = truncate_clamped(p.x * self.scale_x(), self.source.width);
        let y = truncate_clamped(p.y * self.scale_y(), self.source.height);
        Ok(JointPoint::new(x, y))
    }

    /// Display position of the centre of a source pixel.
    pub fn to_display(&self, p: JointPoint) -> Point2<f64> {
        Point2::new(
            (f64::from(p.x) + 0.5) / self.scale_x(),
            (f64::from(p.y) + 0.5) / self.scale_y(),
        )
    }
}

fn truncate_clamped(v: f64, extent: u32) -> u32 {
    let max = extent.saturating_sub(1);
    (v.trunc().max(0.0) as u32).min(max)
}

/// One-shot form of [`DisplayMapping::to_source`].
pub fn to_source(
    display_point: Point2<f64>,
    source: ImageSize,
    display: DisplaySize,
) -> Result<JointPoint, MapError> {
    DisplayMapping::new(source, display)?.to_source(display_point)
}
