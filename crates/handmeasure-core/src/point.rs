use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Integer pixel coordinate in source-image space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JointPoint {
    pub x: u32,
    pub y: u32,
}

impl JointPoint {
    #[inline]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn to_point2(self) -> Point2<f64> {
        Point2::new(f64::from(self.x), f64::from(self.y))
    }

    /// Euclidean distance in pixels.
    #[inline]
    pub fn distance_to(self, other: JointPoint) -> f64 {
        nalgebra::distance(&self.to_point2(), &other.to_point2())
    }
}

impl From<(u32, u32)> for JointPoint {
    fn from((x, y): (u32, u32)) -> Self {
        Self::new(x, y)
    }
}

/// Pixel dimensions of the original (unscaled) source image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True if `p` is a valid index into the pixel grid.
    #[inline]
    pub fn contains(&self, p: JointPoint) -> bool {
        p.x < self.width && p.y < self.height
    }
}
