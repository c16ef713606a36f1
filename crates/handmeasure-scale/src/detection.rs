use nalgebra::Point2;
use serde::{Deserialize, Serialize};

pub const MARKER_CORNERS: usize = 4;

/// One fiducial marker reported by an external detector.
///
/// Corners are in source-image pixels and follow a consistent winding
/// (TL, TR, BR, BL for AprilTag/ArUco detectors).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerDetection {
    pub id: u32,
    pub corners: [Point2<f64>; MARKER_CORNERS],
}

impl MarkerDetection {
    pub fn new(id: u32, corners: [Point2<f64>; MARKER_CORNERS]) -> Self {
        Self { id, corners }
    }

    /// Build from plain `[x, y]` pairs.
    pub fn from_xy(id: u32, corners: [[f64; 2]; MARKER_CORNERS]) -> Self {
        Self::new(id, corners.map(|[x, y]| Point2::new(x, y)))
    }

    pub fn to_xy(&self) -> [[f64; 2]; MARKER_CORNERS] {
        self.corners.map(|p| [p.x, p.y])
    }

    /// Lengths of the four edges between adjacent corners, wrapping 3 -> 0.
    pub fn edge_lengths(&self) -> [f64; MARKER_CORNERS] {
        std::array::from_fn(|i| {
            nalgebra::distance(&self.corners[i], &self.corners[(i + 1) % MARKER_CORNERS])
        })
    }

    /// Mean of the corners.
    pub fn center(&self) -> Point2<f64> {
        let sum = self
            .corners
            .iter()
            .fold(nalgebra::Vector2::zeros(), |acc, p| acc + p.coords);
        Point2::from(sum / MARKER_CORNERS as f64)
    }
}
