//! Consecutive-joint distances.

use handmeasure_core::{JointPoint, Landmarks, Segment, JOINTS_PER_SEGMENT};
use handmeasure_scale::ScaleCalibration;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Distance between joint `from_joint` and `from_joint + 1` of one segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    pub segment: Segment,
    pub from_joint: usize,
    pub to_joint: usize,
    pub pixel_distance: f64,
    /// `None` when the image has no scale calibration; never zero-filled.
    pub cm_distance: Option<f64>,
}

/// Summed length of all measured bones of one segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentLength {
    pub pixel: f64,
    pub cm: Option<f64>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MeasurementError {
    #[error("{segment} has {count} measurements, at most {} allowed", JOINTS_PER_SEGMENT - 1)]
    TooMany { segment: Segment, count: usize },
    #[error("{segment} measurement {position} pairs joints {from}->{to}, expected {position}->{}", .position + 1)]
    NotConsecutive {
        segment: Segment,
        position: usize,
        from: usize,
        to: usize,
    },
    #[error("{segment} measurement {position} is filed under {found}")]
    WrongSegment {
        segment: Segment,
        position: usize,
        found: Segment,
    },
    #[error("{segment} measurement {position} has invalid distance {value}")]
    InvalidDistance {
        segment: Segment,
        position: usize,
        value: f64,
    },
}

/// Measurements for every segment, in [`Segment::ALL`] order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeasurementTable {
    segments: [Vec<Measurement>; Segment::COUNT],
}

impl MeasurementTable {
    /// Assemble a table from externally supplied rows, checking that each
    /// segment lists consecutive pairs `(0,1), (1,2), ...` with sane distances.
    pub fn from_segments<I>(segments: I) -> Result<Self, MeasurementError>
    where
        I: IntoIterator<Item = (Segment, Vec<Measurement>)>,
    {
        let mut out = Self::default();
        for (segment, rows) in segments {
            if rows.len() >= JOINTS_PER_SEGMENT {
                return Err(MeasurementError::TooMany {
                    segment,
                    count: rows.len(),
                });
            }
            for (position, m) in rows.iter().enumerate() {
                if m.segment != segment {
                    return Err(MeasurementError::WrongSegment {
                        segment,
                        position,
                        found: m.segment,
                    });
                }
                if m.from_joint != position || m.to_joint != position + 1 {
                    return Err(MeasurementError::NotConsecutive {
                        segment,
                        position,
                        from: m.from_joint,
                        to: m.to_joint,
                    });
                }
                let bad = |v: f64| !v.is_finite() || v < 0.0;
                if let Some(value) = Some(m.pixel_distance)
                    .into_iter()
                    .chain(m.cm_distance)
                    .find(|v| bad(*v))
                {
                    return Err(MeasurementError::InvalidDistance {
                        segment,
                        position,
                        value,
                    });
                }
            }
            out.segments[segment.index()] = rows;
        }
        Ok(out)
    }

    #[inline]
    pub fn get(&self, segment: Segment) -> &[Measurement] {
        &self.segments[segment.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Segment, &[Measurement])> + '_ {
        Segment::ALL
            .into_iter()
            .map(move |s| (s, self.segments[s.index()].as_slice()))
    }

    /// Total number of measurements across segments.
    pub fn len(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of the segment's measured distances; `None` if it has none.
    ///
    /// The centimeter total is present only when every row carries one.
    pub fn total(&self, segment: Segment) -> Option<SegmentLength> {
        let rows = self.get(segment);
        if rows.is_empty() {
            return None;
        }
        let pixel: f64 = rows.iter().map(|m| m.pixel_distance).sum();
        let cm = rows.iter().map(|m| m.cm_distance).sum::<Option<f64>>();
        Some(SegmentLength { pixel, cm })
    }
}

/// Measurements of one segment's consecutive joint pairs.
pub fn compute_segment(
    segment: Segment,
    points: &[JointPoint],
    calibration: &ScaleCalibration,
) -> Vec<Measurement> {
    points
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let pixel_distance = pair[0].distance_to(pair[1]);
            Measurement {
                segment,
                from_joint: i,
                to_joint: i + 1,
                pixel_distance,
                cm_distance: calibration.to_cm(pixel_distance),
            }
        })
        .collect()
}

/// Measure every segment: `k` points yield `k - 1` consecutive-pair rows.
///
/// Pure; repeated calls on unchanged inputs give identical tables.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(points = landmarks.total()))
)]
pub fn compute(landmarks: &Landmarks, calibration: &ScaleCalibration) -> MeasurementTable {
    let mut table = MeasurementTable::default();
    for (segment, points) in landmarks.iter() {
        table.segments[segment.index()] = compute_segment(segment, points, calibration);
    }
    table
}
