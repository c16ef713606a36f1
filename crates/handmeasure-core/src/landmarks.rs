//! Per-segment joint point table.

use crate::point::JointPoint;
use crate::segment::{Segment, JOINTS_PER_SEGMENT};
use serde::{Deserialize, Serialize};

/// Errors raised when the landmark table would violate its capacity invariant.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LandmarkError {
    #[error("segment {segment} already holds {} points", JOINTS_PER_SEGMENT)]
    SegmentFull { segment: Segment },
    #[error("segment {segment} has {count} points, at most {} allowed", JOINTS_PER_SEGMENT)]
    TooManyPoints { segment: Segment, count: usize },
    #[error("segment {segment} listed more than once")]
    DuplicateSegment { segment: Segment },
}

/// Annotation progress of one segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "points")]
pub enum SegmentState {
    Empty,
    Partial(usize),
    Full,
}

impl SegmentState {
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => SegmentState::Empty,
            n if n >= JOINTS_PER_SEGMENT => SegmentState::Full,
            n => SegmentState::Partial(n),
        }
    }
}

/// Ordered joint points for every segment.
///
/// Points are only ever appended or popped from the end, and no segment holds
/// more than [`JOINTS_PER_SEGMENT`] points. Insertion order is anatomical
/// order: index 0 is the base, index 3 the tip.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Landmarks {
    segments: [Vec<JointPoint>; Segment::COUNT],
}

impl Landmarks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from explicit per-segment point lists.
    ///
    /// Segments not listed stay empty.
    pub fn from_segments<I>(segments: I) -> Result<Self, LandmarkError>
    where
        I: IntoIterator<Item = (Segment, Vec<JointPoint>)>,
    {
        let mut out = Self::default();
        let mut seen = [false; Segment::COUNT];
        for (segment, points) in segments {
            if std::mem::replace(&mut seen[segment.index()], true) {
                return Err(LandmarkError::DuplicateSegment { segment });
            }
            if points.len() > JOINTS_PER_SEGMENT {
                return Err(LandmarkError::TooManyPoints {
                    segment,
                    count: points.len(),
                });
            }
            out.segments[segment.index()] = points;
        }
        Ok(out)
    }

    #[inline]
    pub fn points(&self, segment: Segment) -> &[JointPoint] {
        &self.segments[segment.index()]
    }

    #[inline]
    pub fn count(&self, segment: Segment) -> usize {
        self.segments[segment.index()].len()
    }

    pub fn state(&self, segment: Segment) -> SegmentState {
        SegmentState::from_count(self.count(segment))
    }

    /// Total number of placed points across all segments.
    pub fn total(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(Vec::is_empty)
    }

    /// Segments that do not yet hold all four joints, in [`Segment::ALL`] order.
    pub fn incomplete_segments(&self) -> Vec<Segment> {
        Segment::ALL
            .into_iter()
            .filter(|s| self.state(*s) != SegmentState::Full)
            .collect()
    }

    /// Segments in [`Segment::ALL`] order with their points.
    pub fn iter(&self) -> impl Iterator<Item = (Segment, &[JointPoint])> + '_ {
        Segment::ALL
            .into_iter()
            .map(move |s| (s, self.segments[s.index()].as_slice()))
    }

    /// Append a point; returns its joint index.
    pub fn push(&mut self, segment: Segment, point: JointPoint) -> Result<usize, LandmarkError> {
        let points = &mut self.segments[segment.index()];
        if points.len() >= JOINTS_PER_SEGMENT {
            return Err(LandmarkError::SegmentFull { segment });
        }
        points.push(point);
        Ok(points.len() - 1)
    }

    pub fn pop(&mut self, segment: Segment) -> Option<JointPoint> {
        self.segments[segment.index()].pop()
    }

    pub fn clear_segment(&mut self, segment: Segment) {
        self.segments[segment.index()].clear();
    }

    pub fn clear(&mut self) {
        self.segments.iter_mut().for_each(Vec::clear);
    }
}
