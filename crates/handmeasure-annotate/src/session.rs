use crate::measure::{compute, MeasurementTable};
use handmeasure_core::{
    DisplayMapping, ImageSize, JointPoint, LandmarkError, Landmarks, MapError, Segment,
    SegmentState,
};
use handmeasure_scale::ScaleCalibration;
use log::{debug, warn};
use nalgebra::Point2;

/// Errors reported by [`AnnotationSession`] mutations.
///
/// All of them leave the session unchanged.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AnnotateError {
    #[error("source image has no pixels ({}x{})", .0.width, .0.height)]
    EmptyImage(ImageSize),
    #[error("point ({}, {}) lies outside the {}x{} source image", .point.x, .point.y, .size.width, .size.height)]
    OutOfBounds { point: JointPoint, size: ImageSize },
    #[error("segment {segment} is full, undo or clear it before placing more points")]
    SegmentFull { segment: Segment },
    #[error("display mapping targets a {}x{} image, session holds {}x{}", .mapping.width, .mapping.height, .session.width, .session.height)]
    MappingMismatch { mapping: ImageSize, session: ImageSize },
    #[error(transparent)]
    Map(#[from] MapError),
    #[error(transparent)]
    Landmarks(LandmarkError),
}

impl From<LandmarkError> for AnnotateError {
    fn from(err: LandmarkError) -> Self {
        match err {
            LandmarkError::SegmentFull { segment } => AnnotateError::SegmentFull { segment },
            other => AnnotateError::Landmarks(other),
        }
    }
}

/// Point placement state for one loaded image.
///
/// Each segment moves `Empty -> Partial(1..3) -> Full` through
/// [`place_point`](Self::place_point) and back through
/// [`undo_last`](Self::undo_last). Segments never affect each other.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotationSession {
    image_size: ImageSize,
    landmarks: Landmarks,
    active: Segment,
}

impl AnnotationSession {
    /// Fresh session for a newly loaded image; all segments empty, thumb active.
    pub fn new(image_size: ImageSize) -> Result<Self, AnnotateError> {
        Self::from_landmarks(image_size, Landmarks::new())
    }

    /// Resume annotating from a previously saved landmark table.
    pub fn from_landmarks(
        image_size: ImageSize,
        landmarks: Landmarks,
    ) -> Result<Self, AnnotateError> {
        if image_size.is_empty() {
            return Err(AnnotateError::EmptyImage(image_size));
        }
        if let Some(&point) = landmarks
            .iter()
            .flat_map(|(_, points)| points)
            .find(|p| !image_size.contains(**p))
        {
            return Err(AnnotateError::OutOfBounds {
                point,
                size: image_size,
            });
        }
        Ok(Self {
            image_size,
            landmarks,
            active: Segment::Thumb,
        })
    }

    #[inline]
    pub fn image_size(&self) -> ImageSize {
        self.image_size
    }

    #[inline]
    pub fn landmarks(&self) -> &Landmarks {
        &self.landmarks
    }

    pub fn into_landmarks(self) -> Landmarks {
        self.landmarks
    }

    #[inline]
    pub fn active_segment(&self) -> Segment {
        self.active
    }

    /// Target subsequent placements at `segment`. Progress elsewhere is kept.
    pub fn select_segment(&mut self, segment: Segment) {
        if segment != self.active {
            debug!("active segment {} -> {}", self.active, segment);
        }
        self.active = segment;
    }

    /// Append a point to the active segment; returns its joint index.
    pub fn place_point(&mut self, point: JointPoint) -> Result<usize, AnnotateError> {
        if !self.image_size.contains(point) {
            warn!(
                "rejected point ({}, {}): outside source image",
                point.x, point.y
            );
            return Err(AnnotateError::OutOfBounds {
                point,
                size: self.image_size,
            });
        }
        match self.landmarks.push(self.active, point) {
            Ok(index) => {
                debug!("placed {}_{index} at ({}, {})", self.active, point.x, point.y);
                Ok(index)
            }
            Err(err) => {
                warn!("rejected point ({}, {}): {err}", point.x, point.y);
                Err(err.into())
            }
        }
    }

    /// Map a pointer event through `mapping` and place the resulting point.
    pub fn place_display_point(
        &mut self,
        mapping: &DisplayMapping,
        display_point: Point2<f64>,
    ) -> Result<usize, AnnotateError> {
        if mapping.source() != self.image_size {
            return Err(AnnotateError::MappingMismatch {
                mapping: mapping.source(),
                session: self.image_size,
            });
        }
        let point = mapping.to_source(display_point)?;
        self.place_point(point)
    }

    /// Remove the most recent point of the active segment; no-op when empty.
    pub fn undo_last(&mut self) -> Option<JointPoint> {
        let removed = self.landmarks.pop(self.active);
        if let Some(p) = removed {
            debug!("undo {} point at ({}, {})", self.active, p.x, p.y);
        }
        removed
    }

    pub fn clear_segment(&mut self, segment: Segment) {
        debug!("clear segment {segment}");
        self.landmarks.clear_segment(segment);
    }

    pub fn clear_active(&mut self) {
        self.clear_segment(self.active);
    }

    pub fn clear_all(&mut self) {
        debug!("clear all segments");
        self.landmarks.clear();
    }

    #[inline]
    pub fn points(&self, segment: Segment) -> &[JointPoint] {
        self.landmarks.points(segment)
    }

    #[inline]
    pub fn state(&self, segment: Segment) -> SegmentState {
        self.landmarks.state(segment)
    }

    /// Segments that do not yet hold all four joints.
    pub fn incomplete_segments(&self) -> Vec<Segment> {
        self.landmarks.incomplete_segments()
    }

    pub fn is_complete(&self) -> bool {
        self.incomplete_segments().is_empty()
    }

    /// Current measurement table for this session.
    pub fn measurements(&self, calibration: &ScaleCalibration) -> MeasurementTable {
        compute(&self.landmarks, calibration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handmeasure_core::{DisplaySize, JOINTS_PER_SEGMENT};

    fn session() -> AnnotationSession {
        AnnotationSession::new(ImageSize::new(640, 480)).expect("session")
    }

    #[test]
    fn fifth_placement_fails_and_keeps_first_four_in_order() {
        let mut s = session();
        s.select_segment(Segment::Middle);
        let pts: Vec<_> = (0..5).map(|i| JointPoint::new(10 * i, 20 * i)).collect();
        for (i, p) in pts.iter().take(4).enumerate() {
            assert_eq!(s.place_point(*p), Ok(i));
        }
        assert_eq!(
            s.place_point(pts[4]),
            Err(AnnotateError::SegmentFull {
                segment: Segment::Middle
            })
        );
        assert_eq!(s.points(Segment::Middle), &pts[..4]);
        assert_eq!(s.state(Segment::Middle), SegmentState::Full);
    }

    #[test]
    fn undo_on_empty_segment_is_noop() {
        let mut s = session();
        s.select_segment(Segment::Index);
        s.place_point(JointPoint::new(1, 1)).expect("place");
        s.select_segment(Segment::Ring);
        let before = s.clone();
        assert_eq!(s.undo_last(), None);
        assert_eq!(s, before);
    }

    #[test]
    fn segments_are_independent() {
        let mut s = session();
        s.select_segment(Segment::Thumb);
        s.place_point(JointPoint::new(5, 5)).expect("place");
        s.place_point(JointPoint::new(6, 6)).expect("place");
        s.select_segment(Segment::Pinky);
        s.place_point(JointPoint::new(7, 7)).expect("place");
        assert_eq!(s.undo_last(), Some(JointPoint::new(7, 7)));
        assert_eq!(s.undo_last(), None);
        assert_eq!(s.points(Segment::Thumb).len(), 2);

        s.select_segment(Segment::Thumb);
        s.place_point(JointPoint::new(8, 8)).expect("resume thumb");
        assert_eq!(s.state(Segment::Thumb), SegmentState::Partial(3));
    }

    #[test]
    fn clear_segment_and_clear_all() {
        let mut s = session();
        for seg in Segment::ALL {
            s.select_segment(seg);
            s.place_point(JointPoint::new(3, 4)).expect("place");
        }
        s.clear_segment(Segment::Ring);
        assert_eq!(s.state(Segment::Ring), SegmentState::Empty);
        assert_eq!(s.landmarks().total(), 4);
        s.clear_all();
        assert!(s.landmarks().is_empty());
        assert_eq!(s.active_segment(), Segment::Pinky);
    }

    #[test]
    fn capacity_holds_under_long_mixed_sequences() {
        let mut s = session();
        for step in 0u32..500 {
            let seg = Segment::ALL[(step as usize * 7) % Segment::COUNT];
            s.select_segment(seg);
            match step % 11 {
                0 | 5 => {
                    s.undo_last();
                }
                9 => s.clear_active(),
                _ => {
                    let _ = s.place_point(JointPoint::new(step % 640, step % 480));
                }
            }
            for seg in Segment::ALL {
                assert!(s.points(seg).len() <= JOINTS_PER_SEGMENT);
            }
        }
    }

    #[test]
    fn rejects_points_outside_the_image() {
        let mut s = session();
        let err = s.place_point(JointPoint::new(640, 10)).unwrap_err();
        assert!(matches!(err, AnnotateError::OutOfBounds { .. }));
        assert!(s.landmarks().is_empty());
    }

    #[test]
    fn display_clicks_go_through_the_mapping() {
        let mut s = session();
        let mapping =
            DisplayMapping::new(s.image_size(), DisplaySize::new(320.0, 240.0)).expect("mapping");
        assert_eq!(s.place_display_point(&mapping, Point2::new(50.5, 20.25)), Ok(0));
        assert_eq!(s.points(Segment::Thumb), &[JointPoint::new(101, 40)]);

        assert!(matches!(
            s.place_display_point(&mapping, Point2::new(320.0, 5.0)),
            Err(AnnotateError::Map(MapError::OutOfBounds { .. }))
        ));

        let other = DisplayMapping::identity(ImageSize::new(100, 100)).expect("mapping");
        assert!(matches!(
            s.place_display_point(&other, Point2::new(1.0, 1.0)),
            Err(AnnotateError::MappingMismatch { .. })
        ));
    }

    #[test]
    fn incomplete_segments_lists_everything_not_full() {
        let mut s = session();
        s.select_segment(Segment::Index);
        for i in 0..4 {
            s.place_point(JointPoint::new(i, i)).expect("place");
        }
        assert_eq!(
            s.incomplete_segments(),
            vec![Segment::Thumb, Segment::Middle, Segment::Ring, Segment::Pinky]
        );
        assert!(!s.is_complete());
    }

    #[test]
    fn resume_rejects_points_outside_new_image() {
        let lm = Landmarks::from_segments([(Segment::Ring, vec![JointPoint::new(700, 10)])])
            .expect("landmarks");
        assert!(matches!(
            AnnotationSession::from_landmarks(ImageSize::new(640, 480), lm.clone()),
            Err(AnnotateError::OutOfBounds { .. })
        ));
        let resumed = AnnotationSession::from_landmarks(ImageSize::new(800, 600), lm.clone())
            .expect("fits");
        assert_eq!(resumed.landmarks(), &lm);
    }
}
