//! Plain-text rendering of an annotation record.
//!
//! Distances are rounded to two decimals here and only here; the record keeps
//! full precision.

use handmeasure_core::{JointRole, Segment, SegmentState, JOINTS_PER_SEGMENT};
use handmeasure_io::AnnotationRecord;
use std::fmt::Write;

fn role_label(index: usize) -> &'static str {
    JointRole::from_index(index).map_or("?", JointRole::label)
}

fn state_label(state: SegmentState) -> String {
    match state {
        SegmentState::Empty => "empty".to_owned(),
        SegmentState::Partial(n) => format!("{n}/{JOINTS_PER_SEGMENT}"),
        SegmentState::Full => "complete".to_owned(),
    }
}

/// Multi-line summary: image, scale, then per-segment points and distances.
pub fn render(record: &AnnotationRecord) -> String {
    let mut out = String::new();
    let cal = &record.calibration;
    let _ = writeln!(out, "image:  {}", record.image_path);
    match cal.pixels_per_cm() {
        Some(ratio) => {
            let _ = writeln!(
                out,
                "scale:  {ratio:.4} px/cm (reference {:.2} cm, {} marker(s))",
                cal.reference_size_cm(),
                record.detections.len()
            );
        }
        None => {
            let _ = writeln!(
                out,
                "scale:  uncalibrated (reference {:.2} cm, {} marker(s))",
                cal.reference_size_cm(),
                record.detections.len()
            );
        }
    }
    let _ = writeln!(
        out,
        "points: {}/{}",
        record.landmarks.total(),
        Segment::COUNT * JOINTS_PER_SEGMENT
    );

    for segment in Segment::ALL {
        let points = record.landmarks.points(segment);
        let _ = writeln!(
            out,
            "\n{} [{}]",
            segment.label(),
            state_label(record.landmarks.state(segment))
        );
        for (i, p) in points.iter().enumerate() {
            let _ = writeln!(out, "  {:<8} ({}, {})", role_label(i), p.x, p.y);
        }
        for m in record.measurements.get(segment) {
            let _ = write!(
                out,
                "  {} -> {}: {:.2} px",
                role_label(m.from_joint),
                role_label(m.to_joint),
                m.pixel_distance
            );
            match m.cm_distance {
                Some(cm) => {
                    let _ = writeln!(out, ", {cm:.2} cm");
                }
                None => out.push('\n'),
            }
        }
        if let Some(total) = record.measurements.total(segment) {
            let _ = write!(out, "  total: {:.2} px", total.pixel);
            match total.cm {
                Some(cm) => {
                    let _ = writeln!(out, ", {cm:.2} cm");
                }
                None => out.push('\n'),
            }
        }
    }

    let incomplete: Vec<&str> = record
        .landmarks
        .incomplete_segments()
        .into_iter()
        .map(Segment::as_str)
        .collect();
    if !incomplete.is_empty() {
        let _ = writeln!(out, "\nincomplete: {}", incomplete.join(", "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use handmeasure_annotate::AnnotationSession;
    use handmeasure_core::{ImageSize, JointPoint};
    use handmeasure_scale::ScaleCalibration;

    #[test]
    fn renders_points_distances_and_missing_segments() {
        let mut session = AnnotationSession::new(ImageSize::new(100, 100)).expect("session");
        session.place_point(JointPoint::new(0, 0)).expect("place");
        session.place_point(JointPoint::new(30, 40)).expect("place");
        let calibration = ScaleCalibration::from_ratio(10.0, 7.0).expect("ratio");
        let record = AnnotationRecord::from_session("h.png", &session, calibration, vec![]);

        let text = render(&record);
        assert!(text.contains("scale:  10.0000 px/cm"));
        assert!(text.contains("points: 2/20"));
        assert!(text.contains("Thumb [2/4]"));
        assert!(text.contains("Joint 1  (30, 40)"));
        assert!(text.contains("Start -> Joint 1: 50.00 px, 5.00 cm"));
        assert!(text.contains("incomplete: thumb, index, middle, ring, pinky"));
    }

    #[test]
    fn complete_hand_lists_nothing_missing() {
        let mut session = AnnotationSession::new(ImageSize::new(100, 100)).expect("session");
        for segment in Segment::ALL {
            session.select_segment(segment);
            for j in 0..4 {
                session.place_point(JointPoint::new(j, j)).expect("place");
            }
        }
        let record =
            AnnotationRecord::from_session("h.png", &session, ScaleCalibration::default(), vec![]);
        let text = render(&record);
        assert!(text.contains("points: 20/20"));
        assert!(text.contains("Pinky [complete]"));
        assert!(!text.contains("incomplete"));
    }

    #[test]
    fn uncalibrated_has_no_centimetres() {
        let mut session = AnnotationSession::new(ImageSize::new(100, 100)).expect("session");
        session.place_point(JointPoint::new(0, 0)).expect("place");
        session.place_point(JointPoint::new(0, 10)).expect("place");
        let record =
            AnnotationRecord::from_session("h.png", &session, ScaleCalibration::default(), vec![]);
        let text = render(&record);
        assert!(text.contains("uncalibrated"));
        assert!(!text.contains(" cm\n"));
    }
}
