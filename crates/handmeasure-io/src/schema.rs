//! Validated annotation record and its conversion to and from the wire document.

use crate::document::{
    AnnotationDocument, AprilTagEntry, MeasurementEntry, OrderedMap, PixelXY, ScaleInfo,
};
use handmeasure_annotate::{
    compute, AnnotateError, AnnotationSession, Measurement, MeasurementError, MeasurementTable,
};
use handmeasure_core::{ImageSize, JointPoint, LandmarkError, Landmarks, Segment, JOINTS_PER_SEGMENT};
use handmeasure_scale::{CalibrationError, MarkerDetection, ScaleCalibration, ScaleCalibrator};
use std::collections::BTreeMap;

/// Largest pixel coordinate accepted on load unless configured otherwise.
pub const DEFAULT_MAX_COORDINATE: u32 = 100_000;

/// Bounds applied while decoding a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeLimits {
    pub max_coordinate: u32,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_coordinate: DEFAULT_MAX_COORDINATE,
        }
    }
}

/// Reasons a document is refused on load.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SchemaViolation {
    #[error("malformed JSON at line {line}, column {column}: {message}")]
    Malformed {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("landmark key {key:?} is not of the form <segment>_<index>")]
    MalformedKey { key: String },
    #[error("unknown segment in key {key:?}")]
    UnknownSegment { key: String },
    #[error("key {key:?} appears more than once")]
    DuplicateKey { key: String },
    #[error("{segment} joint index {index} is out of range (0..{})", JOINTS_PER_SEGMENT)]
    JointIndexOutOfRange { segment: Segment, index: usize },
    #[error("{segment} joint indices {indices:?} are not a contiguous prefix starting at 0")]
    NonContiguousJoints {
        segment: Segment,
        indices: Vec<usize>,
    },
    #[error("landmark {key} coordinate ({x}, {y}) is outside 0..={max}")]
    CoordinateOutOfRange { key: String, x: i64, y: i64, max: u32 },
    #[error("scale_info is inconsistent: {reason}")]
    InconsistentScale { reason: &'static str },
    #[error("scale_info is invalid: {0}")]
    InvalidScale(#[from] CalibrationError),
    #[error("{segment} measurement {position}: cm_distance disagrees with calibrated = {calibrated}")]
    CmDistanceMismatch {
        segment: Segment,
        position: usize,
        calibrated: bool,
    },
    #[error("{segment} measurement ends at joint {to_joint} but only {points} points are placed")]
    MeasurementWithoutJoints {
        segment: Segment,
        to_joint: usize,
        points: usize,
    },
    #[error("{segment} measurement {position}: stored {field} {stored} does not match {expected} computed from the points")]
    DistanceMismatch {
        segment: Segment,
        position: usize,
        field: &'static str,
        stored: f64,
        expected: f64,
    },
    #[error(transparent)]
    Measurement(#[from] MeasurementError),
    #[error(transparent)]
    Landmarks(#[from] LandmarkError),
}

impl From<&serde_json::Error> for SchemaViolation {
    fn from(err: &serde_json::Error) -> Self {
        SchemaViolation::Malformed {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}

/// Everything a document stores, in validated in-memory form.
///
/// `deserialize(serialize(record)) == record` for every record whose
/// measurements agree with its calibration.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationRecord {
    pub image_path: String,
    pub landmarks: Landmarks,
    pub calibration: ScaleCalibration,
    pub measurements: MeasurementTable,
    pub detections: Vec<MarkerDetection>,
}

impl AnnotationRecord {
    /// Snapshot a session, deriving measurements from `calibration`.
    pub fn from_session(
        image_path: impl Into<String>,
        session: &AnnotationSession,
        calibration: ScaleCalibration,
        detections: Vec<MarkerDetection>,
    ) -> Self {
        Self {
            image_path: image_path.into(),
            landmarks: session.landmarks().clone(),
            calibration,
            measurements: session.measurements(&calibration),
            detections,
        }
    }

    pub fn to_document(&self) -> AnnotationDocument {
        AnnotationDocument {
            image_path: self.image_path.clone(),
            landmarks: encode_landmarks(&self.landmarks),
            scale_info: ScaleInfo {
                calibrated: self.calibration.is_calibrated(),
                pixels_per_cm: self.calibration.pixels_per_cm(),
                apriltag_size_cm: self.calibration.reference_size_cm(),
            },
            measurements: encode_measurements(&self.measurements),
            apriltags: self
                .detections
                .iter()
                .map(|d| AprilTagEntry {
                    id: d.id,
                    corners: d.to_xy(),
                })
                .collect(),
        }
    }

    /// Validate a wire document. Nothing is built unless every check passes.
    pub fn from_document(
        doc: &AnnotationDocument,
        limits: &DecodeLimits,
    ) -> Result<Self, SchemaViolation> {
        let landmarks = decode_landmarks(&doc.landmarks, limits)?;
        let calibration = decode_scale(&doc.scale_info)?;
        let measurements = decode_measurements(&doc.measurements, &landmarks, &calibration)?;
        let detections = doc
            .apriltags
            .iter()
            .map(|tag| MarkerDetection::from_xy(tag.id, tag.corners))
            .collect();
        Ok(Self {
            image_path: doc.image_path.clone(),
            landmarks,
            calibration,
            measurements,
            detections,
        })
    }

    /// Recompute the calibration from the stored detections and refresh the
    /// measurements. A degenerate marker leaves the record uncalibrated.
    pub fn recalibrate(&mut self, calibrator: &ScaleCalibrator) {
        self.calibration = calibrator.calibrate_or_uncalibrated(&self.detections);
        self.measurements = compute(&self.landmarks, &self.calibration);
    }

    /// Reopen the stored points for editing on an image of `image_size`.
    pub fn resume_session(&self, image_size: ImageSize) -> Result<AnnotationSession, AnnotateError> {
        AnnotationSession::from_landmarks(image_size, self.landmarks.clone())
    }
}

/// Build the document for a save request.
pub fn serialize(
    image_path: &str,
    session: &AnnotationSession,
    calibration: &ScaleCalibration,
    measurements: &MeasurementTable,
    detections: &[MarkerDetection],
) -> AnnotationDocument {
    AnnotationRecord {
        image_path: image_path.to_owned(),
        landmarks: session.landmarks().clone(),
        calibration: *calibration,
        measurements: measurements.clone(),
        detections: detections.to_vec(),
    }
    .to_document()
}

/// Validate a document with default limits.
pub fn deserialize(doc: &AnnotationDocument) -> Result<AnnotationRecord, SchemaViolation> {
    AnnotationRecord::from_document(doc, &DecodeLimits::default())
}

fn encode_landmarks(landmarks: &Landmarks) -> OrderedMap<PixelXY> {
    let entries = landmarks
        .iter()
        .flat_map(|(segment, points)| {
            points.iter().enumerate().map(move |(i, p)| {
                (
                    format!("{segment}_{i}"),
                    PixelXY {
                        x: i64::from(p.x),
                        y: i64::from(p.y),
                    },
                )
            })
        })
        .collect();
    OrderedMap(entries)
}

fn encode_measurements(table: &MeasurementTable) -> OrderedMap<Vec<MeasurementEntry>> {
    let entries = table
        .iter()
        .map(|(segment, rows)| {
            let rows = rows
                .iter()
                .map(|m| MeasurementEntry {
                    from_joint: m.from_joint,
                    to_joint: m.to_joint,
                    pixel_distance: m.pixel_distance,
                    cm_distance: m.cm_distance,
                })
                .collect();
            (segment.as_str().to_owned(), rows)
        })
        .collect();
    OrderedMap(entries)
}

fn parse_landmark_key(key: &str) -> Result<(Segment, usize), SchemaViolation> {
    let (segment, index) = key
        .rsplit_once('_')
        .ok_or_else(|| SchemaViolation::MalformedKey { key: key.to_owned() })?;
    let segment = Segment::from_wire(segment)
        .ok_or_else(|| SchemaViolation::UnknownSegment { key: key.to_owned() })?;
    // Exactly one ASCII digit; no sign, padding or whitespace.
    let index = match index.as_bytes() {
        [d @ b'0'..=b'9'] => usize::from(d - b'0'),
        _ => return Err(SchemaViolation::MalformedKey { key: key.to_owned() }),
    };
    if index >= JOINTS_PER_SEGMENT {
        return Err(SchemaViolation::JointIndexOutOfRange { segment, index });
    }
    Ok((segment, index))
}

fn decode_landmarks(
    raw: &OrderedMap<PixelXY>,
    limits: &DecodeLimits,
) -> Result<Landmarks, SchemaViolation> {
    let mut by_segment: BTreeMap<Segment, BTreeMap<usize, JointPoint>> = BTreeMap::new();
    for (key, xy) in raw.iter() {
        let (segment, index) = parse_landmark_key(key)?;
        let max = i64::from(limits.max_coordinate);
        let in_range = |v: i64| (0..=max).contains(&v);
        if !in_range(xy.x) || !in_range(xy.y) {
            return Err(SchemaViolation::CoordinateOutOfRange {
                key: key.to_owned(),
                x: xy.x,
                y: xy.y,
                max: limits.max_coordinate,
            });
        }
        let point = JointPoint::new(xy.x as u32, xy.y as u32);
        if by_segment
            .entry(segment)
            .or_default()
            .insert(index, point)
            .is_some()
        {
            return Err(SchemaViolation::DuplicateKey { key: key.to_owned() });
        }
    }

    let mut segments = Vec::with_capacity(by_segment.len());
    for (segment, joints) in by_segment {
        let contiguous = joints.keys().enumerate().all(|(i, &index)| i == index);
        if !contiguous {
            return Err(SchemaViolation::NonContiguousJoints {
                segment,
                indices: joints.keys().copied().collect(),
            });
        }
        segments.push((segment, joints.into_values().collect()));
    }
    Ok(Landmarks::from_segments(segments)?)
}

fn decode_scale(info: &ScaleInfo) -> Result<ScaleCalibration, SchemaViolation> {
    match (info.calibrated, info.pixels_per_cm) {
        (true, Some(ratio)) => Ok(ScaleCalibration::from_ratio(ratio, info.apriltag_size_cm)?),
        (false, None) => Ok(ScaleCalibration::uncalibrated(info.apriltag_size_cm)?),
        (true, None) => Err(SchemaViolation::InconsistentScale {
            reason: "calibrated without pixels_per_cm",
        }),
        (false, Some(_)) => Err(SchemaViolation::InconsistentScale {
            reason: "pixels_per_cm given while uncalibrated",
        }),
    }
}

fn decode_measurements(
    raw: &OrderedMap<Vec<MeasurementEntry>>,
    landmarks: &Landmarks,
    calibration: &ScaleCalibration,
) -> Result<MeasurementTable, SchemaViolation> {
    let mut seen = [false; Segment::COUNT];
    let mut segments = Vec::with_capacity(raw.len());
    for (key, entries) in raw.iter() {
        let segment = Segment::from_wire(key)
            .ok_or_else(|| SchemaViolation::UnknownSegment { key: key.to_owned() })?;
        if std::mem::replace(&mut seen[segment.index()], true) {
            return Err(SchemaViolation::DuplicateKey { key: key.to_owned() });
        }
        let placed = landmarks.points(segment);
        let points = placed.len();
        let mut rows = Vec::with_capacity(entries.len());
        for (position, e) in entries.iter().enumerate() {
            if e.cm_distance.is_some() != calibration.is_calibrated() {
                return Err(SchemaViolation::CmDistanceMismatch {
                    segment,
                    position,
                    calibrated: calibration.is_calibrated(),
                });
            }
            if e.to_joint >= points {
                return Err(SchemaViolation::MeasurementWithoutJoints {
                    segment,
                    to_joint: e.to_joint,
                    points,
                });
            }
            // Pairs that are not consecutive are rejected by the table below.
            if let Some(from) = placed.get(e.from_joint) {
                let pixel = from.distance_to(placed[e.to_joint]);
                check_distance(segment, position, "pixel_distance", e.pixel_distance, pixel)?;
                if let (Some(stored), Some(cm)) = (e.cm_distance, calibration.to_cm(pixel)) {
                    check_distance(segment, position, "cm_distance", stored, cm)?;
                }
            }
            rows.push(Measurement {
                segment,
                from_joint: e.from_joint,
                to_joint: e.to_joint,
                pixel_distance: e.pixel_distance,
                cm_distance: e.cm_distance,
            });
        }
        segments.push((segment, rows));
    }
    Ok(MeasurementTable::from_segments(segments)?)
}

/// Relative tolerance between a stored distance and one recomputed from the points.
const DISTANCE_TOLERANCE: f64 = 1e-9;

fn check_distance(
    segment: Segment,
    position: usize,
    field: &'static str,
    stored: f64,
    expected: f64,
) -> Result<(), SchemaViolation> {
    if (stored - expected).abs() <= DISTANCE_TOLERANCE * expected.max(1.0) {
        return Ok(());
    }
    Err(SchemaViolation::DistanceMismatch {
        segment,
        position,
        field,
        stored,
        expected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> AnnotationDocument {
        serde_json::from_value(value).expect("wire document")
    }

    fn base(landmarks: serde_json::Value) -> serde_json::Value {
        json!({
            "image_path": "hand.jpg",
            "landmarks": landmarks,
            "scale_info": {"calibrated": false, "pixels_per_cm": null, "apriltag_size_cm": 7.0},
            "measurements": {},
            "apriltags": []
        })
    }

    #[test]
    fn gap_in_joint_indices_is_rejected() {
        let d = doc(base(json!({
            "index_0": {"x": 10, "y": 10},
            "index_2": {"x": 30, "y": 30}
        })));
        assert_eq!(
            deserialize(&d),
            Err(SchemaViolation::NonContiguousJoints {
                segment: Segment::Index,
                indices: vec![0, 2]
            })
        );
    }

    #[test]
    fn index_four_is_out_of_range() {
        let d = doc(base(json!({"ring_4": {"x": 1, "y": 1}})));
        assert!(matches!(
            deserialize(&d),
            Err(SchemaViolation::JointIndexOutOfRange { index: 4, .. })
        ));
    }

    #[test]
    fn negative_and_huge_coordinates_are_rejected_not_clamped() {
        let neg = doc(base(json!({"thumb_0": {"x": -1, "y": 5}})));
        assert!(matches!(
            deserialize(&neg),
            Err(SchemaViolation::CoordinateOutOfRange { x: -1, .. })
        ));
        let huge = doc(base(json!({"thumb_0": {"x": 5, "y": 100_001}})));
        assert!(matches!(
            deserialize(&huge),
            Err(SchemaViolation::CoordinateOutOfRange { y: 100_001, .. })
        ));
        let tight = DecodeLimits { max_coordinate: 4 };
        assert!(AnnotationRecord::from_document(&neg, &tight).is_err());
    }

    #[test]
    fn unknown_and_malformed_keys_are_rejected() {
        let d = doc(base(json!({"wrist_0": {"x": 1, "y": 1}})));
        assert!(matches!(
            deserialize(&d),
            Err(SchemaViolation::UnknownSegment { .. })
        ));
        let d = doc(base(json!({"thumb": {"x": 1, "y": 1}})));
        assert!(matches!(
            deserialize(&d),
            Err(SchemaViolation::MalformedKey { .. })
        ));
    }

    #[test]
    fn non_canonical_landmark_keys_are_rejected() {
        for key in ["THUMB_0", "Index_0", "thumb_+1", "index_00", "ring_ 1", "ring_", "pinky_-0"] {
            let mut landmarks = serde_json::Map::new();
            landmarks.insert(key.to_owned(), json!({"x": 1, "y": 1}));
            let d = doc(base(serde_json::Value::Object(landmarks)));
            let err = deserialize(&d).expect_err(key);
            assert!(
                matches!(
                    err,
                    SchemaViolation::UnknownSegment { .. } | SchemaViolation::MalformedKey { .. }
                ),
                "{key}: {err:?}"
            );
        }
        let d = doc(base(json!({"thumb_10": {"x": 1, "y": 1}})));
        assert!(matches!(
            deserialize(&d),
            Err(SchemaViolation::MalformedKey { .. })
        ));
    }

    #[test]
    fn non_canonical_measurement_key_is_rejected() {
        let mut v = base(json!({}));
        v["measurements"] = json!({"Thumb": []});
        assert_eq!(
            deserialize(&doc(v)),
            Err(SchemaViolation::UnknownSegment {
                key: "Thumb".into()
            })
        );
    }

    #[test]
    fn stored_distances_must_match_the_points() {
        let mut v = base(json!({
            "middle_0": {"x": 1, "y": 1},
            "middle_1": {"x": 2, "y": 2}
        }));
        v["measurements"] = json!({
            "middle": [{"from_joint": 0, "to_joint": 1, "pixel_distance": 999.0, "cm_distance": null}]
        });
        assert!(matches!(
            deserialize(&doc(v.clone())),
            Err(SchemaViolation::DistanceMismatch { field: "pixel_distance", .. })
        ));

        v["measurements"]["middle"][0]["pixel_distance"] = json!(2f64.sqrt());
        assert!(deserialize(&doc(v.clone())).is_ok());

        v["scale_info"] = json!({"calibrated": true, "pixels_per_cm": 2.0, "apriltag_size_cm": 7.0});
        v["measurements"]["middle"][0]["cm_distance"] = json!(1.0);
        assert!(matches!(
            deserialize(&doc(v)),
            Err(SchemaViolation::DistanceMismatch { field: "cm_distance", .. })
        ));
    }

    #[test]
    fn duplicate_landmark_key_is_rejected() {
        let raw = r#"{
            "image_path": "hand.jpg",
            "landmarks": {"thumb_0": {"x": 1, "y": 1}, "thumb_0": {"x": 2, "y": 2}},
            "scale_info": {"calibrated": false, "apriltag_size_cm": 7.0}
        }"#;
        let d: AnnotationDocument = serde_json::from_str(raw).expect("wire document");
        assert!(matches!(
            deserialize(&d),
            Err(SchemaViolation::DuplicateKey { .. })
        ));
    }

    #[test]
    fn scale_info_must_be_consistent() {
        let mut v = base(json!({}));
        v["scale_info"] = json!({"calibrated": true, "pixels_per_cm": null, "apriltag_size_cm": 7.0});
        assert!(matches!(
            deserialize(&doc(v.clone())),
            Err(SchemaViolation::InconsistentScale { .. })
        ));
        v["scale_info"] = json!({"calibrated": true, "pixels_per_cm": 0.0, "apriltag_size_cm": 7.0});
        assert!(matches!(
            deserialize(&doc(v)),
            Err(SchemaViolation::InvalidScale(_))
        ));
    }

    #[test]
    fn cm_distance_must_match_calibration() {
        let mut v = base(json!({
            "pinky_0": {"x": 0, "y": 0},
            "pinky_1": {"x": 0, "y": 10}
        }));
        v["measurements"] = json!({
            "pinky": [{"from_joint": 0, "to_joint": 1, "pixel_distance": 10.0, "cm_distance": 0.0}]
        });
        assert!(matches!(
            deserialize(&doc(v)),
            Err(SchemaViolation::CmDistanceMismatch { calibrated: false, .. })
        ));
    }

    #[test]
    fn measurement_beyond_placed_points_is_rejected() {
        let mut v = base(json!({"pinky_0": {"x": 0, "y": 0}}));
        v["measurements"] = json!({
            "pinky": [{"from_joint": 0, "to_joint": 1, "pixel_distance": 10.0, "cm_distance": null}]
        });
        assert!(matches!(
            deserialize(&doc(v)),
            Err(SchemaViolation::MeasurementWithoutJoints { .. })
        ));
    }

    #[test]
    fn missing_measurement_segments_read_as_empty() {
        let v = base(json!({"middle_0": {"x": 4, "y": 4}}));
        let record = deserialize(&doc(v)).expect("valid");
        assert!(record.measurements.is_empty());
        assert_eq!(record.landmarks.points(Segment::Middle), &[JointPoint::new(4, 4)]);
    }

    #[test]
    fn writer_lists_every_segment_in_order() {
        let session = AnnotationSession::new(ImageSize::new(100, 100)).expect("session");
        let calib = ScaleCalibration::default();
        let d = serialize("a.png", &session, &calib, &session.measurements(&calib), &[]);
        let keys: Vec<_> = d.measurements.iter().map(|(k, _)| k.to_owned()).collect();
        assert_eq!(keys, ["thumb", "index", "middle", "ring", "pinky"]);
        assert!(d.landmarks.is_empty());
    }
}
