use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

fn handmeasure() -> Command {
    Command::cargo_bin("handmeasure").expect("binary built")
}

fn write_json(path: &Path, value: &Value) {
    fs::write(path, serde_json::to_string_pretty(value).expect("json")).expect("write");
}

fn marker(id: u32, side: f64) -> Value {
    json!({"id": id, "corners": [[0.0, 0.0], [side, 0.0], [side, side], [0.0, side]]})
}

fn uncalibrated_document() -> Value {
    json!({
        "image_path": "missing.jpg",
        "landmarks": {
            "thumb_0": {"x": 0, "y": 0},
            "thumb_1": {"x": 0, "y": 70},
            "index_0": {"x": 960, "y": 540}
        },
        "scale_info": {"calibrated": false, "pixels_per_cm": null, "apriltag_size_cm": 7.0},
        "measurements": {
            "thumb": [{"from_joint": 0, "to_joint": 1, "pixel_distance": 70.0, "cm_distance": null}],
            "index": [], "middle": [], "ring": [], "pinky": []
        },
        "apriltags": [marker(4, 35.0)]
    })
}

#[test]
fn calibrate_prints_scale_info() {
    let dir = tempfile::tempdir().expect("tempdir");
    let detections = dir.path().join("detections.json");
    write_json(&detections, &json!([marker(7, 70.0), marker(3, 37.3)]));

    let output = handmeasure()
        .arg("calibrate")
        .arg(&detections)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let scale: Value = serde_json::from_slice(&output).expect("scale json");
    assert_eq!(scale["calibrated"], Value::Bool(true));
    let ratio = scale["pixels_per_cm"].as_f64().expect("ratio");
    approx::assert_abs_diff_eq!(ratio, 37.3 / 7.0, epsilon = 1e-12);
}

#[test]
fn measure_recalibrates_in_place() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = dir.path().join("hand.json");
    write_json(&doc, &uncalibrated_document());

    handmeasure()
        .arg("measure")
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("5.0000 px/cm"));

    let saved: Value = serde_json::from_str(&fs::read_to_string(&doc).expect("read")).expect("json");
    assert_eq!(saved["scale_info"]["calibrated"], Value::Bool(true));
    assert_eq!(saved["measurements"]["thumb"][0]["cm_distance"], json!(14.0));
}

#[test]
fn info_lists_segments() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = dir.path().join("hand.json");
    write_json(&doc, &uncalibrated_document());

    handmeasure()
        .arg("info")
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("Thumb [2/4]"))
        .stdout(predicate::str::contains("Start -> Joint 1: 70.00 px"))
        .stdout(predicate::str::contains("uncalibrated"));
}

#[test]
fn invalid_document_is_refused() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = dir.path().join("bad.json");
    let mut value = uncalibrated_document();
    value["landmarks"]["thumb_3"] = json!({"x": 1, "y": 1});
    write_json(&doc, &value);

    handmeasure()
        .arg("info")
        .arg(&doc)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a contiguous prefix"));
}

#[test]
fn convert_uses_fallback_size_for_missing_image() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = dir.path().join("hand.json");
    write_json(&doc, &uncalibrated_document());

    handmeasure()
        .arg("convert")
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("4 landmarks (1920x1080)"));

    let out = dir.path().join("hand_mediapipe.json");
    let hand: Value = serde_json::from_str(&fs::read_to_string(out).expect("read")).expect("json");
    assert_eq!(hand["format"], "mediapipe_hand_landmarks");
    let index_base = &hand["hand_landmarks"][3];
    assert_eq!(index_base["index"], 5);
    assert_eq!(index_base["x"], json!(0.5));
    assert_eq!(index_base["y"], json!(0.5));
}

#[test]
fn convert_accepts_explicit_size() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = dir.path().join("hand.json");
    let out = dir.path().join("mp.json");
    write_json(&doc, &uncalibrated_document());

    handmeasure()
        .args(["convert", "--image-size", "100x70", "--out"])
        .arg(&out)
        .arg(&doc)
        .assert()
        .success();
    let hand: Value = serde_json::from_str(&fs::read_to_string(out).expect("read")).expect("json");
    assert_eq!(hand["hand_landmarks"][2]["y"], json!(1.0));
}

#[test]
fn replay_writes_a_loadable_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let script = dir.path().join("script.json");
    let out = dir.path().join("hand.json");
    write_json(
        &script,
        &json!({
            "image_path": "hand.jpg",
            "image_size": {"width": 400, "height": 300},
            "display_size": {"width": 200.0, "height": 150.0},
            "detections": [marker(0, 70.0)],
            "events": [
                {"op": "click", "x": 10.0, "y": 10.0},
                {"op": "click", "x": 10.0, "y": 25.0},
                {"op": "click", "x": 500.0, "y": 25.0},
                {"op": "select", "segment": "pinky"},
                {"op": "place", "x": 399, "y": 299}
            ]
        }),
    );

    handmeasure()
        .arg("replay")
        .arg(&script)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 points, 1 rejected event(s)"))
        .stderr(predicate::str::contains(
            "saved with incomplete segments: thumb, index, middle, ring, pinky",
        ));

    let doc: Value = serde_json::from_str(&fs::read_to_string(&out).expect("read")).expect("json");
    assert_eq!(doc["landmarks"]["thumb_1"], json!({"x": 20, "y": 50}));
    assert_eq!(doc["measurements"]["thumb"][0]["cm_distance"], json!(3.0));

    handmeasure().arg("info").arg(&out).assert().success();
}

#[test]
fn bad_reference_size_is_rejected() {
    handmeasure()
        .args(["--reference-size-cm", "0", "info", "nothing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reference"));
}
