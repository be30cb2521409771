use std::path::{Path, PathBuf};

use fsgen_common::error::FsgenError;
use fsgen_pipeline::{run_video, CancelToken, RunContext, RunParams, RunStatus, VideoMeta};
use fsgen_script_model::Funscript;

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("sample-run")
}

/// Copy the fixture sidecars into a scratch directory named after the test,
/// so runs write their outputs there instead of into the repo.
fn scratch_video(test_name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("fsgen-tests")
        .join(format!("{}-{}", test_name, std::process::id()));
    std::fs::create_dir_all(&dir).expect("scratch dir");

    let fixtures = fixture_dir();
    for name in ["clip.detections.json", "clip.cuts.json", "clip.reference.funscript"] {
        std::fs::copy(fixtures.join(name), dir.join(name)).expect("fixture copy");
    }
    dir.join("clip.mp4")
}

fn meta_for(video: &Path) -> VideoMeta {
    VideoMeta {
        path: video.to_path_buf(),
        fps: 30.0,
        width: 1920,
        height: 1080,
    }
}

#[test]
fn full_run_produces_a_valid_script() {
    let video = scratch_video("full-run");
    let ctx = RunContext::new(meta_for(&video), RunParams::default());

    let outcome = run_video(&ctx).expect("run should succeed");
    assert_eq!(outcome.status, RunStatus::Completed);
    assert!(!outcome.raw_points.is_empty(), "tracker should emit points");
    assert!(outcome.script_path.exists());
    assert!(outcome.raw_signal_path.exists());
    assert!(outcome.report_path.exists());

    let script = Funscript::load(&outcome.script_path).expect("script should load back");
    script.validate().expect("script invariants hold");
    assert!(!script.actions.is_empty());
    assert_eq!(script.range, 100);
    for action in &script.actions {
        assert!((0..=100).contains(&action.pos));
    }
    assert_eq!(script.metadata["generator"], "fsgen");
}

#[test]
fn signal_continues_across_the_scene_cut() {
    let video = scratch_video("scene-cut");
    let ctx = RunContext::new(meta_for(&video), RunParams::default());

    let outcome = run_video(&ctx).expect("run should succeed");
    let before = outcome.raw_points.iter().filter(|p| p.frame < 150).count();
    let after = outcome.raw_points.iter().filter(|p| p.frame > 150).count();
    assert!(before > 0, "points before the cut");
    assert!(after > 0, "points after the cut");

    // No artificial discontinuity: the first value after the cut stays near
    // the carried-over seed rather than snapping to an extreme.
    let last_before = outcome
        .raw_points
        .iter()
        .filter(|p| p.frame < 150)
        .next_back()
        .unwrap();
    let first_after = outcome
        .raw_points
        .iter()
        .find(|p| p.frame > 150)
        .unwrap();
    assert!(
        (last_before.distance - first_after.distance).abs() <= 50,
        "cut jump too large: {} -> {}",
        last_before.distance,
        first_after.distance
    );
}

#[test]
fn reference_comparison_lands_in_the_report() {
    let video = scratch_video("with-reference");
    let reference = video.with_file_name("clip.reference.funscript");
    let params = RunParams {
        reference: Some(reference),
        ..Default::default()
    };
    let ctx = RunContext::new(meta_for(&video), params);

    let outcome = run_video(&ctx).expect("run should succeed");
    let report_json = std::fs::read_to_string(&outcome.report_path).unwrap();
    assert!(
        report_json.contains("\"kind\": \"with_reference\""),
        "report should include the deviation section: {report_json}"
    );
}

#[test]
fn pre_cancelled_run_keeps_empty_prefix_without_error() {
    let video = scratch_video("pre-cancelled");
    let cancel = CancelToken::new();
    cancel.cancel();
    let ctx = RunContext::new(meta_for(&video), RunParams::default()).with_cancel(cancel);

    let outcome = run_video(&ctx).expect("cancellation is not a failure");
    assert_eq!(outcome.status, RunStatus::Cancelled);
    assert!(outcome.raw_points.is_empty());
    // Partial (here: empty) outputs are still written.
    assert!(outcome.script_path.exists());
}

#[test]
fn missing_detections_is_missing_input() {
    let dir = std::env::temp_dir()
        .join("fsgen-tests")
        .join(format!("missing-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let ctx = RunContext::new(meta_for(&dir.join("clip.mp4")), RunParams::default());

    let err = run_video(&ctx).expect_err("no sidecar, no run");
    assert!(matches!(err, FsgenError::MissingInput { .. }));
}

#[test]
fn malformed_detections_is_malformed_intermediate() {
    let dir = std::env::temp_dir()
        .join("fsgen-tests")
        .join(format!("malformed-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("clip.detections.json"), "{\"oops\": true}").unwrap();
    let ctx = RunContext::new(meta_for(&dir.join("clip.mp4")), RunParams::default());

    let err = run_video(&ctx).expect_err("garbage document must fail this file");
    assert!(matches!(err, FsgenError::MalformedIntermediate { .. }));
}
