// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the scan controller state machine

mod common;

use common::{FakeCamera, HandleCounter, Harness, RecordingClipboard, ScriptedDecoder, write_png};
use qr_scanner::backends::camera::BackendError;
use qr_scanner::errors::{ClipboardError, DeviceError, InvalidInputError, ScanError};
use qr_scanner::file_input::SelectedFile;
use qr_scanner::scanner::{
    CancelFlag, ScanController, ScanMode, ScanOutcome, TickOutcome, UiState, run_until_settled,
};
use std::time::{Duration, Instant};

fn misses_then(hits_after: usize, text: &str) -> ScriptedDecoder {
    let mut script: Vec<Option<String>> = vec![None; hits_after];
    script.push(Some(text.to_string()));
    ScriptedDecoder::new(script)
}

fn show_result(harness: &mut Harness) {
    harness.controller.start_camera().unwrap();
    assert_eq!(harness.controller.tick(), TickOutcome::Decoded);
}

#[test]
fn test_camera_decodes_on_sixth_frame_and_releases_device() {
    let mut h = Harness::new(misses_then(5, "HELLO"));

    h.controller.start_camera().unwrap();
    assert_eq!(h.controller.state(), &UiState::Scanning(ScanMode::Camera));
    assert_eq!(h.handles.open(), 1);

    for _ in 0..5 {
        assert_eq!(h.controller.tick(), TickOutcome::Missed);
        assert_eq!(h.controller.state(), &UiState::Scanning(ScanMode::Camera));
        assert_eq!(h.handles.open(), 1);
    }

    assert_eq!(h.controller.tick(), TickOutcome::Decoded);
    let result = h.controller.state().result().expect("result shown");
    assert_eq!(result.text, "HELLO");
    assert_eq!(result.mode, ScanMode::Camera);
    assert!(result.position.is_some());
    assert_eq!(h.handles.open(), 0);
    assert!(!h.controller.is_camera_open());

    // Nothing left to scan
    assert_eq!(h.controller.tick(), TickOutcome::Inactive);
    assert_eq!(h.decoder.calls(), 6);
}

#[test]
fn test_camera_never_gives_up_on_its_own() {
    let mut h = Harness::new(ScriptedDecoder::new(Vec::<Option<String>>::new()));

    h.controller.start_camera().unwrap();
    for _ in 0..500 {
        assert_eq!(h.controller.tick(), TickOutcome::Missed);
    }

    assert_eq!(h.controller.state(), &UiState::Scanning(ScanMode::Camera));
    assert_eq!(h.handles.open(), 1);

    h.controller.stop_camera();
    assert_eq!(h.controller.state(), &UiState::Idle);
    assert_eq!(h.handles.open(), 0);
}

#[test]
fn test_camera_without_frame_keeps_waiting() {
    let handles = HandleCounter::default();
    let decoder = ScriptedDecoder::new(vec![Some("never sampled")]);
    let mut controller = ScanController::new(
        Box::new(FakeCamera::silent(handles.clone())),
        Box::new(decoder.clone()),
        Box::new(RecordingClipboard::default()),
    );

    controller.start_camera().unwrap();
    for _ in 0..3 {
        assert_eq!(controller.tick(), TickOutcome::Waiting);
    }

    assert_eq!(controller.state(), &UiState::Scanning(ScanMode::Camera));
    assert_eq!(decoder.calls(), 0);
    assert_eq!(handles.open(), 1);
}

#[test]
fn test_cameras_listed_with_preferred_device() {
    let mut h = Harness::new(ScriptedDecoder::default());

    let cameras = h.controller.cameras();
    assert_eq!(cameras.len(), 1);
    let preferred = h.controller.constraints().select(&cameras);
    assert_eq!(preferred.map(|c| c.path.as_str()), Some("pipewire-serial-1"));
    assert_eq!(h.handles.open(), 0);
}

#[test]
fn test_non_image_file_never_enters_scanning() {
    let mut h = Harness::new(misses_then(0, "unused"));

    let err = h
        .controller
        .process_file(SelectedFile::from_path("notes.txt"))
        .unwrap_err();

    assert!(matches!(
        err,
        ScanError::InvalidInput(InvalidInputError::NotAnImage { ref name, .. }) if name == "notes.txt"
    ));
    let shown = h.controller.state().error().expect("error shown");
    assert!(shown.user_message().to_lowercase().contains("invalid image"));

    assert_eq!(h.controller.tick(), TickOutcome::Inactive);
    assert_eq!(h.decoder.calls(), 0);
    assert_eq!(h.controller.active_tab(), ScanMode::File);
}

#[test]
fn test_explicit_mime_is_checked_by_prefix() {
    let mut h = Harness::new(misses_then(0, "unused"));

    let result = h
        .controller
        .process_file(SelectedFile::with_mime("photo.png", "application/pdf"));

    assert!(matches!(result, Err(ScanError::InvalidInput(_))));
    assert!(!h.controller.state().is_scanning());
}

#[test]
fn test_file_decodes_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "code.png");
    let mut h = Harness::new(misses_then(0, "from a file"));

    h.controller
        .process_file(SelectedFile::from_path(&path))
        .unwrap();
    assert_eq!(h.controller.state(), &UiState::Scanning(ScanMode::File));
    assert!(h.controller.preview().is_some());

    assert_eq!(h.controller.tick(), TickOutcome::Decoded);
    let result = h.controller.state().result().expect("result shown");
    assert_eq!(result.text, "from a file");
    assert_eq!(result.mode, ScanMode::File);
    assert_eq!(h.decoder.calls(), 1);
}

#[test]
fn test_file_without_code_shows_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "blank.png");
    let mut h = Harness::new(ScriptedDecoder::new(vec![None::<String>]));

    h.controller
        .process_file(SelectedFile::from_path(&path))
        .unwrap();

    assert_eq!(h.controller.tick(), TickOutcome::Failed);
    assert_eq!(h.controller.state().error(), Some(&ScanError::DecodeNotFound));

    // No retry loop for files
    assert_eq!(h.controller.tick(), TickOutcome::Inactive);
    assert_eq!(h.decoder.calls(), 1);
}

#[test]
fn test_unreadable_image_is_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"definitely not a png").unwrap();
    let mut h = Harness::new(misses_then(0, "unused"));

    let err = h
        .controller
        .process_file(SelectedFile::from_path(&path))
        .unwrap_err();

    assert!(matches!(
        err,
        ScanError::InvalidInput(InvalidInputError::Unreadable { .. })
    ));
    assert!(h.controller.preview().is_none());
}

#[test]
fn test_tab_switch_releases_camera() {
    let mut h = Harness::new(misses_then(10, "unused"));

    h.controller.start_camera().unwrap();
    h.controller.tick();
    assert_eq!(h.handles.open(), 1);

    h.controller.switch_tab(ScanMode::File);
    assert_eq!(h.handles.open(), 0);
    assert_eq!(h.controller.state(), &UiState::Idle);
    assert_eq!(h.controller.active_tab(), ScanMode::File);
}

#[test]
fn test_switch_to_same_tab_still_releases_camera() {
    let mut h = Harness::new(misses_then(10, "unused"));

    h.controller.start_camera().unwrap();
    h.controller.switch_tab(ScanMode::Camera);
    assert_eq!(h.handles.open(), 0);
    assert_eq!(h.controller.state(), &UiState::Idle);

    // Releasing a released device is a no-op
    h.controller.switch_tab(ScanMode::Camera);
    assert_eq!(h.handles.open(), 0);
}

#[test]
fn test_new_scan_releases_before_acquiring() {
    let mut h = Harness::new(misses_then(10, "unused"));

    h.controller.start_camera().unwrap();
    h.controller.start_camera().unwrap();
    h.controller.start_camera().unwrap();

    assert_eq!(h.handles.opened_total(), 3);
    assert_eq!(h.handles.max_open(), 1);
    assert_eq!(h.handles.open(), 1);

    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "code.png");
    h.controller
        .process_file(SelectedFile::from_path(&path))
        .unwrap();
    assert_eq!(h.handles.open(), 0);
}

#[test]
fn test_new_scan_clears_previous_result() {
    let mut h = Harness::new(ScriptedDecoder::new(vec![Some("first")]));
    show_result(&mut h);

    h.controller.start_camera().unwrap();
    assert_eq!(h.controller.state(), &UiState::Scanning(ScanMode::Camera));
    assert!(h.controller.state().result().is_none());
}

#[test]
fn test_permission_denied_shows_device_error() {
    let handles = HandleCounter::default();
    let mut controller = ScanController::new(
        Box::new(FakeCamera::failing(
            handles.clone(),
            BackendError::PermissionDenied("portal refused".into()),
        )),
        Box::new(ScriptedDecoder::default()),
        Box::new(RecordingClipboard::default()),
    );

    let err = controller.start_camera().unwrap_err();
    assert_eq!(
        err,
        ScanError::Device(DeviceError::PermissionDenied("portal refused".into()))
    );
    assert!(controller.state().error().is_some());
    assert_eq!(handles.open(), 0);

    controller.retry();
    assert_eq!(controller.state(), &UiState::Idle);
}

#[test]
fn test_missing_camera_shows_device_error() {
    let handles = HandleCounter::default();
    let mut controller = ScanController::new(
        Box::new(FakeCamera::failing(
            handles,
            BackendError::DeviceNotFound("none".into()),
        )),
        Box::new(ScriptedDecoder::default()),
        Box::new(RecordingClipboard::default()),
    );

    assert_eq!(
        controller.start_camera(),
        Err(ScanError::Device(DeviceError::NoCameraFound))
    );
}

#[test]
fn test_clear_returns_to_idle_from_any_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "code.png");

    // Scanning camera
    let mut h = Harness::new(misses_then(10, "unused"));
    h.controller.start_camera().unwrap();
    h.controller.tick();
    h.controller.clear();
    assert_eq!(h.controller.state(), &UiState::Idle);
    assert_eq!(h.handles.open(), 0);
    assert!(h.controller.preview().is_none());

    // Result shown
    let mut h = Harness::new(misses_then(0, "HELLO"));
    show_result(&mut h);
    h.controller.clear();
    assert_eq!(h.controller.state(), &UiState::Idle);

    // Error shown, with a file selected
    let mut h = Harness::new(misses_then(0, "unused"));
    let _ = h.controller.process_file(SelectedFile::from_path("notes.txt"));
    h.controller.clear();
    assert_eq!(h.controller.state(), &UiState::Idle);
    assert!(h.controller.selected_file().is_none());

    // Scanning a file
    let mut h = Harness::new(misses_then(0, "unused"));
    h.controller
        .process_file(SelectedFile::from_path(&path))
        .unwrap();
    h.controller.clear();
    assert_eq!(h.controller.state(), &UiState::Idle);
    assert!(h.controller.selected_file().is_none());
    assert!(h.controller.preview().is_none());
    assert_eq!(h.controller.tick(), TickOutcome::Inactive);
}

#[test]
fn test_stop_camera_keeps_shown_result() {
    let mut h = Harness::new(misses_then(0, "HELLO"));
    show_result(&mut h);

    h.controller.stop_camera();
    assert_eq!(h.controller.state().result().map(|r| r.text.as_str()), Some("HELLO"));
}

#[test]
fn test_retry_only_dismisses_errors() {
    let mut h = Harness::new(misses_then(0, "HELLO"));
    show_result(&mut h);

    h.controller.retry();
    assert!(h.controller.state().result().is_some());
}

#[test]
fn test_copy_feedback_lasts_two_seconds() {
    let mut h = Harness::new(misses_then(0, "HELLO"));
    show_result(&mut h);
    let t0 = Instant::now();

    assert_eq!(h.controller.copy_label(t0), "Copy");
    h.controller.copy_result(t0).unwrap();
    assert_eq!(h.clipboard.written.borrow().as_slice(), ["HELLO"]);
    assert_eq!(h.controller.copy_label(t0), "Copied!");
    assert!(!h.controller.is_copy_enabled(t0));

    // Disabled while confirming
    h.controller.copy_result(t0 + Duration::from_secs(1)).unwrap();
    assert_eq!(h.clipboard.written.borrow().len(), 1);

    let t2 = t0 + Duration::from_secs(2);
    assert!(h.controller.refresh_copy_feedback(t2));
    assert_eq!(h.controller.copy_label(t2), "Copy");

    h.controller.copy_result(t2).unwrap();
    assert_eq!(h.clipboard.written.borrow().len(), 2);
}

#[test]
fn test_copy_without_result_does_nothing() {
    let mut h = Harness::new(misses_then(0, "HELLO"));

    h.controller.copy_result(Instant::now()).unwrap();
    assert!(h.clipboard.written.borrow().is_empty());
    assert_eq!(h.controller.state(), &UiState::Idle);
}

#[test]
fn test_clipboard_failure_shows_error() {
    let clipboard = RecordingClipboard {
        fail: true,
        ..Default::default()
    };
    let mut h = Harness::with_clipboard(misses_then(0, "HELLO"), clipboard);
    show_result(&mut h);

    let err = h.controller.copy_result(Instant::now()).unwrap_err();
    assert!(matches!(
        err,
        ScanError::Clipboard(ClipboardError::WriteFailed(_))
    ));
    assert_eq!(h.controller.state().error(), Some(&err));
    assert!(err.user_message().contains("copy"));
}

#[tokio::test]
async fn test_scan_loop_runs_until_found() {
    let mut h = Harness::new(misses_then(3, "LOOP"));
    h.controller.start_camera().unwrap();

    let outcome =
        run_until_settled(&mut h.controller, Duration::from_millis(1), &CancelFlag::new()).await;

    match outcome {
        ScanOutcome::Found(result) => assert_eq!(result.text, "LOOP"),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(h.decoder.calls(), 4);
    assert_eq!(h.handles.open(), 0);
}

#[tokio::test]
async fn test_scan_loop_observes_cancel_flag() {
    let mut h = Harness::new(misses_then(100, "unused"));
    h.controller.start_camera().unwrap();

    let cancel = CancelFlag::new();
    cancel.cancel();
    let outcome = run_until_settled(&mut h.controller, Duration::from_millis(1), &cancel).await;

    assert_eq!(outcome, ScanOutcome::Cancelled);
    assert_eq!(h.decoder.calls(), 0);
    assert_eq!(h.handles.open(), 0);
    assert_eq!(h.controller.state(), &UiState::Idle);
}

#[tokio::test]
async fn test_scan_loop_reports_file_without_code() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "blank.png");
    let mut h = Harness::new(ScriptedDecoder::default());
    h.controller
        .process_file(SelectedFile::from_path(&path))
        .unwrap();

    let outcome =
        run_until_settled(&mut h.controller, Duration::from_millis(1), &CancelFlag::new()).await;

    assert_eq!(outcome, ScanOutcome::Failed(ScanError::DecodeNotFound));
}

#[tokio::test(start_paused = true)]
async fn test_scan_loop_decodes_at_most_once_per_period() {
    let mut h = Harness::new(ScriptedDecoder::default());
    h.controller.start_camera().unwrap();

    let period = Duration::from_millis(50);
    let elapsed = Duration::from_millis(500);
    let started = tokio::time::Instant::now();

    let settled = tokio::time::timeout(
        elapsed,
        run_until_settled(&mut h.controller, period, &CancelFlag::new()),
    )
    .await;

    assert!(settled.is_err(), "camera scan settled without a code");
    assert!(started.elapsed() >= elapsed);

    let max_calls = (elapsed.as_millis() / period.as_millis()) as usize + 1;
    let calls = h.decoder.calls();
    assert!(calls <= max_calls, "{} decodes in {:?}", calls, elapsed);
    assert!(calls >= max_calls - 1, "only {} decodes in {:?}", calls, elapsed);
    assert_eq!(h.controller.state(), &UiState::Scanning(ScanMode::Camera));
}

#[tokio::test(start_paused = true)]
async fn test_scan_loop_waits_for_frames_without_decoding() {
    let handles = HandleCounter::default();
    let decoder = ScriptedDecoder::new(vec![Some("never sampled")]);
    let mut controller = ScanController::new(
        Box::new(FakeCamera::silent(handles.clone())),
        Box::new(decoder.clone()),
        Box::new(RecordingClipboard::default()),
    );
    controller.start_camera().unwrap();

    let settled = tokio::time::timeout(
        Duration::from_secs(1),
        run_until_settled(&mut controller, Duration::from_millis(100), &CancelFlag::new()),
    )
    .await;

    assert!(settled.is_err());
    assert_eq!(decoder.calls(), 0);
    assert_eq!(controller.state(), &UiState::Scanning(ScanMode::Camera));
    assert_eq!(handles.open(), 1);
}
