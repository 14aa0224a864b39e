//! Session lifecycle tests: synthetic capture through real encoders

use std::path::Path;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;

use screenreel::application::ports::{CaptureError, ScreenCapturer, SilentNotifier};
use screenreel::application::{
    ControllerConfig, FallbackOrchestrator, FallbackStatus, SessionController, SessionError,
    SessionEvent,
};
use screenreel::domain::capture::{CaptureMode, Frame, MonitorInfo, Region};
use screenreel::domain::encoding::{ContainerFamily, DiagnosticReport, EncodingSettings};
use screenreel::domain::recording::Duration;
use screenreel::domain::session::SessionStatus;
use screenreel::infrastructure::container::SequenceManifest;
use screenreel::infrastructure::{JpegCompressor, Strategy, TestPatternCapturer};

/// A screen that exists but never yields a frame
struct BlankScreen;

#[async_trait]
impl ScreenCapturer for BlankScreen {
    async fn monitors(&self) -> Result<Vec<MonitorInfo>, CaptureError> {
        Ok(vec![MonitorInfo {
            index: 0,
            name: "blank".to_string(),
            bounds: Region::new(0, 0, 64, 48),
            primary: true,
        }])
    }

    async fn active_window_bounds(&self) -> Result<Region, CaptureError> {
        Err(CaptureError::MonitorUnavailable)
    }

    async fn capture_region(&self, _region: Region, _buffer: &mut Vec<u8>) -> Result<(), CaptureError> {
        Err(CaptureError::CaptureFailed("display asleep".to_string()))
    }
}

fn settings(dir: &Path, container: ContainerFamily) -> EncodingSettings {
    EncodingSettings::new(dir)
        .with_container(container)
        .with_frame_rate(20)
        .with_file_name("session")
}

fn controller<C: ScreenCapturer + 'static>(
    capturer: C,
) -> SessionController<C, Strategy, SilentNotifier> {
    SessionController::new(
        Arc::new(capturer),
        Arc::new(JpegCompressor),
        SilentNotifier,
        ControllerConfig::default(),
    )
}

#[tokio::test]
async fn records_test_pattern_to_mp4() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path(), ContainerFamily::Mp4);
    let mut controller = controller(TestPatternCapturer::with_size(64, 48));

    let path = controller
        .start(&settings, Strategy::cascade_for(&settings))
        .await
        .unwrap();
    assert_eq!(path, dir.path().join("session.mp4"));
    assert_eq!(controller.status().await, SessionStatus::Recording);

    tokio::time::sleep(StdDuration::from_millis(300)).await;
    let summary = controller.stop().await.unwrap();

    assert_eq!(summary.outcome.status, FallbackStatus::Primary);
    assert!(summary.outcome.frame_count > 0);
    assert_eq!(summary.session.status(), SessionStatus::Completed);
    assert_eq!(summary.session.output_path(), Some(path.as_path()));
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
    assert!(!DiagnosticReport::path_for(&path).exists());
}

#[tokio::test]
async fn no_frames_leaves_only_a_report() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path(), ContainerFamily::Avi);
    let mut controller = controller(BlankScreen);
    let mut events = controller.take_events().unwrap();

    let requested = controller
        .start(&settings, Strategy::cascade_for(&settings))
        .await
        .unwrap();
    tokio::time::sleep(StdDuration::from_millis(150)).await;
    let summary = controller.stop().await.unwrap();

    assert_eq!(summary.outcome.status, FallbackStatus::NoFrames);
    assert!(summary.outcome.output.is_none());
    assert!(!requested.exists());

    let report = DiagnosticReport::path_for(&requested);
    assert_eq!(summary.outcome.report.as_deref(), Some(report.as_path()));
    let text = std::fs::read_to_string(&report).unwrap();
    assert!(text.contains("No frames captured"));

    let mut saw_capture_error = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, SessionEvent::CaptureError { .. }) {
            saw_capture_error = true;
        }
    }
    assert!(saw_capture_error);
}

#[tokio::test]
async fn long_gif_falls_back_to_mp4() {
    let dir = tempfile::tempdir().unwrap();
    // 20 fps for a minute is far past the GIF frame cap
    let settings = settings(dir.path(), ContainerFamily::Gif).with_time_limit(Duration::from_secs(60));
    let mut controller = controller(TestPatternCapturer::with_size(64, 48));
    let mut events = controller.take_events().unwrap();

    let produced = controller
        .start(&settings, Strategy::cascade_for(&settings))
        .await
        .unwrap();
    assert_eq!(produced, dir.path().join("session.mp4"));

    tokio::time::sleep(StdDuration::from_millis(200)).await;
    let summary = controller.stop().await.unwrap();
    assert_eq!(summary.outcome.status, FallbackStatus::FallbackUsed);
    assert_eq!(summary.outcome.output.as_deref(), Some(produced.as_path()));

    let report = DiagnosticReport::path_for(&dir.path().join("session.gif"));
    let text = std::fs::read_to_string(&report).unwrap();
    assert!(text.contains("Fallback used"));
    assert!(!dir.path().join("session.gif").exists());

    let mut fallback = None;
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::FallbackUsed { report, .. } = event {
            fallback = Some(report);
        }
    }
    assert_eq!(fallback, Some(report));
}

#[tokio::test]
async fn image_sequence_is_gapless() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path(), ContainerFamily::ImageSequence);
    let mut controller = controller(TestPatternCapturer::with_size(32, 24));

    controller
        .start(&settings, Strategy::cascade_for(&settings))
        .await
        .unwrap();
    tokio::time::sleep(StdDuration::from_millis(400)).await;
    let summary = controller.stop().await.unwrap();

    let manifest_path = summary.outcome.output.unwrap();
    assert_eq!(manifest_path, dir.path().join("session_frames").join("manifest.json"));
    let manifest: SequenceManifest =
        serde_json::from_str(&std::fs::read_to_string(&manifest_path).unwrap()).unwrap();

    assert_eq!(manifest.frame_count, manifest.frames.len());
    assert_eq!(manifest.frame_count as u64, summary.outcome.frame_count);
    for (i, entry) in manifest.frames.iter().enumerate() {
        assert_eq!(entry.index, i + 1);
        assert!(dir.path().join("session_frames").join(&entry.file).exists());
    }
}

#[tokio::test]
async fn empty_region_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = settings(dir.path(), ContainerFamily::Mp4).with_capture_mode(CaptureMode::CustomRegion);
    settings.custom_region = Some(Region::new(0, 0, 0, 0));
    let mut controller = controller(TestPatternCapturer::new());

    let result = controller
        .start(&settings, Strategy::cascade_for(&settings))
        .await;
    assert!(matches!(result, Err(SessionError::Capture(_))));
    assert_eq!(controller.status().await, SessionStatus::Error);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn cancel_discards_the_recording() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path(), ContainerFamily::Mp4);
    let mut controller = controller(TestPatternCapturer::with_size(32, 24));

    controller
        .start(&settings, Strategy::cascade_for(&settings))
        .await
        .unwrap();
    tokio::time::sleep(StdDuration::from_millis(100)).await;
    controller.cancel().await.unwrap();

    assert_eq!(controller.status().await, SessionStatus::Cancelled);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    assert!(matches!(controller.stop().await, Err(SessionError::InvalidState(_))));
}

#[tokio::test]
async fn pause_keeps_the_session_recording() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path(), ContainerFamily::Avi);
    let mut controller = controller(TestPatternCapturer::with_size(32, 24));

    controller
        .start(&settings, Strategy::cascade_for(&settings))
        .await
        .unwrap();
    controller.pause().await.unwrap();
    assert_eq!(controller.status().await, SessionStatus::Paused);
    assert!(controller.pause().await.is_err());
    controller.resume().await.unwrap();

    tokio::time::sleep(StdDuration::from_millis(100)).await;
    let summary = controller.stop().await.unwrap();
    assert_eq!(summary.outcome.status, FallbackStatus::Primary);
    assert!(dir.path().join("session.avi").exists());
}

fn screen_frame(sequence: u64, width: u32, height: u32) -> Frame {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[(x / 8) as u8, (y / 8) as u8, sequence as u8 * 16, 255]);
        }
    }
    Frame::new(sequence, width, height, pixels, chrono::Utc::now(), StdDuration::ZERO).unwrap()
}

#[tokio::test]
async fn fallback_journal_holds_compressed_payloads_only() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path(), ContainerFamily::Mp4);
    let (width, height) = (960, 540);
    let frames = 8u64;

    let mut orchestrator =
        FallbackOrchestrator::new(Strategy::cascade_for(&settings), Arc::new(JpegCompressor));
    orchestrator
        .begin(&dir.path().join("session.mp4"), &settings)
        .await
        .unwrap();
    for seq in 1..=frames {
        orchestrator.submit(screen_frame(seq, width, height)).await.unwrap();
    }

    let raw = frames * u64::from(width * height * 4);
    assert_eq!(orchestrator.frame_count(), frames);
    // Journal and strategy buffer hold the same payloads
    assert_eq!(orchestrator.journal_bytes(), orchestrator.buffered_bytes());
    assert!(orchestrator.journal_bytes() * 10 < raw);

    let outcome = orchestrator.end().await;
    assert_eq!(outcome.status, FallbackStatus::Primary);
}

#[tokio::test]
async fn untaken_events_are_dropped_at_start() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path(), ContainerFamily::Avi);
    let mut controller = controller(TestPatternCapturer::with_size(32, 24));

    controller
        .start(&settings, Strategy::cascade_for(&settings))
        .await
        .unwrap();
    assert!(controller.take_events().is_none());

    tokio::time::sleep(StdDuration::from_millis(100)).await;
    let summary = controller.stop().await.unwrap();
    assert_eq!(summary.outcome.status, FallbackStatus::Primary);
}
