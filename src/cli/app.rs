//! Main app runners for recording and monitor listing

use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::application::ports::{ConfigStore, ScreenCapturer};
use crate::application::{
    ControllerConfig, EventReceiver, FallbackStatus, RecordingSummary, SessionController,
    SessionEvent,
};
use crate::domain::config::AppConfig;
use crate::domain::encoding::EncodingSettings;
use crate::infrastructure::{
    create_notifier, FfmpegScreenCapturer, JpegCompressor, Strategy, TestPatternCapturer, XdgConfigStore,
};

use super::args::RecordOptions;
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Environment variable overriding the output directory
pub const OUTPUT_DIR_ENV: &str = "SCREENREEL_OUTPUT_DIR";

/// Record until the time limit elapses or Ctrl+C arrives
pub async fn run_record(options: RecordOptions) -> ExitCode {
    let presenter = Presenter::new();

    let shutdown = ShutdownSignal::new();
    if let Err(e) = shutdown.setup() {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    if options.test_pattern {
        record(Arc::new(TestPatternCapturer::new()), options, shutdown, presenter).await
    } else {
        record(Arc::new(FfmpegScreenCapturer::new()), options, shutdown, presenter).await
    }
}

async fn record<C: ScreenCapturer + 'static>(
    capturer: Arc<C>,
    options: RecordOptions,
    shutdown: ShutdownSignal,
    mut presenter: Presenter,
) -> ExitCode {
    let settings = options.settings;
    let mut controller = SessionController::new(
        capturer,
        Arc::new(JpegCompressor),
        create_notifier(options.notify),
        ControllerConfig {
            enable_notify: options.notify,
            pipeline_capacity: None,
        },
    );
    let mut events = controller.take_events();

    let path = match controller
        .start(&settings, Strategy::cascade_for(&settings))
        .await
    {
        Ok(path) => path,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };
    debug!(path = %path.display(), "recording started");

    let limit = settings.time_limit.map(|limit| limit.as_std());
    presenter.start_spinner(&format!("Recording to {}", path.display()));
    if limit.is_none() {
        presenter.info("Press Ctrl+C to stop");
    }

    let deadline = async {
        match limit {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    let mut view = EventView::new(limit);
    loop {
        tokio::select! {
            _ = &mut deadline => {
                debug!("time limit reached");
                break;
            }
            _ = shutdown.wait() => {
                debug!("stop requested");
                break;
            }
            Some(event) = next_event(&mut events) => view.show(&presenter, event),
        }
    }

    presenter.update_spinner("Finalizing...");
    let result = controller.stop().await;
    if let Some(ref mut receiver) = events {
        while let Ok(event) = receiver.try_recv() {
            view.show(&presenter, event);
        }
    }

    match result {
        Ok(summary) => finish(&mut presenter, &settings, summary),
        Err(e) => {
            presenter.spinner_fail("Recording failed");
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

async fn next_event(events: &mut Option<EventReceiver>) -> Option<SessionEvent> {
    match events {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

/// Turns session events into terminal output without repeating itself
struct EventView {
    limit: Option<Duration>,
    last_capture_error: Option<String>,
}

impl EventView {
    fn new(limit: Option<Duration>) -> Self {
        Self {
            limit,
            last_capture_error: None,
        }
    }

    fn show(&mut self, presenter: &Presenter, event: SessionEvent) {
        match event {
            SessionEvent::RecordingProgress {
                elapsed,
                byte_size,
                frame_count,
            } => presenter.update_recording_progress(elapsed, self.limit, frame_count, byte_size),
            SessionEvent::CaptureError { message } => {
                // The capture loop retries continuously; report each distinct failure once
                if self.last_capture_error.as_deref() != Some(message.as_str()) {
                    presenter.warn(&format!("Capture failed: {}", message));
                    self.last_capture_error = Some(message);
                }
            }
            SessionEvent::FrameError { sequence, message } => {
                warn!(sequence, %message, "frame skipped");
            }
            SessionEvent::RecordingError { message } => presenter.error(&message),
            other => debug!(event = ?other, "session event"),
        }
    }
}

fn finish(presenter: &mut Presenter, settings: &EncodingSettings, summary: RecordingSummary) -> ExitCode {
    let outcome = summary.outcome;
    let report = outcome
        .report
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    match (outcome.status, outcome.output.as_ref()) {
        (FallbackStatus::Primary, Some(output)) => {
            presenter.spinner_success(&format!("Recorded {} frames", outcome.frame_count));
            presenter.output(&output.display().to_string());
            ExitCode::from(EXIT_SUCCESS)
        }
        (FallbackStatus::FallbackUsed, Some(output)) => {
            presenter.spinner_success(&format!("Recorded {} frames", outcome.frame_count));
            presenter.warn(&format!(
                "{} output failed, fell back to {}. See {}",
                settings.container,
                output.display(),
                report
            ));
            presenter.output(&output.display().to_string());
            ExitCode::from(EXIT_SUCCESS)
        }
        (FallbackStatus::NoFrames, _) => {
            presenter.spinner_fail("No frames were captured");
            presenter.warn(&format!("Diagnostic report written to {}", report));
            ExitCode::from(EXIT_ERROR)
        }
        _ => {
            presenter.spinner_fail("Every encoder failed");
            presenter.error(&format!("See {}", report));
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Print the monitors the capture source can see
pub async fn run_monitors(test_pattern: bool) -> ExitCode {
    let presenter = Presenter::new();
    let monitors = if test_pattern {
        TestPatternCapturer::new().monitors().await
    } else {
        FfmpegScreenCapturer::new().monitors().await
    };

    match monitors {
        Ok(monitors) => {
            for monitor in &monitors {
                presenter.monitor(monitor);
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "ignoring unreadable config file");
            AppConfig::empty()
        }
    };

    // Build env config
    let env_config = AppConfig {
        output_dir: env::var(OUTPUT_DIR_ENV).ok().filter(|s| !s.is_empty()),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}
