//! Interactive recording session.
//!
//! Wires the terminal view, the capture pipeline and the upload
//! coordinator into one session runtime, pumping the event queue between
//! frames. Supports external stop triggers via SIGUSR1.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use crate::capture::{CaptureController, FfmpegBackend};
use crate::config::CamcordConfig;
use crate::history::HistoryManager;
use crate::library::LibraryClient;
use crate::session::{SessionEvent, SessionRuntime};
use crate::ui::{ErrorScreen, RecorderCommand, RecorderTui};
use crate::upload::{CredentialProvider, StoredTokenProvider, UploadCoordinator};

/// Handles the interactive record → review → upload workflow.
///
/// The session stays on a single event queue; this loop only pumps it,
/// forwards keystrokes as intents, and renders the current phase.
pub async fn handle_record() -> Result<(), anyhow::Error> {
    tracing::info!("=== camcord recorder started ===");

    let config_data = match CamcordConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err}");
            let error_message = format!(
                "Configuration Error:\n\n{err}\n\nPlease check your ~/.config/camcord/camcord.toml file and try again."
            );
            let mut error_screen = ErrorScreen::new()?;
            error_screen.show_error(&error_message)?;
            error_screen.cleanup()?;
            return Err(anyhow::anyhow!("Configuration error: {err}"));
        }
    };

    tracing::info!(
        "Configuration loaded: video={}, audio={}, {}x{}@{}fps, countdown={}s",
        config_data.capture.video_device,
        config_data.capture.audio_device,
        config_data.capture.width,
        config_data.capture.height,
        config_data.capture.framerate,
        config_data.recording.countdown_secs
    );

    let credentials: Arc<dyn CredentialProvider> = Arc::new(StoredTokenProvider);
    let capture = CaptureController::new(Box::new(FfmpegBackend::new(
        config_data.capture.clone(),
    )));
    let uploader = Arc::new(UploadCoordinator::new(
        config_data.server.base_url.clone(),
        Arc::clone(&credentials),
    ));
    let mut runtime = SessionRuntime::new(&config_data.recording, capture, uploader);

    // The library view is an independent collaborator: it subscribes to
    // the refresh signal and re-fetches its own count after each upload.
    let library_count: Arc<Mutex<Option<usize>>> = Arc::new(Mutex::new(None));
    spawn_library_watcher(
        LibraryClient::new(config_data.server.base_url.clone(), credentials),
        runtime.subscribe_refresh(),
        Arc::clone(&library_count),
    );

    // Acquire the device stream for the READY phase before the first frame.
    runtime.start().await;

    let mut tui =
        RecorderTui::new().map_err(|e| anyhow::anyhow!("Failed to initialize UI: {e}"))?;

    let external_stop = Arc::new(std::sync::atomic::AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, external_stop.clone())
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

    let data_dir = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
        .join(".local")
        .join("share")
        .join("camcord");
    std::fs::create_dir_all(&data_dir)?;
    let mut history = HistoryManager::new(&data_dir)?;

    let events = runtime.events();
    let mut status_line: Option<String> = None;

    tracing::debug!("Entering recorder loop");
    loop {
        runtime.pump().await;

        if external_stop.swap(false, Ordering::Relaxed) {
            tracing::info!("Received SIGUSR1: stopping recording via external trigger");
            let _ = events.send(SessionEvent::Stop);
        }

        for take in runtime.take_uploaded() {
            tracing::info!("Uploaded \"{}\" as remote id {}", take.title, take.receipt.id);
            if let Err(e) =
                history.record_upload(&take.title, take.bytes, take.duration_secs, take.receipt.id)
            {
                tracing::warn!("Failed to record upload in history: {e}");
            }
        }

        if let Some(message) = runtime.take_status() {
            status_line = Some(message);
        }
        // Stale errors disappear once a new take is underway.
        if runtime.phase().is_recording() {
            status_line = None;
        }

        match tui.handle_input(runtime.phase()) {
            Ok(RecorderCommand::Continue) => {}
            Ok(RecorderCommand::Intent(intent)) => {
                let _ = events.send(intent);
            }
            Ok(RecorderCommand::Quit) => break,
            Err(e) => {
                tracing::error!("Input handling error: {e}");
                tui.cleanup().ok();
                return Err(anyhow::anyhow!("Input handling error: {e}"));
            }
        }

        runtime.pump().await;

        let count = *library_count.lock().unwrap();
        tui.render(
            runtime.phase(),
            runtime.device_live(),
            status_line.as_deref(),
            count,
        )
        .map_err(|e| anyhow::anyhow!("Render failed: {e}"))?;
    }

    runtime.shutdown().await;
    tui.cleanup()
        .map_err(|e| anyhow::anyhow!("Cleanup failed: {e}"))?;

    tracing::info!("=== camcord recorder exited ===");
    Ok(())
}

/// Keeps a recording count current: one fetch at startup, then one per
/// refresh signal. Fetch failures (not signed in, service down) leave the
/// count blank; the recorder works without a library.
fn spawn_library_watcher(
    library: LibraryClient,
    mut refresh: tokio::sync::broadcast::Receiver<()>,
    count: Arc<Mutex<Option<usize>>>,
) {
    tokio::spawn(async move {
        loop {
            match library.list().await {
                Ok(entries) => {
                    *count.lock().unwrap() = Some(entries.len());
                }
                Err(e) => {
                    tracing::debug!("Library fetch skipped: {e}");
                }
            }
            match refresh.recv().await {
                Ok(()) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
