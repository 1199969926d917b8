//! Async driver for the recording state machine.
//!
//! Owns the single event queue that serializes user intents, timer ticks,
//! capture segments and upload completions, and executes the effects each
//! transition requests: device acquisition/release, timer scheduling,
//! capture start/stop, upload submission and the library refresh signal.
//! Long-running work never blocks the queue; it is dispatched to a task
//! whose completion comes back in as another event.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::broadcast;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::capture::{CaptureController, CaptureError};
use crate::config::RecordingConfig;
use crate::upload::{UploadReceipt, Uploader};

use super::machine::{Effect, Phase, RecordingStateMachine, SessionEvent};
use super::timer::{CountdownTimer, ElapsedTimer};

/// A successful upload, reported so the caller can record it locally.
#[derive(Debug, Clone)]
pub struct UploadedTake {
    pub receipt: UploadReceipt,
    pub title: String,
    pub bytes: u64,
    pub duration_secs: u64,
}

struct PendingUpload {
    title: String,
    bytes: u64,
    duration_secs: u64,
}

pub struct SessionRuntime {
    machine: RecordingStateMachine,
    capture: CaptureController,
    uploader: Arc<dyn Uploader>,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: UnboundedReceiver<SessionEvent>,
    refresh_tx: broadcast::Sender<()>,
    countdown: Option<CountdownTimer>,
    elapsed: Option<ElapsedTimer>,
    /// Last surfaced non-fatal error, consumed by the view.
    status: Option<String>,
    /// Duration of the most recently stopped recording.
    last_recording_secs: u64,
    pending_upload: Option<PendingUpload>,
    uploaded: Vec<UploadedTake>,
}

impl SessionRuntime {
    pub fn new(
        recording: &RecordingConfig,
        capture: CaptureController,
        uploader: Arc<dyn Uploader>,
    ) -> Self {
        let (events_tx, events_rx) = unbounded_channel();
        let (refresh_tx, _) = broadcast::channel(16);
        Self {
            machine: RecordingStateMachine::new(
                recording.countdown_secs,
                recording.mime_type.clone(),
            ),
            capture,
            uploader,
            events_tx,
            events_rx,
            refresh_tx,
            countdown: None,
            elapsed: None,
            status: None,
            last_recording_secs: 0,
            pending_upload: None,
            uploaded: Vec::new(),
        }
    }

    /// Sender for dispatching intents into the queue (view layer, signal
    /// handlers).
    pub fn events(&self) -> UnboundedSender<SessionEvent> {
        self.events_tx.clone()
    }

    pub fn phase(&self) -> &Phase {
        self.machine.phase()
    }

    pub fn device_live(&self) -> bool {
        self.machine.device_live()
    }

    /// One receiver per library view; a send with no subscribers is fine.
    pub fn subscribe_refresh(&self) -> broadcast::Receiver<()> {
        self.refresh_tx.subscribe()
    }

    /// Takes the last surfaced error message, if any.
    pub fn take_status(&mut self) -> Option<String> {
        self.status.take()
    }

    /// Drains successful uploads accumulated since the last call.
    pub fn take_uploaded(&mut self) -> Vec<UploadedTake> {
        std::mem::take(&mut self.uploaded)
    }

    /// Performs the initial device acquisition for the READY phase.
    pub async fn start(&mut self) {
        self.run_effect(Effect::AcquireDevice).await;
        self.pump().await;
    }

    /// Processes every queued event, in arrival order, to completion.
    pub async fn pump(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event).await;
        }
    }

    /// Cancels timers, stops any active capture and frees the device.
    pub async fn shutdown(&mut self) {
        self.countdown = None;
        self.elapsed = None;
        if self.machine.phase().is_recording() {
            if let Err(e) = self.capture.end_capture().await {
                tracing::warn!("Capture stop during shutdown failed: {e}");
            }
        }
        if self.capture.is_live() {
            self.capture.release().await;
        }
    }

    async fn apply_event(&mut self, event: SessionEvent) {
        // Stopping is the one place ordering matters beyond the queue: the
        // capture tail must be appended before the stop transition
        // finalizes the buffer, so the artifact holds every captured byte.
        if matches!(event, SessionEvent::Stop) && self.machine.phase().is_recording() {
            if let Phase::Recording { elapsed } = self.machine.phase() {
                self.last_recording_secs = *elapsed;
            }
            match self.capture.end_capture().await {
                Ok(tail) => {
                    for segment in tail {
                        let _ = self.machine.handle(SessionEvent::Segment(segment));
                    }
                }
                Err(e) => tracing::warn!("Capture stop failed: {e}"),
            }
        }

        let receipt = match &event {
            SessionEvent::UploadSucceeded(receipt) => Some(receipt.clone()),
            _ => None,
        };
        if matches!(event, SessionEvent::UploadFailed(_)) {
            self.pending_upload = None;
        }

        let effects = self.machine.handle(event);

        // Record the take only when the machine accepted the completion;
        // a duplicate success event must not double-log history.
        if let Some(receipt) = receipt {
            if effects.iter().any(|e| matches!(e, Effect::NotifyLibrary)) {
                if let Some(pending) = self.pending_upload.take() {
                    self.uploaded.push(UploadedTake {
                        receipt,
                        title: pending.title,
                        bytes: pending.bytes,
                        duration_secs: pending.duration_secs,
                    });
                }
            }
        }

        for effect in effects {
            self.run_effect(effect).await;
        }
    }

    async fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AcquireDevice => {
                let completion = match self.capture.ensure_live().await {
                    Ok(()) => SessionEvent::DeviceAcquired,
                    Err(CaptureError::AccessDenied(reason)) => SessionEvent::DeviceDenied(reason),
                    Err(e) => SessionEvent::DeviceDenied(e.to_string()),
                };
                let _ = self.events_tx.send(completion);
            }
            Effect::ReleaseDevice => {
                self.capture.release().await;
            }
            Effect::StartCountdown { from } => {
                if self.countdown.is_some() {
                    tracing::debug!("Replacing an active countdown schedule");
                }
                self.countdown = Some(CountdownTimer::spawn(from, self.events_tx.clone()));
            }
            Effect::BeginCapture => {
                self.countdown = None;
                let (segments_tx, mut segments_rx) = unbounded_channel::<Bytes>();
                let events = self.events_tx.clone();
                // Forward capture chunks into the one session queue so they
                // serialize with everything else.
                tokio::spawn(async move {
                    while let Some(segment) = segments_rx.recv().await {
                        if events.send(SessionEvent::Segment(segment)).is_err() {
                            break;
                        }
                    }
                });
                if let Err(e) = self.capture.begin_capture(segments_tx).await {
                    tracing::error!("Failed to begin capture: {e}");
                    self.status = Some(e.to_string());
                    // Fall back to review with whatever arrived (possibly
                    // nothing) rather than recording a dead stream.
                    let _ = self.events_tx.send(SessionEvent::Stop);
                }
            }
            Effect::StartElapsed => {
                if self.elapsed.is_some() {
                    tracing::debug!("Replacing an active elapsed schedule");
                }
                self.elapsed = Some(ElapsedTimer::spawn(self.events_tx.clone()));
            }
            Effect::CancelElapsed => {
                self.elapsed = None;
            }
            Effect::SubmitUpload { artifact, title } => {
                self.pending_upload = Some(PendingUpload {
                    title: title.clone(),
                    bytes: artifact.len() as u64,
                    duration_secs: self.last_recording_secs,
                });
                let uploader = Arc::clone(&self.uploader);
                let events = self.events_tx.clone();
                tokio::spawn(async move {
                    let completion = match uploader.submit(&artifact, &title).await {
                        Ok(receipt) => SessionEvent::UploadSucceeded(receipt),
                        Err(e) => SessionEvent::UploadFailed(e.into()),
                    };
                    let _ = events.send(completion);
                });
            }
            Effect::NotifyLibrary => {
                let _ = self.refresh_tx.send(());
            }
            Effect::SurfaceError(error) => {
                tracing::warn!("{error}");
                self.status = Some(error.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::controller::testing::ScriptedBackend;
    use crate::upload::UploadError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct ScriptedUploader {
        fail_with: Option<UploadError>,
        submissions: AtomicUsize,
    }

    impl ScriptedUploader {
        fn succeeding() -> Self {
            Self {
                fail_with: None,
                submissions: AtomicUsize::new(0),
            }
        }

        fn failing(error: UploadError) -> Self {
            Self {
                fail_with: Some(error),
                submissions: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Uploader for ScriptedUploader {
        async fn submit(
            &self,
            artifact: &crate::capture::MediaArtifact,
            title: &str,
        ) -> Result<UploadReceipt, UploadError> {
            self.submissions.fetch_add(1, Ordering::SeqCst);
            match &self.fail_with {
                Some(error) => Err(error.clone()),
                None => Ok(UploadReceipt {
                    id: 42,
                    filename: title.to_string(),
                    url: format!("https://store.example/{}", artifact.len()),
                }),
            }
        }
    }

    fn runtime_with(
        backend: ScriptedBackend,
        uploader: Arc<dyn Uploader>,
    ) -> SessionRuntime {
        SessionRuntime::new(
            &RecordingConfig::default(),
            CaptureController::new(Box::new(backend)),
            uploader,
        )
    }

    /// Advances virtual time in small steps, pumping the queue after each,
    /// so timer ticks and spawned completions get processed.
    async fn drive(runtime: &mut SessionRuntime, iterations: u32) {
        for _ in 0..iterations {
            tokio::time::sleep(Duration::from_millis(250)).await;
            runtime.pump().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_session_reaches_ready_with_one_refresh() {
        let backend = ScriptedBackend::granting(
            vec![Bytes::from_static(b"seg1"), Bytes::from_static(b"seg2")],
            vec![Bytes::from_static(b"tail")],
        );
        let uploader = Arc::new(ScriptedUploader::succeeding());
        let mut runtime = runtime_with(backend, uploader.clone());
        let mut refresh = runtime.subscribe_refresh();

        runtime.start().await;
        assert!(runtime.device_live());

        let events = runtime.events();
        events.send(SessionEvent::Start).unwrap();
        runtime.pump().await;
        assert_eq!(runtime.phase().name(), "COUNTDOWN");

        // Three virtual seconds bring the countdown into recording.
        drive(&mut runtime, 16).await;
        assert_eq!(runtime.phase().name(), "RECORDING");

        events.send(SessionEvent::Stop).unwrap();
        runtime.pump().await;
        match runtime.phase() {
            Phase::Review { artifact, .. } => {
                assert_eq!(artifact.data().as_ref(), b"seg1seg2tail");
            }
            other => panic!("expected REVIEW, got {}", other.name()),
        }

        events
            .send(SessionEvent::SetTitle("demo".to_string()))
            .unwrap();
        events.send(SessionEvent::Upload).unwrap();
        drive(&mut runtime, 4).await;

        assert_eq!(runtime.phase().name(), "READY");
        assert_eq!(uploader.submissions.load(Ordering::SeqCst), 1);
        assert!(refresh.try_recv().is_ok());
        assert!(refresh.try_recv().is_err());

        let uploaded = runtime.take_uploaded();
        assert_eq!(uploaded.len(), 1);
        assert_eq!(uploaded[0].title, "demo");
        assert_eq!(uploaded[0].bytes, 12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_failure_returns_to_review_with_take_intact() {
        let backend =
            ScriptedBackend::granting(vec![Bytes::from_static(b"precious")], vec![]);
        let uploader = Arc::new(ScriptedUploader::failing(UploadError::Transport(
            "network".to_string(),
        )));
        let mut runtime = runtime_with(backend, uploader);
        let mut refresh = runtime.subscribe_refresh();

        runtime.start().await;
        let events = runtime.events();
        events.send(SessionEvent::Start).unwrap();
        drive(&mut runtime, 16).await;
        events.send(SessionEvent::Stop).unwrap();
        events
            .send(SessionEvent::SetTitle("demo".to_string()))
            .unwrap();
        events.send(SessionEvent::Upload).unwrap();
        drive(&mut runtime, 4).await;

        match runtime.phase() {
            Phase::Review { artifact, title } => {
                assert_eq!(artifact.data().as_ref(), b"precious");
                assert_eq!(title, "demo");
            }
            other => panic!("expected REVIEW, got {}", other.name()),
        }
        assert!(runtime.take_status().is_some());
        assert!(refresh.try_recv().is_err());
        assert!(runtime.take_uploaded().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_device_keeps_session_ready() {
        let backend = ScriptedBackend::denying(usize::MAX);
        let uploader = Arc::new(ScriptedUploader::succeeding());
        let mut runtime = runtime_with(backend, uploader);

        runtime.start().await;
        assert!(!runtime.device_live());
        assert!(runtime
            .take_status()
            .is_some_and(|s| s.contains("denied")));

        // Start without a device stays READY and retries acquisition.
        let events = runtime.events();
        events.send(SessionEvent::Start).unwrap();
        drive(&mut runtime, 2).await;
        assert_eq!(runtime.phase().name(), "READY");
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_advances_while_recording() {
        let backend = ScriptedBackend::granting(vec![], vec![]);
        let uploader = Arc::new(ScriptedUploader::succeeding());
        let mut runtime = runtime_with(backend, uploader);

        runtime.start().await;
        let events = runtime.events();
        events.send(SessionEvent::Start).unwrap();
        drive(&mut runtime, 16).await;
        assert_eq!(runtime.phase().name(), "RECORDING");

        // Another ~3 virtual seconds of recording.
        drive(&mut runtime, 12).await;
        match runtime.phase() {
            Phase::Recording { elapsed } => assert!(*elapsed >= 2),
            other => panic!("expected RECORDING, got {}", other.name()),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_discard_rearms_the_device_for_the_next_take() {
        let backend = ScriptedBackend::granting(vec![Bytes::from_static(b"x")], vec![]);
        let log = Arc::clone(&backend.log);
        let uploader = Arc::new(ScriptedUploader::succeeding());
        let mut runtime = runtime_with(backend, uploader);

        runtime.start().await;
        let events = runtime.events();
        events.send(SessionEvent::Start).unwrap();
        drive(&mut runtime, 16).await;
        events.send(SessionEvent::Stop).unwrap();
        runtime.pump().await;
        events.send(SessionEvent::Discard).unwrap();
        drive(&mut runtime, 2).await;

        assert_eq!(runtime.phase().name(), "READY");
        assert!(runtime.device_live());
        // One stream for the first take, one re-acquired after discard.
        assert_eq!(log.acquired.load(Ordering::SeqCst), 2);
    }
}
