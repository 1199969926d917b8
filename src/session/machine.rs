//! The recording session state machine.
//!
//! A synchronous reducer over the session phase: events go in, a new phase
//! and a list of side effects come out. All I/O (device acquisition, timer
//! scheduling, capture, upload) happens in the session runtime, which
//! executes the returned effects and feeds completions back in as further
//! events. This keeps the transition logic pure and testable without
//! timers, hardware or a network.
//!
//! The phase cycle is READY → COUNTDOWN → RECORDING → REVIEW → UPLOADING,
//! with REVIEW reachable again from UPLOADING on failure and READY from
//! REVIEW/UPLOADING via discard/success. Any event that is not valid for
//! the current phase is ignored; duplicate or late events (a stray timer
//! tick after stop, a second upload completion) must never corrupt state.

use bytes::Bytes;
use thiserror::Error;

use crate::capture::{ChunkBuffer, MediaArtifact};
use crate::upload::{UploadError, UploadReceipt};

/// Errors surfaced by the recording session.
///
/// None of these are fatal: every failure path returns the session to a
/// well-defined, previously-reachable phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Camera/microphone access was declined or no usable hardware exists.
    /// The session stays in READY; the user retries with a fresh start.
    #[error("camera or microphone unavailable: {0}")]
    DeviceAccessDenied(String),

    /// The bearer credential could not be fetched. The upload attempt is
    /// aborted and the session returns to REVIEW unchanged.
    #[error("not signed in: {0}")]
    AuthUnavailable(String),

    /// The network submission failed. Artifact and title are retained so
    /// the user can retry from REVIEW; nothing is lost.
    #[error("upload failed: {0}")]
    UploadTransportFailure(String),

    /// An event arrived in a phase that does not accept it. Logged at
    /// debug level and otherwise ignored; never shown to the user.
    #[error("event {event} not valid in phase {phase}")]
    InvalidTransition {
        event: &'static str,
        phase: &'static str,
    },
}

impl From<UploadError> for SessionError {
    fn from(error: UploadError) -> Self {
        match error {
            UploadError::AuthUnavailable(msg) => SessionError::AuthUnavailable(msg),
            UploadError::Transport(msg) => SessionError::UploadTransportFailure(msg),
        }
    }
}

/// One discrete state of the recording session.
///
/// Each variant carries exactly the data that is meaningful in that phase,
/// so a countdown value during review or an artifact during capture is
/// unrepresentable. Transitions replace the whole value at once.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// Idle; the device stream is held live (or being re-acquired) so the
    /// next session can start immediately.
    Ready,
    /// Counting down to capture, one tick per second.
    Countdown { remaining: u32 },
    /// Capturing; `elapsed` advances one second per elapsed-timer tick.
    Recording { elapsed: u64 },
    /// Reviewing the finalized artifact; title is editable here.
    Review {
        artifact: MediaArtifact,
        title: String,
    },
    /// One submission in flight. Artifact and title are carried so a
    /// failure can return to REVIEW with both intact.
    Uploading {
        artifact: MediaArtifact,
        title: String,
    },
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Ready => "READY",
            Phase::Countdown { .. } => "COUNTDOWN",
            Phase::Recording { .. } => "RECORDING",
            Phase::Review { .. } => "REVIEW",
            Phase::Uploading { .. } => "UPLOADING",
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Phase::Recording { .. })
    }
}

/// Everything that can happen to a session: user intents, timer ticks,
/// capture segment callbacks, and async completions. All of them arrive
/// through one queue and are applied one at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// User intent: begin a new recording.
    Start,
    /// One countdown second has passed.
    CountdownTick,
    /// One recording second has passed.
    ElapsedTick,
    /// The capture subsystem produced a media segment.
    Segment(Bytes),
    /// User intent: stop capturing and review.
    Stop,
    /// User intent: throw the take away.
    Discard,
    /// User intent: replace the title text.
    SetTitle(String),
    /// User intent: submit the reviewed take.
    Upload,
    /// Upload completion (success).
    UploadSucceeded(UploadReceipt),
    /// Upload completion (failure); the session returns to review.
    UploadFailed(SessionError),
    /// Device stream acquisition completed.
    DeviceAcquired,
    /// Device stream acquisition was refused.
    DeviceDenied(String),
    /// The live device stream ended outside our control.
    DeviceLost,
}

/// Side effects requested by a transition, executed by the runtime in
/// order. The reducer itself never performs I/O.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Acquire the device stream if none is live.
    AcquireDevice,
    /// Stop all hardware tracks and drop the stream handle.
    ReleaseDevice,
    /// Start the one-second countdown tick schedule.
    StartCountdown { from: u32 },
    /// Begin hardware capture (segment emission).
    BeginCapture,
    /// Start the one-second elapsed tick schedule.
    StartElapsed,
    /// Cancel the elapsed tick schedule.
    CancelElapsed,
    /// Hand the artifact and title to the upload coordinator.
    SubmitUpload {
        artifact: MediaArtifact,
        title: String,
    },
    /// Fire the library refresh signal (once per successful upload).
    NotifyLibrary,
    /// Show a non-fatal error to the user.
    SurfaceError(SessionError),
}

/// The orchestrator: owns the phase, the chunk buffer and its view of
/// device liveness, and maps each event to the next phase plus effects.
pub struct RecordingStateMachine {
    phase: Phase,
    buffer: ChunkBuffer,
    /// Whether a device stream is currently live. Tracked beside the phase
    /// because the stream spans READY through RECORDING.
    device_live: bool,
    countdown_from: u32,
    mime_type: String,
}

impl RecordingStateMachine {
    pub fn new(countdown_from: u32, mime_type: impl Into<String>) -> Self {
        Self {
            phase: Phase::Ready,
            buffer: ChunkBuffer::new(),
            device_live: false,
            countdown_from,
            mime_type: mime_type.into(),
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn device_live(&self) -> bool {
        self.device_live
    }

    /// Applies one event and returns the effects the runtime must execute.
    ///
    /// Invalid events are ignored (empty effect list) rather than raised;
    /// the controller is the authority on what is accepted, not the view.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::Start => self.on_start(),
            SessionEvent::CountdownTick => self.on_countdown_tick(),
            SessionEvent::ElapsedTick => self.on_elapsed_tick(),
            SessionEvent::Segment(bytes) => self.on_segment(bytes),
            SessionEvent::Stop => self.on_stop(),
            SessionEvent::Discard => self.on_discard(),
            SessionEvent::SetTitle(title) => self.on_set_title(title),
            SessionEvent::Upload => self.on_upload(),
            SessionEvent::UploadSucceeded(receipt) => self.on_upload_succeeded(receipt),
            SessionEvent::UploadFailed(error) => self.on_upload_failed(error),
            SessionEvent::DeviceAcquired => {
                self.device_live = true;
                vec![]
            }
            SessionEvent::DeviceDenied(reason) => {
                self.device_live = false;
                vec![Effect::SurfaceError(SessionError::DeviceAccessDenied(
                    reason,
                ))]
            }
            SessionEvent::DeviceLost => self.on_device_lost(),
        }
    }

    fn on_start(&mut self) -> Vec<Effect> {
        if !matches!(self.phase, Phase::Ready) {
            return self.ignore("start");
        }
        if !self.device_live {
            // Acquisition is asynchronous, so the guard cannot consult the
            // platform inline. Stay in READY, re-request the stream, and
            // let the user retry once the grant (or denial) comes back.
            tracing::info!("Start requested with no live device stream; re-acquiring");
            return vec![Effect::AcquireDevice];
        }
        tracing::info!("Session start: countdown from {}", self.countdown_from);
        self.phase = Phase::Countdown {
            remaining: self.countdown_from,
        };
        vec![Effect::StartCountdown {
            from: self.countdown_from,
        }]
    }

    fn on_countdown_tick(&mut self) -> Vec<Effect> {
        let remaining = match self.phase {
            Phase::Countdown { remaining } => remaining,
            _ => return self.ignore("countdown-tick"),
        };
        let next = remaining.saturating_sub(1);
        if next > 0 {
            self.phase = Phase::Countdown { remaining: next };
            return vec![];
        }
        // The countdown timer drives the count to 0 and the consuming
        // transition fires RECORDING in the same event.
        tracing::info!("Countdown complete; capture begins");
        self.buffer.reset();
        self.phase = Phase::Recording { elapsed: 0 };
        vec![Effect::BeginCapture, Effect::StartElapsed]
    }

    fn on_elapsed_tick(&mut self) -> Vec<Effect> {
        match self.phase {
            Phase::Recording { elapsed } => {
                self.phase = Phase::Recording {
                    elapsed: elapsed + 1,
                };
                vec![]
            }
            _ => self.ignore("elapsed-tick"),
        }
    }

    fn on_segment(&mut self, bytes: Bytes) -> Vec<Effect> {
        match self.phase {
            Phase::Recording { .. } => {
                self.buffer.append(bytes);
                vec![]
            }
            _ => self.ignore("segment"),
        }
    }

    fn on_stop(&mut self) -> Vec<Effect> {
        if !self.phase.is_recording() {
            return self.ignore("stop");
        }
        tracing::debug!(
            "Finalizing {} segments ({} bytes)",
            self.buffer.segment_count(),
            self.buffer.byte_len()
        );
        let artifact = self.buffer.finalize(&self.mime_type);
        tracing::info!("Recording stopped: artifact of {} bytes", artifact.len());
        self.phase = Phase::Review {
            artifact,
            title: String::new(),
        };
        vec![Effect::CancelElapsed, Effect::ReleaseDevice]
    }

    fn on_discard(&mut self) -> Vec<Effect> {
        match self.phase {
            Phase::Review { .. } => {
                tracing::info!("Take discarded");
                self.phase = Phase::Ready;
                self.buffer.reset();
                // Stream was released on stop; re-acquire for the next take.
                vec![Effect::AcquireDevice]
            }
            _ => self.ignore("discard"),
        }
    }

    fn on_set_title(&mut self, title: String) -> Vec<Effect> {
        match &mut self.phase {
            Phase::Review { title: current, .. } => {
                *current = title;
                vec![]
            }
            _ => self.ignore("set-title"),
        }
    }

    fn on_upload(&mut self) -> Vec<Effect> {
        let (artifact, title) = match &self.phase {
            Phase::Review { artifact, title } => (artifact, title),
            _ => return self.ignore("upload"),
        };
        if title.trim().is_empty() {
            // The view disables the action, but the controller is the
            // authority: an empty title never leaves REVIEW.
            tracing::debug!("Upload rejected: empty title");
            return vec![];
        }
        let artifact = artifact.clone();
        let title = title.clone();
        tracing::info!("Uploading \"{}\" ({} bytes)", title, artifact.len());
        self.phase = Phase::Uploading {
            artifact: artifact.clone(),
            title: title.clone(),
        };
        vec![Effect::SubmitUpload { artifact, title }]
    }

    fn on_upload_succeeded(&mut self, receipt: UploadReceipt) -> Vec<Effect> {
        match self.phase {
            Phase::Uploading { .. } => {
                tracing::info!("Upload stored as remote id {}", receipt.id);
                self.phase = Phase::Ready;
                vec![Effect::NotifyLibrary, Effect::AcquireDevice]
            }
            _ => self.ignore("upload-succeeded"),
        }
    }

    fn on_upload_failed(&mut self, error: SessionError) -> Vec<Effect> {
        match std::mem::replace(&mut self.phase, Phase::Ready) {
            Phase::Uploading { artifact, title } => {
                tracing::warn!("Upload failed, returning to review: {error}");
                self.phase = Phase::Review { artifact, title };
                vec![Effect::SurfaceError(error)]
            }
            other => {
                self.phase = other;
                self.ignore("upload-failed")
            }
        }
    }

    fn on_device_lost(&mut self) -> Vec<Effect> {
        self.device_live = false;
        match self.phase {
            // Opportunistic re-acquisition: a stream that ended while idle
            // (e.g. permission revoked externally) is replaced right away.
            Phase::Ready => vec![Effect::AcquireDevice],
            _ => vec![],
        }
    }

    fn ignore(&self, event: &'static str) -> Vec<Effect> {
        let error = SessionError::InvalidTransition {
            event,
            phase: self.phase.name(),
        };
        tracing::debug!("{error}");
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receipt() -> UploadReceipt {
        UploadReceipt {
            id: 7,
            filename: "demo".to_string(),
            url: "https://store.example/demo.webm".to_string(),
        }
    }

    /// A machine in READY with a live device stream, countdown of 3.
    fn ready_machine() -> RecordingStateMachine {
        let mut machine = RecordingStateMachine::new(3, "video/webm");
        machine.handle(SessionEvent::DeviceAcquired);
        machine
    }

    /// Drives a machine from READY into REVIEW with the given segments.
    fn machine_in_review(segments: &[Bytes]) -> RecordingStateMachine {
        let mut machine = ready_machine();
        machine.handle(SessionEvent::Start);
        for _ in 0..3 {
            machine.handle(SessionEvent::CountdownTick);
        }
        for segment in segments {
            machine.handle(SessionEvent::Segment(segment.clone()));
        }
        machine.handle(SessionEvent::Stop);
        machine
    }

    #[test]
    fn test_initial_phase_is_ready() {
        let machine = RecordingStateMachine::new(3, "video/webm");
        assert_eq!(*machine.phase(), Phase::Ready);
        assert!(!machine.device_live());
    }

    #[test]
    fn test_start_without_device_stays_ready_and_reacquires() {
        let mut machine = RecordingStateMachine::new(3, "video/webm");
        let effects = machine.handle(SessionEvent::Start);
        assert_eq!(*machine.phase(), Phase::Ready);
        assert_eq!(effects, vec![Effect::AcquireDevice]);
    }

    #[test]
    fn test_start_enters_countdown_at_three() {
        let mut machine = ready_machine();
        let effects = machine.handle(SessionEvent::Start);
        assert_eq!(*machine.phase(), Phase::Countdown { remaining: 3 });
        assert_eq!(effects, vec![Effect::StartCountdown { from: 3 }]);
    }

    #[test]
    fn test_countdown_is_non_increasing_and_reaches_recording_in_three_ticks() {
        let mut machine = ready_machine();
        machine.handle(SessionEvent::Start);

        machine.handle(SessionEvent::CountdownTick);
        assert_eq!(*machine.phase(), Phase::Countdown { remaining: 2 });
        machine.handle(SessionEvent::CountdownTick);
        assert_eq!(*machine.phase(), Phase::Countdown { remaining: 1 });

        let effects = machine.handle(SessionEvent::CountdownTick);
        assert_eq!(*machine.phase(), Phase::Recording { elapsed: 0 });
        assert_eq!(effects, vec![Effect::BeginCapture, Effect::StartElapsed]);
    }

    #[test]
    fn test_elapsed_starts_at_zero_and_increments_per_tick() {
        let mut machine = ready_machine();
        machine.handle(SessionEvent::Start);
        for _ in 0..3 {
            machine.handle(SessionEvent::CountdownTick);
        }
        assert_eq!(*machine.phase(), Phase::Recording { elapsed: 0 });

        for expected in 1..=5 {
            machine.handle(SessionEvent::ElapsedTick);
            assert_eq!(
                *machine.phase(),
                Phase::Recording {
                    elapsed: expected
                }
            );
        }
    }

    #[test]
    fn test_stop_finalizes_segments_into_review_artifact() {
        let mut machine = ready_machine();
        machine.handle(SessionEvent::Start);
        for _ in 0..3 {
            machine.handle(SessionEvent::CountdownTick);
        }
        machine.handle(SessionEvent::Segment(Bytes::from_static(b"abc")));
        machine.handle(SessionEvent::Segment(Bytes::from_static(b"def")));

        let effects = machine.handle(SessionEvent::Stop);
        assert_eq!(effects, vec![Effect::CancelElapsed, Effect::ReleaseDevice]);

        match machine.phase() {
            Phase::Review { artifact, title } => {
                assert_eq!(artifact.data().as_ref(), b"abcdef");
                assert_eq!(artifact.mime_type(), "video/webm");
                assert!(title.is_empty());
            }
            other => panic!("expected REVIEW, got {}", other.name()),
        }
    }

    #[test]
    fn test_stop_with_no_segments_yields_zero_byte_artifact() {
        let machine = machine_in_review(&[]);
        match machine.phase() {
            Phase::Review { artifact, .. } => assert!(artifact.is_empty()),
            other => panic!("expected REVIEW, got {}", other.name()),
        }
    }

    #[test]
    fn test_discard_restores_the_initial_ready_state() {
        let mut machine = machine_in_review(&[Bytes::from_static(b"take")]);
        machine.handle(SessionEvent::SetTitle("scrapped".to_string()));

        let effects = machine.handle(SessionEvent::Discard);
        assert_eq!(*machine.phase(), Phase::Ready);
        assert_eq!(effects, vec![Effect::AcquireDevice]);

        // The next session must not see any leftover segments or title.
        machine.handle(SessionEvent::DeviceAcquired);
        machine.handle(SessionEvent::Start);
        for _ in 0..3 {
            machine.handle(SessionEvent::CountdownTick);
        }
        machine.handle(SessionEvent::Stop);
        match machine.phase() {
            Phase::Review { artifact, title } => {
                assert!(artifact.is_empty());
                assert!(title.is_empty());
            }
            other => panic!("expected REVIEW, got {}", other.name()),
        }
    }

    #[test]
    fn test_upload_with_empty_title_is_rejected() {
        let mut machine = machine_in_review(&[Bytes::from_static(b"take")]);

        let effects = machine.handle(SessionEvent::Upload);
        assert!(effects.is_empty());
        assert_eq!(machine.phase().name(), "REVIEW");

        machine.handle(SessionEvent::SetTitle("   ".to_string()));
        let effects = machine.handle(SessionEvent::Upload);
        assert!(effects.is_empty());
        assert_eq!(machine.phase().name(), "REVIEW");
    }

    #[test]
    fn test_upload_with_title_enters_uploading_and_submits() {
        let mut machine = machine_in_review(&[Bytes::from_static(b"take")]);
        machine.handle(SessionEvent::SetTitle("demo".to_string()));

        let effects = machine.handle(SessionEvent::Upload);
        assert_eq!(machine.phase().name(), "UPLOADING");
        match effects.as_slice() {
            [Effect::SubmitUpload { artifact, title }] => {
                assert_eq!(artifact.data().as_ref(), b"take");
                assert_eq!(title, "demo");
            }
            other => panic!("expected SubmitUpload, got {other:?}"),
        }
    }

    #[test]
    fn test_upload_failure_preserves_artifact_and_title() {
        let mut machine = machine_in_review(&[Bytes::from_static(b"precious")]);
        machine.handle(SessionEvent::SetTitle("demo".to_string()));
        machine.handle(SessionEvent::Upload);

        let error = SessionError::UploadTransportFailure("network".to_string());
        let effects = machine.handle(SessionEvent::UploadFailed(error.clone()));
        assert_eq!(effects, vec![Effect::SurfaceError(error)]);

        match machine.phase() {
            Phase::Review { artifact, title } => {
                assert_eq!(artifact.data().as_ref(), b"precious");
                assert_eq!(title, "demo");
            }
            other => panic!("expected REVIEW, got {}", other.name()),
        }

        // A second attempt is possible from the restored review state.
        let effects = machine.handle(SessionEvent::Upload);
        assert_eq!(machine.phase().name(), "UPLOADING");
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn test_upload_success_returns_to_ready_and_notifies_library_once() {
        let mut machine = machine_in_review(&[Bytes::from_static(b"take")]);
        machine.handle(SessionEvent::SetTitle("demo".to_string()));
        machine.handle(SessionEvent::Upload);

        let effects = machine.handle(SessionEvent::UploadSucceeded(receipt()));
        assert_eq!(*machine.phase(), Phase::Ready);
        assert_eq!(
            effects,
            vec![Effect::NotifyLibrary, Effect::AcquireDevice]
        );
        assert_eq!(
            effects
                .iter()
                .filter(|e| matches!(e, Effect::NotifyLibrary))
                .count(),
            1
        );
    }

    #[test]
    fn test_full_happy_path_scenario() {
        // start → countdown ×3 → 5 elapsed ticks → stop → title → upload →
        // success ends in READY with the artifact gone.
        let mut machine = ready_machine();
        machine.handle(SessionEvent::Start);
        for _ in 0..3 {
            machine.handle(SessionEvent::CountdownTick);
        }
        machine.handle(SessionEvent::Segment(Bytes::from_static(b"frame")));
        for _ in 0..5 {
            machine.handle(SessionEvent::ElapsedTick);
        }
        assert_eq!(*machine.phase(), Phase::Recording { elapsed: 5 });

        machine.handle(SessionEvent::Stop);
        machine.handle(SessionEvent::SetTitle("demo".to_string()));
        machine.handle(SessionEvent::Upload);
        let effects = machine.handle(SessionEvent::UploadSucceeded(receipt()));

        assert_eq!(*machine.phase(), Phase::Ready);
        assert!(effects.contains(&Effect::NotifyLibrary));
    }

    #[test]
    fn test_immediate_stop_then_empty_title_upload_stays_in_review() {
        // countdown 3→0, stop at elapsed=0, upload with empty title.
        let mut machine = machine_in_review(&[]);
        let effects = machine.handle(SessionEvent::Upload);
        assert!(effects.is_empty());
        assert_eq!(machine.phase().name(), "REVIEW");
    }

    #[test]
    fn test_stray_events_are_ignored_in_every_phase() {
        // READY ignores ticks, stop, discard, upload and completions.
        let mut machine = ready_machine();
        for event in [
            SessionEvent::CountdownTick,
            SessionEvent::ElapsedTick,
            SessionEvent::Segment(Bytes::from_static(b"x")),
            SessionEvent::Stop,
            SessionEvent::Discard,
            SessionEvent::SetTitle("x".to_string()),
            SessionEvent::Upload,
            SessionEvent::UploadSucceeded(receipt()),
            SessionEvent::UploadFailed(SessionError::UploadTransportFailure(
                "late".to_string(),
            )),
        ] {
            assert!(machine.handle(event).is_empty());
            assert_eq!(*machine.phase(), Phase::Ready);
        }

        // A stray countdown tick after capture began must not restart it.
        machine.handle(SessionEvent::Start);
        for _ in 0..3 {
            machine.handle(SessionEvent::CountdownTick);
        }
        assert_eq!(*machine.phase(), Phase::Recording { elapsed: 0 });
        machine.handle(SessionEvent::CountdownTick);
        assert_eq!(*machine.phase(), Phase::Recording { elapsed: 0 });

        // A late elapsed tick after stop leaves review untouched.
        machine.handle(SessionEvent::Stop);
        let phase_before = machine.phase().clone();
        machine.handle(SessionEvent::ElapsedTick);
        assert_eq!(*machine.phase(), phase_before);
    }

    #[test]
    fn test_late_segment_after_stop_is_dropped() {
        let mut machine = machine_in_review(&[Bytes::from_static(b"kept")]);
        machine.handle(SessionEvent::Segment(Bytes::from_static(b"late")));
        machine.handle(SessionEvent::SetTitle("demo".to_string()));
        machine.handle(SessionEvent::Upload);
        match machine.phase() {
            Phase::Uploading { artifact, .. } => {
                assert_eq!(artifact.data().as_ref(), b"kept");
            }
            other => panic!("expected UPLOADING, got {}", other.name()),
        }
    }

    #[test]
    fn test_set_title_during_uploading_is_ignored() {
        let mut machine = machine_in_review(&[Bytes::from_static(b"take")]);
        machine.handle(SessionEvent::SetTitle("demo".to_string()));
        machine.handle(SessionEvent::Upload);

        machine.handle(SessionEvent::SetTitle("changed".to_string()));
        match machine.phase() {
            Phase::Uploading { title, .. } => assert_eq!(title, "demo"),
            other => panic!("expected UPLOADING, got {}", other.name()),
        }
    }

    #[test]
    fn test_device_denied_surfaces_error_and_stays_put() {
        let mut machine = RecordingStateMachine::new(3, "video/webm");
        let effects = machine.handle(SessionEvent::DeviceDenied("no camera".to_string()));
        assert_eq!(*machine.phase(), Phase::Ready);
        assert!(!machine.device_live());
        assert_eq!(
            effects,
            vec![Effect::SurfaceError(SessionError::DeviceAccessDenied(
                "no camera".to_string()
            ))]
        );
    }

    #[test]
    fn test_device_lost_while_ready_reacquires() {
        let mut machine = ready_machine();
        let effects = machine.handle(SessionEvent::DeviceLost);
        assert!(!machine.device_live());
        assert_eq!(effects, vec![Effect::AcquireDevice]);
    }

    #[test]
    fn test_countdown_restarts_from_three_only_via_start() {
        let mut machine = ready_machine();
        machine.handle(SessionEvent::Start);
        machine.handle(SessionEvent::CountdownTick);
        assert_eq!(*machine.phase(), Phase::Countdown { remaining: 2 });

        // A second start mid-countdown must not reset the count.
        machine.handle(SessionEvent::Start);
        assert_eq!(*machine.phase(), Phase::Countdown { remaining: 2 });
    }
}
