//! Device stream ownership and capture lifecycle.
//!
//! The `CaptureController` is the only component that holds the live
//! camera+microphone handle. Acquisition and release are explicit
//! operations driven by session phase transitions, never by view
//! lifecycle, so the ownership discipline is testable without a terminal.
//!
//! The platform surface sits behind the `CaptureBackend` trait. The
//! production backend spawns an ffmpeg child muxing camera+microphone to
//! WebM on stdout; a scripted backend stands in for hardware in tests.

use std::process::Stdio;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::config::CaptureConfig;

use super::ffmpeg::{capture_args, find_ffmpeg};

/// Failures from the capture subsystem.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The platform refused camera/microphone access, or the device is
    /// missing or busy. Recoverable: the session stays ready for a retry.
    #[error("{0}")]
    AccessDenied(String),

    /// The capture pipeline itself failed (spawn, codec, unexpected exit).
    #[error("capture failed: {0}")]
    Backend(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A live hardware stream handle. At most one exists at a time; dropping
/// it without `release` is a bug the controller prevents.
#[async_trait]
pub trait DeviceStream: Send {
    /// Whether the underlying tracks are still running.
    fn is_live(&self) -> bool;

    /// Starts segment emission into `segments`. Called at most once per
    /// recording phase.
    async fn begin_capture(
        &mut self,
        segments: UnboundedSender<Bytes>,
    ) -> Result<(), CaptureError>;

    /// Stops emission and returns any segments produced after the stop was
    /// requested, so the finalized artifact contains every captured byte.
    async fn end_capture(&mut self) -> Result<Vec<Bytes>, CaptureError>;

    /// Stops all tracks and frees the hardware.
    async fn release(&mut self);
}

/// Platform capability to request combined audio+video access.
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn DeviceStream>, CaptureError>;
}

/// Owns acquisition and release of the device stream and the start/stop of
/// hardware capture.
pub struct CaptureController {
    backend: Box<dyn CaptureBackend>,
    stream: Option<Box<dyn DeviceStream>>,
}

impl CaptureController {
    pub fn new(backend: Box<dyn CaptureBackend>) -> Self {
        Self {
            backend,
            stream: None,
        }
    }

    /// Acquires a device stream if none is live.
    ///
    /// A stream whose tracks ended outside our control (e.g. permission
    /// revoked externally) is released and replaced.
    ///
    /// # Errors
    /// - `AccessDenied` if the platform refuses the devices
    pub async fn ensure_live(&mut self) -> Result<(), CaptureError> {
        if let Some(stream) = &self.stream {
            if stream.is_live() {
                return Ok(());
            }
            tracing::info!("Device stream ended externally; re-acquiring");
        }
        self.release().await;
        let stream = self.backend.acquire().await?;
        self.stream = Some(stream);
        tracing::debug!("Device stream acquired");
        Ok(())
    }

    pub fn is_live(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| s.is_live())
    }

    /// Begins segment emission on the live stream.
    ///
    /// # Errors
    /// - If no device stream is live
    /// - If the backend fails to start the capture pipeline
    pub async fn begin_capture(
        &mut self,
        segments: UnboundedSender<Bytes>,
    ) -> Result<(), CaptureError> {
        match &mut self.stream {
            Some(stream) => stream.begin_capture(segments).await,
            None => Err(CaptureError::Backend(
                "no live device stream to capture from".to_string(),
            )),
        }
    }

    /// Stops segment emission and releases the device stream as part of the
    /// same stop sequence. Returns the trailing segments drained after the
    /// stop request.
    pub async fn end_capture(&mut self) -> Result<Vec<Bytes>, CaptureError> {
        let tail = match &mut self.stream {
            Some(stream) => stream.end_capture().await?,
            None => Vec::new(),
        };
        self.release().await;
        Ok(tail)
    }

    /// Stops all hardware tracks. Idempotent: a call with no live stream is
    /// a no-op.
    pub async fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release().await;
            tracing::debug!("Device stream released");
        }
    }
}

/// Where reader-task chunks go: into the session queue while capture is
/// live, into a drain vector once stop has been requested.
enum SegmentSink {
    Live(UnboundedSender<Bytes>),
    Draining(Vec<Bytes>),
    Closed,
}

/// Production backend: captures via an ffmpeg child process.
pub struct FfmpegBackend {
    config: CaptureConfig,
}

impl FfmpegBackend {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CaptureBackend for FfmpegBackend {
    async fn acquire(&self) -> Result<Box<dyn DeviceStream>, CaptureError> {
        let ffmpeg =
            find_ffmpeg().map_err(|e| CaptureError::Backend(e.to_string()))?;

        // Opening the device node is the closest thing to a permission
        // grant outside a browser: missing or unreadable means denied.
        #[cfg(target_os = "linux")]
        {
            let device = &self.config.video_device;
            if let Err(e) = std::fs::OpenOptions::new().read(true).open(device) {
                return Err(CaptureError::AccessDenied(format!(
                    "cannot open {device}: {e}"
                )));
            }
        }

        Ok(Box::new(FfmpegStream {
            ffmpeg,
            config: self.config.clone(),
            child: None,
            reader: None,
            sink: Arc::new(Mutex::new(SegmentSink::Closed)),
            live: true,
        }))
    }
}

struct FfmpegStream {
    ffmpeg: std::path::PathBuf,
    config: CaptureConfig,
    child: Option<tokio::process::Child>,
    reader: Option<JoinHandle<()>>,
    sink: Arc<Mutex<SegmentSink>>,
    live: bool,
}

#[async_trait]
impl DeviceStream for FfmpegStream {
    fn is_live(&self) -> bool {
        self.live
    }

    async fn begin_capture(
        &mut self,
        segments: UnboundedSender<Bytes>,
    ) -> Result<(), CaptureError> {
        if self.child.is_some() {
            return Err(CaptureError::Backend(
                "capture already running".to_string(),
            ));
        }

        let args = capture_args(&self.config);
        tracing::debug!("Spawning ffmpeg capture: {}", args.join(" "));

        let mut child = tokio::process::Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CaptureError::Backend(format!("failed to spawn ffmpeg: {e}")))?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| CaptureError::Backend("ffmpeg stdout not piped".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines =
                    tokio::io::AsyncBufReadExt::lines(tokio::io::BufReader::new(stderr));
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::warn!("ffmpeg: {line}");
                }
            });
        }

        *self.sink.lock().unwrap() = SegmentSink::Live(segments);
        let sink = Arc::clone(&self.sink);

        self.reader = Some(tokio::spawn(async move {
            let mut buf = vec![0u8; 32 * 1024];
            loop {
                match stdout.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        let chunk = Bytes::copy_from_slice(&buf[..n]);
                        let mut sink = sink.lock().unwrap();
                        match &mut *sink {
                            SegmentSink::Live(tx) => {
                                if tx.send(chunk).is_err() {
                                    break;
                                }
                            }
                            SegmentSink::Draining(tail) => tail.push(chunk),
                            SegmentSink::Closed => break,
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Capture read error: {e}");
                        break;
                    }
                }
            }
        }));

        self.child = Some(child);
        Ok(())
    }

    async fn end_capture(&mut self) -> Result<Vec<Bytes>, CaptureError> {
        // Everything read from here on belongs to the tail the caller
        // appends before the stop transition is applied.
        *self.sink.lock().unwrap() = SegmentSink::Draining(Vec::new());

        if let Some(mut child) = self.child.take() {
            // Ask ffmpeg to finish the container; fall back to kill.
            if let Some(mut stdin) = child.stdin.take() {
                let _ = stdin.write_all(b"q").await;
                let _ = stdin.flush().await;
            }
            match tokio::time::timeout(std::time::Duration::from_secs(3), child.wait()).await {
                Ok(Ok(status)) => tracing::debug!("ffmpeg exited: {status}"),
                Ok(Err(e)) => tracing::warn!("ffmpeg wait failed: {e}"),
                Err(_) => {
                    tracing::warn!("ffmpeg did not exit in time; killing");
                    let _ = child.kill().await;
                }
            }
        }

        if let Some(reader) = self.reader.take() {
            let _ = reader.await;
        }

        let tail = match std::mem::replace(&mut *self.sink.lock().unwrap(), SegmentSink::Closed)
        {
            SegmentSink::Draining(tail) => tail,
            _ => Vec::new(),
        };
        Ok(tail)
    }

    async fn release(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill().await;
        }
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        *self.sink.lock().unwrap() = SegmentSink::Closed;
        self.live = false;
    }
}

/// Scripted stand-ins for hardware, used by controller and runtime tests.
#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counters observing backend interactions across a test.
    #[derive(Default)]
    pub struct BackendLog {
        pub acquired: AtomicUsize,
        pub released: AtomicUsize,
        pub captures_begun: AtomicUsize,
        pub captures_ended: AtomicUsize,
    }

    pub struct ScriptedBackend {
        pub log: Arc<BackendLog>,
        /// Number of initial acquire calls to deny before granting.
        pub deny_first: AtomicUsize,
        /// Segments emitted as soon as capture begins.
        pub live_segments: Vec<Bytes>,
        /// Segments returned as the drain tail on end_capture.
        pub tail_segments: Vec<Bytes>,
    }

    impl ScriptedBackend {
        pub fn granting(live: Vec<Bytes>, tail: Vec<Bytes>) -> Self {
            Self {
                log: Arc::new(BackendLog::default()),
                deny_first: AtomicUsize::new(0),
                live_segments: live,
                tail_segments: tail,
            }
        }

        pub fn denying(times: usize) -> Self {
            Self {
                log: Arc::new(BackendLog::default()),
                deny_first: AtomicUsize::new(times),
                live_segments: Vec::new(),
                tail_segments: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl CaptureBackend for ScriptedBackend {
        async fn acquire(&self) -> Result<Box<dyn DeviceStream>, CaptureError> {
            let remaining = self.deny_first.load(Ordering::SeqCst);
            if remaining > 0 {
                self.deny_first.store(remaining - 1, Ordering::SeqCst);
                return Err(CaptureError::AccessDenied(
                    "camera access denied".to_string(),
                ));
            }
            self.log.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(ScriptedStream {
                log: Arc::clone(&self.log),
                live_segments: self.live_segments.clone(),
                tail_segments: self.tail_segments.clone(),
                live: true,
            }))
        }
    }

    pub struct ScriptedStream {
        log: Arc<BackendLog>,
        live_segments: Vec<Bytes>,
        tail_segments: Vec<Bytes>,
        live: bool,
    }

    #[async_trait]
    impl DeviceStream for ScriptedStream {
        fn is_live(&self) -> bool {
            self.live
        }

        async fn begin_capture(
            &mut self,
            segments: UnboundedSender<Bytes>,
        ) -> Result<(), CaptureError> {
            self.log.captures_begun.fetch_add(1, Ordering::SeqCst);
            for segment in self.live_segments.drain(..) {
                let _ = segments.send(segment);
            }
            Ok(())
        }

        async fn end_capture(&mut self) -> Result<Vec<Bytes>, CaptureError> {
            self.log.captures_ended.fetch_add(1, Ordering::SeqCst);
            Ok(std::mem::take(&mut self.tail_segments))
        }

        async fn release(&mut self) {
            if self.live {
                self.log.released.fetch_add(1, Ordering::SeqCst);
            }
            self.live = false;
        }
    }
}
