//! Device capture for camcord.
//!
//! Owns the camera+microphone stream lifecycle, the ffmpeg capture
//! pipeline, and the segment buffer that turns chunked capture output into
//! one immutable artifact.

pub mod chunks;
pub mod controller;
pub mod ffmpeg;

pub use chunks::{ChunkBuffer, MediaArtifact};
pub use controller::{
    CaptureBackend, CaptureController, CaptureError, DeviceStream, FfmpegBackend,
};
pub use ffmpeg::{find_ffmpeg, list_devices, CaptureDevice};
