//! Segment accumulation and artifact finalization.
//!
//! During capture, the device stream emits binary media segments in arrival
//! order. The `ChunkBuffer` collects them and, on stop, concatenates them
//! into a single immutable `MediaArtifact` that is handed to review/upload.

use bytes::{Bytes, BytesMut};

/// The finalized, immutable recording produced by one session.
///
/// Constructed exactly once per session by [`ChunkBuffer::finalize`] and
/// never mutated afterwards. The payload is reference-counted, so handing
/// it to the upload coordinator does not copy the media bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaArtifact {
    data: Bytes,
    mime_type: String,
}

impl MediaArtifact {
    /// Returns the raw media bytes.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Returns the container MIME type, e.g. "video/webm".
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Returns the artifact size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true for a zero-byte artifact (stop before any segment arrived).
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Ordered accumulator for binary media segments.
///
/// Segments are appended in arrival order; zero-length segments are dropped
/// silently. `finalize` drains the buffer into one artifact, so the buffer
/// is ready for the next recording without an explicit reset in between.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    segments: Vec<Bytes>,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears any segments left over from a prior capture.
    ///
    /// Called when entering the recording phase so a stale segment from an
    /// interrupted capture can never leak into a new artifact.
    pub fn reset(&mut self) {
        if !self.segments.is_empty() {
            tracing::debug!(
                "Discarding {} stale segments from previous capture",
                self.segments.len()
            );
        }
        self.segments.clear();
    }

    /// Appends one segment in arrival order. Empty segments are dropped.
    pub fn append(&mut self, segment: Bytes) {
        if segment.is_empty() {
            return;
        }
        self.segments.push(segment);
    }

    /// Returns the number of buffered segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Returns the total buffered size in bytes.
    pub fn byte_len(&self) -> usize {
        self.segments.iter().map(Bytes::len).sum()
    }

    /// Concatenates all segments into one immutable artifact and clears the
    /// buffer.
    ///
    /// A capture that produced no segments yields a zero-byte artifact; the
    /// controller does not treat an empty recording as an error.
    pub fn finalize(&mut self, mime_type: &str) -> MediaArtifact {
        let total: usize = self.byte_len();
        let mut data = BytesMut::with_capacity(total);
        for segment in self.segments.drain(..) {
            data.extend_from_slice(&segment);
        }

        tracing::debug!("Finalized artifact: {} bytes ({})", total, mime_type);

        MediaArtifact {
            data: data.freeze(),
            mime_type: mime_type.to_string(),
        }
    }
}
