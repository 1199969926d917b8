//! Upload handoff for finalized recordings.
//!
//! Packages an artifact plus user-supplied metadata into one authenticated
//! submission to the remote library service, and defines the credential
//! seam both the uploader and the library client consume.

pub mod coordinator;
pub mod credentials;

use thiserror::Error;

pub use coordinator::{artifact_filename, UploadCoordinator, UploadReceipt, Uploader};
pub use credentials::{CredentialProvider, StoredTokenProvider};

/// Why a submission did not store the artifact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// The bearer credential could not be fetched; the request was never
    /// sent.
    #[error("{0}")]
    AuthUnavailable(String),

    /// The network round-trip or the service itself failed.
    #[error("{0}")]
    Transport(String),
}
