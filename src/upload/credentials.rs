//! Bearer credential supply for the library service.
//!
//! The upload coordinator and library client fetch the token on demand so
//! a credential rotated while the app runs is picked up on the next call.

use async_trait::async_trait;

use crate::config;

use super::UploadError;

/// Supplies a short-lived bearer token on demand. The fetch may be
/// asynchronous and may fail, which aborts the calling upload attempt
/// with `AuthUnavailable`.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<String, UploadError>;
}

/// Production provider: reads the token written by `camcord auth`.
pub struct StoredTokenProvider;

#[async_trait]
impl CredentialProvider for StoredTokenProvider {
    async fn bearer_token(&self) -> Result<String, UploadError> {
        match config::get_token() {
            Ok(Some(token)) => Ok(token),
            Ok(None) => Err(UploadError::AuthUnavailable(
                "no token stored; run 'camcord auth' first".to_string(),
            )),
            Err(e) => Err(UploadError::AuthUnavailable(e.to_string())),
        }
    }
}
