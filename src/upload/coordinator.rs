//! Artifact submission to the recording library service.
//!
//! One submission per call: the artifact bytes go up as a multipart file
//! part alongside the user's title, authenticated with a bearer token. No
//! automatic retry is performed; a failed upload is reported back so the
//! user can retry explicitly from review.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::capture::MediaArtifact;

use super::credentials::CredentialProvider;
use super::UploadError;

/// The stored entry the service returns for a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadReceipt {
    pub id: i64,
    pub filename: String,
    #[serde(rename = "s3_url")]
    pub url: String,
}

/// Performs one submission of a finalized artifact plus metadata.
///
/// Behind a trait so the session runtime can be exercised without a
/// network.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn submit(
        &self,
        artifact: &MediaArtifact,
        title: &str,
    ) -> Result<UploadReceipt, UploadError>;
}

/// Production uploader: `POST {base_url}/videos/upload` with a multipart
/// form (`file` binary part, `filename` text field) and bearer auth.
pub struct UploadCoordinator {
    client: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl UploadCoordinator {
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            credentials,
        }
    }
}

#[async_trait]
impl Uploader for UploadCoordinator {
    async fn submit(
        &self,
        artifact: &MediaArtifact,
        title: &str,
    ) -> Result<UploadReceipt, UploadError> {
        // A failed credential fetch aborts the attempt before any bytes
        // leave the machine.
        let token = self.credentials.bearer_token().await?;

        if artifact.is_empty() {
            // Stop before the first segment arrived; the service decides
            // whether an empty payload is acceptable.
            tracing::debug!("Submitting zero-byte artifact");
        }

        let file_name = artifact_filename(title, artifact.mime_type());
        let file_part = reqwest::multipart::Part::stream(artifact.data().clone())
            .file_name(file_name.clone())
            .mime_str(artifact.mime_type())
            .map_err(|e| UploadError::Transport(format!("failed to build file part: {e}")))?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("filename", title.to_string());

        let url = format!("{}/videos/upload", self.base_url.trim_end_matches('/'));
        tracing::debug!(
            "Upload: POST {} ({} bytes as {})",
            url,
            artifact.len(),
            file_name
        );

        let response = match self
            .client
            .post(&url)
            .bearer_auth(&token)
            .multipart(form)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                let message = if e.is_connect() {
                    "Could not reach the library service. Check your internet connection."
                        .to_string()
                } else if e.is_timeout() {
                    "The library service did not respond in time.".to_string()
                } else {
                    format!("Upload network error: {e}")
                };
                return Err(UploadError::Transport(message));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = match status.as_u16() {
                401 | 403 => "The library service rejected your credential. Run 'camcord auth' to update your token."
                    .to_string(),
                413 => "The recording is too large for the library service.".to_string(),
                500..=599 => "The library service is experiencing issues. Please try again later."
                    .to_string(),
                _ => format!("Upload rejected (status {status}): {body}"),
            };
            return Err(UploadError::Transport(message));
        }

        let receipt: UploadReceipt = response
            .json()
            .await
            .map_err(|e| UploadError::Transport(format!("Malformed upload response: {e}")))?;

        tracing::info!(
            "Upload stored: id={} filename={}",
            receipt.id,
            receipt.filename
        );
        Ok(receipt)
    }
}

/// Derives the uploaded file name from the title and the container MIME
/// type, e.g. `My Take!` + `video/webm` → `my-take.webm`.
pub fn artifact_filename(title: &str, mime_type: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let slug = slug.trim_end_matches('-');
    let stem = if slug.is_empty() { "untitled" } else { slug };

    let extension = match mime_type {
        "video/webm" => "webm",
        "video/mp4" => "mp4",
        other => other.rsplit('/').next().unwrap_or("bin"),
    };

    format!("{stem}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_filename_slugs_the_title() {
        assert_eq!(
            artifact_filename("My First Take!", "video/webm"),
            "my-first-take.webm"
        );
        assert_eq!(artifact_filename("demo", "video/mp4"), "demo.mp4");
    }

    #[test]
    fn test_artifact_filename_falls_back_to_untitled() {
        assert_eq!(artifact_filename("", "video/webm"), "untitled.webm");
        assert_eq!(artifact_filename("???", "video/webm"), "untitled.webm");
    }

    #[test]
    fn test_artifact_filename_collapses_separator_runs() {
        assert_eq!(
            artifact_filename("  spaced   out  ", "video/webm"),
            "spaced-out.webm"
        );
    }

    #[test]
    fn test_receipt_parses_service_response() {
        let receipt: UploadReceipt = serde_json::from_str(
            r#"{"id": 12, "filename": "demo", "s3_url": "https://store.example/demo.webm", "created_at": "2024-11-02T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(receipt.id, 12);
        assert_eq!(receipt.url, "https://store.example/demo.webm");
    }
}
