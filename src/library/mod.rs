//! Thin client for the remote recording library.
//!
//! The library is an external collaborator: a remote CRUD list of stored
//! recordings. The session controller only fires a refresh signal at it;
//! everything here is glue for the `camcord library` subcommands and the
//! in-TUI library counter.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::json;

use crate::upload::CredentialProvider;

/// One stored recording as the service reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryEntry {
    pub id: i64,
    pub filename: String,
    #[serde(rename = "s3_url")]
    pub url: String,
    pub created_at: String,
}

/// Authenticated CRUD calls against the library service.
pub struct LibraryClient {
    client: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl LibraryClient {
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            credentials,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    async fn token(&self) -> Result<String> {
        self.credentials
            .bearer_token()
            .await
            .map_err(|e| anyhow!("{e}"))
    }

    /// Fetches the caller's stored recordings, newest first.
    ///
    /// # Errors
    /// - If no credential is available
    /// - If the request fails or the service rejects it
    pub async fn list(&self) -> Result<Vec<LibraryEntry>> {
        let token = self.token().await?;
        let response = self
            .client
            .get(self.url("/videos"))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to fetch library: {e}"))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Library list rejected (status {})",
                response.status()
            ));
        }

        response
            .json()
            .await
            .map_err(|e| anyhow!("Malformed library response: {e}"))
    }

    /// Renames a stored recording.
    ///
    /// # Errors
    /// - If the entry does not exist or belongs to someone else
    pub async fn rename(&self, id: i64, title: &str) -> Result<LibraryEntry> {
        let token = self.token().await?;
        let response = self
            .client
            .patch(self.url(&format!("/videos/{id}")))
            .bearer_auth(&token)
            .json(&json!({ "filename": title }))
            .send()
            .await
            .map_err(|e| anyhow!("Failed to rename recording: {e}"))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Rename rejected (status {})",
                response.status()
            ));
        }

        response
            .json()
            .await
            .map_err(|e| anyhow!("Malformed rename response: {e}"))
    }

    /// Deletes a stored recording.
    ///
    /// # Errors
    /// - If the entry does not exist or belongs to someone else
    pub async fn delete(&self, id: i64) -> Result<()> {
        let token = self.token().await?;
        let response = self
            .client
            .delete(self.url(&format!("/videos/{id}")))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to delete recording: {e}"))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Delete rejected (status {})",
                response.status()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_parses_service_json() {
        let entries: Vec<LibraryEntry> = serde_json::from_str(
            r#"[{"id": 3, "filename": "standup", "s3_url": "https://store.example/standup.webm", "created_at": "2024-11-02T10:00:00"}]"#,
        )
        .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, 3);
        assert_eq!(entries[0].filename, "standup");
    }
}
