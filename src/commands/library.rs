//! Library management commands.
//!
//! Thin wrappers around the remote recording library: list what is
//! stored, rename an entry, delete an entry. All calls are authenticated
//! with the stored bearer token.

use std::sync::Arc;

use crate::config::CamcordConfig;
use crate::library::LibraryClient;
use crate::upload::StoredTokenProvider;

fn client() -> Result<LibraryClient, anyhow::Error> {
    let config_data = CamcordConfig::load()?;
    Ok(LibraryClient::new(
        config_data.server.base_url,
        Arc::new(StoredTokenProvider),
    ))
}

/// Prints the stored recordings, newest first.
pub async fn handle_library_list() -> Result<(), anyhow::Error> {
    let entries = client()?.list().await?;

    if entries.is_empty() {
        println!("No recordings in the library yet.");
        return Ok(());
    }

    println!("{:>6}  {:30}  {:20}  URL", "ID", "TITLE", "CREATED");
    for entry in entries {
        println!(
            "{:>6}  {:30}  {:20}  {}",
            entry.id,
            truncate(&entry.filename, 30),
            truncate(&entry.created_at, 20),
            entry.url
        );
    }
    Ok(())
}

/// Renames a stored recording.
pub async fn handle_library_rename(id: i64, title: String) -> Result<(), anyhow::Error> {
    let entry = client()?.rename(id, &title).await?;
    println!("Renamed recording {} to \"{}\"", entry.id, entry.filename);
    Ok(())
}

/// Deletes a stored recording.
pub async fn handle_library_delete(id: i64) -> Result<(), anyhow::Error> {
    client()?.delete(id).await?;
    println!("Deleted recording {id}");
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_short_strings() {
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn test_truncate_marks_long_strings() {
        assert_eq!(truncate("a very long recording title", 10), "a very lo…");
    }
}
