//! Upload history storage and retrieval using SQLite.
//!
//! Keeps a local record of every successful upload so the user can see
//! what went to the library and when. Purely informational; the session
//! controller never consults it.

use anyhow::Result;
use chrono::{DateTime, Local};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

/// A single uploaded recording in the history.
#[derive(Debug, Clone)]
pub struct UploadRecord {
    /// Local row id
    pub id: i64,
    /// Title the recording was uploaded under
    pub title: String,
    /// Artifact size in bytes
    pub bytes: u64,
    /// Recorded duration in seconds
    pub duration_secs: u64,
    /// Id assigned by the library service
    pub remote_id: i64,
    /// When the upload completed
    pub created_at: DateTime<Local>,
}

/// Manages the upload history database.
pub struct HistoryManager {
    /// Path to the SQLite database file
    database_path: PathBuf,
    /// Connection to the database (lazy-loaded)
    connection: Option<Connection>,
}

impl HistoryManager {
    /// Creates a new history manager for the given data directory.
    ///
    /// # Errors
    /// - If the data directory cannot be accessed
    pub fn new(data_dir: &Path) -> Result<Self> {
        let database_path = data_dir.join("upload_history.db");

        Ok(Self {
            database_path,
            connection: None,
        })
    }

    /// Initializes database connection and creates tables if necessary.
    ///
    /// # Errors
    /// - If the database file cannot be opened
    /// - If table creation fails
    fn get_connection(&mut self) -> Result<&Connection> {
        if self.connection.is_none() {
            let connection = Connection::open(&self.database_path)?;

            connection.execute(
                "CREATE TABLE IF NOT EXISTS uploads (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    bytes INTEGER NOT NULL,
                    duration_secs INTEGER NOT NULL,
                    remote_id INTEGER NOT NULL,
                    created_at TEXT NOT NULL
                )",
                [],
            )?;

            self.connection = Some(connection);
        }

        Ok(self.connection.as_ref().unwrap())
    }

    /// Records a successful upload.
    ///
    /// # Errors
    /// - If database connection fails
    /// - If insertion fails
    pub fn record_upload(
        &mut self,
        title: &str,
        bytes: u64,
        duration_secs: u64,
        remote_id: i64,
    ) -> Result<()> {
        let connection = self.get_connection()?;
        let timestamp = Local::now().to_rfc3339();

        connection.execute(
            "INSERT INTO uploads (title, bytes, duration_secs, remote_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![title, bytes as i64, duration_secs as i64, remote_id, timestamp],
        )?;

        tracing::debug!("Upload recorded in history: {title}");
        Ok(())
    }

    /// Retrieves the most recent uploads, newest first.
    ///
    /// # Errors
    /// - If database connection fails
    /// - If query execution fails
    pub fn recent(&mut self, limit: usize) -> Result<Vec<UploadRecord>> {
        let connection = self.get_connection()?;

        let mut statement = connection.prepare(
            "SELECT id, title, bytes, duration_secs, remote_id, created_at
             FROM uploads ORDER BY created_at DESC LIMIT ?1",
        )?;

        let records = statement
            .query_map(params![limit as i64], |row| {
                let timestamp_str = row.get::<_, String>(5)?;
                let created_at = DateTime::parse_from_rfc3339(&timestamp_str)
                    .map(|dt| dt.with_timezone(&Local))
                    .map_err(|_| {
                        rusqlite::Error::InvalidParameterName(
                            "Invalid timestamp format".to_string(),
                        )
                    })?;

                Ok(UploadRecord {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    bytes: row.get::<_, i64>(2)? as u64,
                    duration_secs: row.get::<_, i64>(3)? as u64,
                    remote_id: row.get(4)?,
                    created_at,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }
}
