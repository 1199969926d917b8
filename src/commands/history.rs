//! Upload history viewer.
//!
//! Lists recent uploads recorded locally after each successful submission.

use crate::history::HistoryManager;

const HISTORY_LIMIT: usize = 20;

/// Prints the most recent uploads, newest first.
pub fn handle_history() -> Result<(), anyhow::Error> {
    let data_dir = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
        .join(".local")
        .join("share")
        .join("camcord");
    std::fs::create_dir_all(&data_dir)?;

    let mut history = HistoryManager::new(&data_dir)?;
    let records = history.recent(HISTORY_LIMIT)?;

    if records.is_empty() {
        println!("No uploads yet. Record something with 'camcord record'.");
        return Ok(());
    }

    for record in records {
        let minutes = record.duration_secs / 60;
        let seconds = record.duration_secs % 60;
        println!(
            "{}  {}  ({}:{:02}, {} KiB)  remote #{}",
            record.created_at.format("%Y-%m-%d %H:%M"),
            record.title,
            minutes,
            seconds,
            record.bytes / 1024,
            record.remote_id
        );
    }
    Ok(())
}
