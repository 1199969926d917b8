//! Log viewing.
//!
//! Prints the tail of the most recent log file, for troubleshooting
//! without digging through the state directory by hand.

use std::fs;
use std::path::PathBuf;

use crate::logging;

const TAIL_LINES: usize = 50;

/// Displays the last lines of the most recent log file.
pub fn handle_logs() -> Result<(), anyhow::Error> {
    let log_dir = logging::get_log_dir()?;

    let mut log_files: Vec<(PathBuf, std::time::SystemTime)> = fs::read_dir(&log_dir)?
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();
            let name = path.file_name()?.to_string_lossy().to_string();
            if !name.starts_with("camcord.log") {
                return None;
            }
            let modified = fs::metadata(&path).ok()?.modified().ok()?;
            Some((path, modified))
        })
        .collect();

    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    let Some((latest, _)) = log_files.first() else {
        println!("No log files found in {}", log_dir.display());
        return Ok(());
    };

    let content = fs::read_to_string(latest)?;
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(TAIL_LINES);

    println!("==> {} <==", latest.display());
    for line in &lines[start..] {
        println!("{line}");
    }
    Ok(())
}
