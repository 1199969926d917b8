//! Configuration editing.
//!
//! Opens the config file in the user's preferred editor, writing the
//! defaults first if no file exists yet.

use std::process::Command;

use crate::config::{get_config_path, CamcordConfig};

/// Opens the configuration file in $EDITOR (fallback: nano, then vim).
pub fn handle_config() -> Result<(), anyhow::Error> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        CamcordConfig::default().save()?;
        println!("Created default config at {}", config_path.display());
    }

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| {
        if which_exists("nano") {
            "nano".to_string()
        } else {
            "vim".to_string()
        }
    });

    tracing::debug!("Opening {} with {editor}", config_path.display());
    let status = Command::new(&editor).arg(&config_path).status()?;

    if !status.success() {
        return Err(anyhow::anyhow!("Editor '{editor}' exited with an error"));
    }
    Ok(())
}

fn which_exists(binary: &str) -> bool {
    Command::new("which")
        .arg(binary)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
