//! Library service authentication.
//!
//! Stores the service URL and bearer token used by uploads and library
//! calls. The identity protocol itself lives server-side; camcord only
//! keeps the resulting credential. Users can keep the existing token by
//! pressing Enter without entering anything.

use anyhow::anyhow;
use cliclack::{intro, note, outro, password};
use console::style;

use crate::config::{self, CamcordConfig};

/// Handles service URL and bearer token management.
pub async fn handle_auth(clear: bool) -> Result<(), anyhow::Error> {
    tracing::info!("=== camcord authentication ===");

    if clear {
        config::clear_token()?;
        println!("Stored token removed.");
        return Ok(());
    }

    ctrlc::set_handler(move || {}).expect("setting Ctrl-C handler");

    intro(style(" auth ").on_white().black())?;

    let mut config_data = CamcordConfig::load()?;
    note("library service", &config_data.server.base_url)?;

    let base_url: String = cliclack::input("Library service URL:")
        .default_input(&config_data.server.base_url)
        .interact()
        .map_err(|e| anyhow!("URL input cancelled: {e}"))?;

    let current_token = config::get_token().ok().flatten();

    let token = if current_token.is_some() {
        password("Enter bearer token (press Enter to keep current):")
            .allow_empty()
            .interact()
            .map_err(|e| anyhow!("Token input cancelled: {e}"))?
    } else {
        password("Enter bearer token:")
            .interact()
            .map_err(|e| anyhow!("Token input cancelled: {e}"))?
    };

    if token.is_empty() {
        if current_token.is_none() {
            return Err(anyhow!("Token cannot be empty"));
        }
        tracing::debug!("Keeping existing token");
    } else {
        config::save_token(&token)?;
        tracing::info!("Bearer token updated");
    }

    config_data.server.base_url = base_url.trim_end_matches('/').to_string();
    config_data.save()?;

    outro("Credentials saved. You're ready to record.")?;
    Ok(())
}
