//! Secure storage of the library service credential.
//!
//! The bearer token entered via `camcord auth` is kept out of the main
//! config file, in a separate secrets file under the user's local data
//! directory with restricted permissions (0600 on Unix).

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Secrets {
    /// Bearer token for the recording library service.
    token: Option<String>,
}

/// Saves the bearer token, replacing any previous value.
///
/// # Errors
/// - If the data directory cannot be determined or created
/// - If the secrets file cannot be written
pub fn save_token(token: &str) -> Result<()> {
    let mut secrets = read_secrets()?;
    secrets.token = Some(token.to_string());
    write_secrets(&secrets)
}

/// Returns the stored bearer token, if any.
///
/// # Errors
/// - If the secrets file exists but cannot be read or parsed
pub fn get_token() -> Result<Option<String>> {
    Ok(read_secrets()?.token)
}

/// Removes the stored bearer token.
///
/// # Errors
/// - If the secrets file cannot be rewritten
pub fn clear_token() -> Result<()> {
    let mut secrets = read_secrets()?;
    secrets.token = None;
    write_secrets(&secrets)
}

fn read_secrets() -> Result<Secrets> {
    let path = secrets_path()?;
    if !path.exists() {
        return Ok(Secrets::default());
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| anyhow!("Malformed secrets file: {e}"))
}

fn write_secrets(secrets: &Secrets) -> Result<()> {
    let path = secrets_path()?;
    let content = toml::to_string_pretty(secrets)?;
    fs::write(&path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
    }

    tracing::debug!("Secrets updated");
    Ok(())
}

fn secrets_path() -> Result<PathBuf> {
    let data_dir = dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not determine home directory"))?
        .join(".local")
        .join("share")
        .join("camcord");
    fs::create_dir_all(&data_dir)?;
    Ok(data_dir.join("secrets.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_toml_round_trip() {
        let secrets = Secrets {
            token: Some("abc123".to_string()),
        };
        let serialized = toml::to_string_pretty(&secrets).unwrap();
        let parsed: Secrets = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.token.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_missing_token_deserializes_as_none() {
        let parsed: Secrets = toml::from_str("").unwrap();
        assert!(parsed.token.is_none());
    }
}
