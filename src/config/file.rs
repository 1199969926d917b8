//! Configuration file management for camcord.
//!
//! This module handles loading and saving application configuration from
//! TOML files. Configuration is stored in the user's config directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Capture device and encoding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Video capture device. Options:
    /// - Linux: a v4l2 node such as "/dev/video0"
    /// - macOS: an AVFoundation index from `camcord list-devices`
    /// - Windows: a DirectShow device name
    #[serde(default = "default_video_device")]
    pub video_device: String,
    /// Audio capture device; "default" for the system default source.
    #[serde(default = "default_audio_device")]
    pub audio_device: String,
    /// Capture width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,
    /// Capture height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,
    /// Capture framerate in frames per second.
    #[serde(default = "default_framerate")]
    pub framerate: u32,
}

fn default_video_device() -> String {
    if cfg!(target_os = "linux") {
        "/dev/video0".to_string()
    } else {
        "0".to_string()
    }
}

fn default_audio_device() -> String {
    "default".to_string()
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_framerate() -> u32 {
    30
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            video_device: default_video_device(),
            audio_device: default_audio_device(),
            width: default_width(),
            height: default_height(),
            framerate: default_framerate(),
        }
    }
}

/// Recording session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Seconds counted down before capture begins.
    #[serde(default = "default_countdown_secs")]
    pub countdown_secs: u32,
    /// Container MIME type of finalized artifacts.
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
}

fn default_countdown_secs() -> u32 {
    3
}

fn default_mime_type() -> String {
    "video/webm".to_string()
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            countdown_secs: default_countdown_secs(),
            mime_type: default_mime_type(),
        }
    }
}

/// Remote recording library configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the library service, e.g. "https://rec.example.com".
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CamcordConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl CamcordConfig {
    /// Loads configuration from the user's config directory, falling back
    /// to defaults when no file exists yet.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file exists but cannot be read
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        let config_path = get_config_path()?;
        if !config_path.exists() {
            tracing::debug!("No config file; using defaults");
            return Ok(Self::default());
        }
        let config_content = fs::read_to_string(&config_path)?;
        let config: CamcordConfig = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Saves configuration to the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the file cannot be written
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = get_config_path()?;
        let config_content = toml::to_string_pretty(self)?;
        fs::write(&config_path, config_content)?;
        tracing::info!("Configuration saved");
        Ok(())
    }
}

/// Retrieves the path to the config file, creating the directory if needed.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn get_config_path() -> Result<PathBuf, std::io::Error> {
    let config_dir = dirs::home_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not find home directory",
        )
    })?;
    let config_path = config_dir
        .join(".config")
        .join("camcord")
        .join("camcord.toml");

    std::fs::create_dir_all(config_path.parent().unwrap())?;

    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip_through_toml() {
        let config = CamcordConfig::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: CamcordConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.recording.countdown_secs, 3);
        assert_eq!(parsed.recording.mime_type, "video/webm");
        assert_eq!(parsed.capture.width, 1280);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: CamcordConfig = toml::from_str(
            r#"
            [server]
            base_url = "https://rec.example.com"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.server.base_url, "https://rec.example.com");
        assert_eq!(parsed.recording.countdown_secs, 3);
        assert_eq!(parsed.capture.framerate, 30);
    }
}
