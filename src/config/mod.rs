//! Configuration management for camcord.
//!
//! This module handles loading and saving application configuration from
//! TOML files, as well as secure storage of the library service credential.
//! Configuration is stored in the user's config directory, while the bearer
//! token is stored with restricted permissions in the user's local data
//! directory.

pub mod file;
pub mod secrets;

pub use file::{get_config_path, CamcordConfig, CaptureConfig, RecordingConfig, ServerConfig};
pub use secrets::{clear_token, get_token, save_token};
