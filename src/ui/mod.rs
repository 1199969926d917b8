//! Terminal user interface for camcord.

pub mod error;
pub mod recorder;

pub use error::ErrorScreen;
pub use recorder::{RecorderCommand, RecorderTui};
