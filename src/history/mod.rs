//! Local upload history for camcord.

pub mod storage;

pub use storage::{HistoryManager, UploadRecord};
