//! Capture device listing.
//!
//! Shows device identifiers and names to help configure the correct
//! video/audio inputs in camcord.toml.

use crate::capture;
use crate::config;

/// Prints the available capture devices grouped by kind.
pub fn handle_list_devices() -> Result<(), anyhow::Error> {
    let devices = capture::list_devices()?;

    if devices.is_empty() {
        println!("No capture devices found.");
        return Ok(());
    }

    println!("Video devices:");
    for device in devices.iter().filter(|d| d.kind == "video") {
        println!("  {:12}  {}", device.id, device.name);
    }

    println!("\nAudio devices:");
    for device in devices.iter().filter(|d| d.kind == "audio") {
        println!("  {:12}  {}", device.id, device.name);
    }

    if let Ok(path) = config::get_config_path() {
        println!(
            "\nSet [capture] video_device / audio_device in {}",
            path.display()
        );
    }
    Ok(())
}
