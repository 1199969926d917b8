//! FFmpeg integration for device capture.
//!
//! camcord delegates the hardware side of capture to an ffmpeg child
//! process: ffmpeg opens the camera and microphone through the platform
//! capture framework (v4l2/ALSA on Linux, AVFoundation on macOS, DirectShow
//! on Windows), muxes both into a WebM stream, and writes it to stdout
//! where the capture controller reads it in chunks. This module locates
//! the binary, builds the capture command line, and parses device listings.

use std::path::PathBuf;
use std::process::Command;

use anyhow::{anyhow, Result};
use regex::Regex;

use crate::config::CaptureConfig;

/// Locates the ffmpeg binary on the system.
///
/// Checks standard installation locations first, then falls back to a PATH
/// search, so the binary is found even in environments with a limited PATH
/// (e.g., launchers and cron).
pub fn find_ffmpeg() -> Result<PathBuf> {
    let candidates = if cfg!(target_os = "macos") {
        vec![
            PathBuf::from("/opt/homebrew/bin/ffmpeg"),
            PathBuf::from("/usr/local/bin/ffmpeg"),
            PathBuf::from("/usr/bin/ffmpeg"),
        ]
    } else if cfg!(target_os = "linux") {
        vec![
            PathBuf::from("/usr/bin/ffmpeg"),
            PathBuf::from("/usr/local/bin/ffmpeg"),
            PathBuf::from("/snap/bin/ffmpeg"),
        ]
    } else if cfg!(target_os = "windows") {
        vec![
            PathBuf::from("C:\\ffmpeg\\bin\\ffmpeg.exe"),
            PathBuf::from("C:\\Program Files\\ffmpeg\\bin\\ffmpeg.exe"),
        ]
    } else {
        vec![]
    };

    for path in candidates {
        if path.exists() {
            tracing::debug!("Found ffmpeg at: {}", path.display());
            return Ok(path);
        }
    }

    let ffmpeg_path = find_in_path("ffmpeg")?;
    tracing::debug!("Found ffmpeg in PATH at: {}", ffmpeg_path.display());
    Ok(ffmpeg_path)
}

/// Searches for a binary in the system PATH using `which`/`where`.
fn find_in_path(binary_name: &str) -> Result<PathBuf> {
    let search_cmd = if cfg!(target_os = "windows") {
        "where"
    } else {
        "which"
    };

    let output = Command::new(search_cmd)
        .arg(binary_name)
        .output()
        .map_err(|e| anyhow!("Failed to search PATH for {binary_name}: {e}"))?;

    if output.status.success() {
        let path_str = String::from_utf8_lossy(&output.stdout);
        let path = PathBuf::from(path_str.trim());
        if !path.as_os_str().is_empty() {
            return Ok(path);
        }
    }

    Err(anyhow!(
        "ffmpeg not found. Please install ffmpeg:\n\
         macOS: brew install ffmpeg\n\
         Linux: apt install ffmpeg (Debian/Ubuntu) or dnf install ffmpeg (Fedora)\n\
         Windows: Download from https://ffmpeg.org/download.html"
    ))
}

/// Builds the ffmpeg argument list that captures camera+microphone and
/// streams a WebM container to stdout.
///
/// Realtime-tuned VP8/Opus encoding keeps the stream chunk-friendly: the
/// muxer flushes clusters as it goes instead of waiting for a seekable
/// finalize, which is what lets the controller treat stdout reads as
/// ordered segments.
pub fn capture_args(config: &CaptureConfig) -> Vec<String> {
    let size = format!("{}x{}", config.width, config.height);
    let framerate = config.framerate.to_string();

    let mut args: Vec<String> = vec!["-loglevel".into(), "error".into()];

    if cfg!(target_os = "macos") {
        // AVFoundation takes "video:audio" as one combined input.
        args.extend([
            "-f".into(),
            "avfoundation".into(),
            "-framerate".into(),
            framerate,
            "-video_size".into(),
            size,
            "-i".into(),
            format!("{}:{}", config.video_device, config.audio_device),
        ]);
    } else if cfg!(target_os = "windows") {
        args.extend([
            "-f".into(),
            "dshow".into(),
            "-framerate".into(),
            framerate,
            "-video_size".into(),
            size,
            "-i".into(),
            format!(
                "video={}:audio={}",
                config.video_device, config.audio_device
            ),
        ]);
    } else {
        args.extend([
            "-f".into(),
            "v4l2".into(),
            "-framerate".into(),
            framerate,
            "-video_size".into(),
            size,
            "-i".into(),
            config.video_device.clone(),
            "-f".into(),
            "pulse".into(),
            "-i".into(),
            config.audio_device.clone(),
        ]);
    }

    args.extend([
        "-c:v".into(),
        "libvpx".into(),
        "-deadline".into(),
        "realtime".into(),
        "-cpu-used".into(),
        "8".into(),
        "-c:a".into(),
        "libopus".into(),
        "-f".into(),
        "webm".into(),
        "pipe:1".into(),
    ]);

    args
}

/// One capture device reported by the platform.
#[derive(Debug, Clone)]
pub struct CaptureDevice {
    /// Identifier usable as `video_device`/`audio_device` in the config.
    pub id: String,
    pub name: String,
    /// "video" or "audio".
    pub kind: &'static str,
}

/// Enumerates capture devices by running the platform listing command and
/// parsing its output.
///
/// # Errors
/// - If ffmpeg cannot be located or executed
pub fn list_devices() -> Result<Vec<CaptureDevice>> {
    if cfg!(target_os = "linux") {
        return list_devices_linux();
    }

    let ffmpeg = find_ffmpeg()?;
    let (args, split_marker) = if cfg!(target_os = "macos") {
        (
            vec!["-f", "avfoundation", "-list_devices", "true", "-i", ""],
            "audio devices",
        )
    } else {
        (
            vec!["-f", "dshow", "-list_devices", "true", "-i", "dummy"],
            "audio devices",
        )
    };

    // The listing goes to stderr and the command "fails" by design.
    let output = Command::new(&ffmpeg)
        .args(&args)
        .output()
        .map_err(|e| anyhow!("Failed to run ffmpeg device listing: {e}"))?;
    let listing = String::from_utf8_lossy(&output.stderr);

    Ok(parse_device_listing(&listing, split_marker))
}

/// Parses `[index] Name` entries out of an ffmpeg `-list_devices` dump.
/// Lines before the audio marker are video devices, lines after are audio.
fn parse_device_listing(listing: &str, audio_marker: &str) -> Vec<CaptureDevice> {
    let entry = Regex::new(r"\[(\d+)\]\s+(.+?)\s*$").expect("static regex");
    let mut devices = Vec::new();
    let mut kind: &'static str = "video";

    for line in listing.lines() {
        if line.to_lowercase().contains(audio_marker) {
            kind = "audio";
            continue;
        }
        if let Some(caps) = entry.captures(line) {
            devices.push(CaptureDevice {
                id: caps[1].to_string(),
                name: caps[2].to_string(),
                kind,
            });
        }
    }

    devices
}

/// Linux enumeration: scan /dev/video* nodes and name them via sysfs.
fn list_devices_linux() -> Result<Vec<CaptureDevice>> {
    let mut devices = Vec::new();

    let entries = match std::fs::read_dir("/dev") {
        Ok(entries) => entries,
        Err(e) => return Err(anyhow!("Failed to read /dev: {e}")),
    };

    let node = Regex::new(r"^video(\d+)$").expect("static regex");
    for entry in entries.flatten() {
        let file_name = entry.file_name().to_string_lossy().to_string();
        if let Some(caps) = node.captures(&file_name) {
            let index = &caps[1];
            let name = std::fs::read_to_string(format!("/sys/class/video4linux/video{index}/name"))
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|_| "Unknown camera".to_string());
            devices.push(CaptureDevice {
                id: format!("/dev/{file_name}"),
                name,
                kind: "video",
            });
        }
    }
    devices.sort_by(|a, b| a.id.cmp(&b.id));

    // PulseAudio sources are the audio side of a v4l2+pulse capture.
    devices.push(CaptureDevice {
        id: "default".to_string(),
        name: "Default audio source".to_string(),
        kind: "audio",
    });

    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CaptureConfig;

    #[test]
    fn test_capture_args_target_webm_on_stdout() {
        let config = CaptureConfig::default();
        let args = capture_args(&config);
        assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
        assert!(args.iter().any(|a| a == "webm"));
        assert!(args.iter().any(|a| a == "libvpx"));
        assert!(args.iter().any(|a| a == &config.video_device));
    }

    #[test]
    fn test_parse_avfoundation_style_listing() {
        let listing = "\
[AVFoundation indev @ 0x7f8] AVFoundation video devices:
[AVFoundation indev @ 0x7f8] [0] FaceTime HD Camera
[AVFoundation indev @ 0x7f8] [1] Capture screen 0
[AVFoundation indev @ 0x7f8] AVFoundation audio devices:
[AVFoundation indev @ 0x7f8] [0] MacBook Pro Microphone
";
        let devices = parse_device_listing(listing, "audio devices");
        assert_eq!(devices.len(), 3);
        assert_eq!(devices[0].id, "0");
        assert_eq!(devices[0].name, "FaceTime HD Camera");
        assert_eq!(devices[0].kind, "video");
        assert_eq!(devices[2].name, "MacBook Pro Microphone");
        assert_eq!(devices[2].kind, "audio");
    }

    #[test]
    fn test_find_ffmpeg_reports_missing_gracefully() {
        // Succeeds where ffmpeg is installed; the error path is the
        // interesting part elsewhere.
        match find_ffmpeg() {
            Ok(path) => assert!(!path.as_os_str().is_empty()),
            Err(e) => assert!(e.to_string().contains("ffmpeg not found")),
        }
    }
}
