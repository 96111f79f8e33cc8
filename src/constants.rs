// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Application identity, used for config and log paths
pub mod app {
    /// Directory name under the user's config/cache directories
    pub const DIR_NAME: &str = "qr-scanner";

    /// Config file name inside the config directory
    pub const CONFIG_FILE: &str = "config.json";

    /// Log file name used while the terminal UI owns the screen
    pub const LOG_FILE: &str = "qr-scanner.log";
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// How long the copy button shows its confirmation before resetting
    pub const COPY_FEEDBACK_DURATION: Duration = Duration::from_secs(2);

    /// Default display refresh rate driving the scan loop
    pub const DEFAULT_REFRESH_RATE_HZ: u32 = 60;

    /// Upper bound accepted for the refresh rate
    pub const MAX_REFRESH_RATE_HZ: u32 = 240;

    /// Pipeline start timeout (seconds)
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Pipeline stop timeout (seconds)
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// Log frame statistics every N frames
    pub const FRAME_LOG_INTERVAL: u64 = 60;

    /// Convert a refresh rate to the period between two scan ticks
    pub fn refresh_period(rate_hz: u32) -> Duration {
        let rate = rate_hz.clamp(1, MAX_REFRESH_RATE_HZ);
        Duration::from_micros(1_000_000 / rate as u64)
    }
}

/// Capture pipeline constants
pub mod pipeline {
    /// Buffers queued in front of the appsink
    pub const MAX_BUFFERS: u32 = 2;

    /// Capacity of the channel between the capture thread and the scan loop
    pub const FRAME_CHANNEL_CAPACITY: usize = 4;
}

/// Decoder constants
pub mod decoding {
    /// Frames larger than this (either side) are downscaled before decoding
    pub const DEFAULT_MAX_DIMENSION: u32 = 1024;

    /// Smallest max dimension accepted from configuration
    pub const MIN_MAX_DIMENSION: u32 = 160;
}

/// File format constants
pub mod file_formats {
    /// Image extensions offered by the file picker
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff"];

    /// MIME type reported when nothing better is known
    pub const UNKNOWN_MIME: &str = "application/octet-stream";
}
