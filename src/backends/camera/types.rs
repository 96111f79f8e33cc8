// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera backends

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

/// Which way the camera should face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// Rear-facing ("environment") camera, the natural choice for scanning
    #[default]
    Back,
    /// Front-facing ("user") camera
    Front,
    /// No preference
    Any,
}

impl std::fmt::Display for Facing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Facing::Back => write!(f, "back"),
            Facing::Front => write!(f, "front"),
            Facing::Any => write!(f, "any"),
        }
    }
}

/// Physical location of a camera, as reported by libcamera or guessed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CameraLocation {
    Back,
    Front,
    External,
    #[default]
    Unknown,
}

impl CameraLocation {
    /// Parse libcamera's location property ("back", "front", "external")
    pub fn from_property(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "back" | "rear" => CameraLocation::Back,
            "front" => CameraLocation::Front,
            "external" => CameraLocation::External,
            _ => CameraLocation::Unknown,
        }
    }

    /// Guess from a device description when no property is available
    pub fn guess_from_name(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("rear") || name.contains("back") || name.contains("world") {
            CameraLocation::Back
        } else if name.contains("front") || name.contains("user") || name.contains("selfie") {
            CameraLocation::Front
        } else {
            CameraLocation::Unknown
        }
    }

    fn matches(&self, facing: Facing) -> bool {
        match facing {
            Facing::Back => *self == CameraLocation::Back,
            Facing::Front => *self == CameraLocation::Front,
            Facing::Any => true,
        }
    }

    fn opposes(&self, facing: Facing) -> bool {
        match facing {
            Facing::Back => *self == CameraLocation::Front,
            Facing::Front => *self == CameraLocation::Back,
            Facing::Any => false,
        }
    }
}

impl std::fmt::Display for CameraLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraLocation::Back => write!(f, "back"),
            CameraLocation::Front => write!(f, "front"),
            CameraLocation::External => write!(f, "external"),
            CameraLocation::Unknown => write!(f, "unknown"),
        }
    }
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    /// Capture path: "pipewire-serial-N", "pipewire-N", "/dev/videoN", or empty for the default
    pub path: String,
    pub location: CameraLocation,
}

impl CameraDevice {
    /// Let PipeWire pick its default camera
    pub fn system_default() -> Self {
        Self {
            name: "Default camera".to_string(),
            path: String::new(),
            location: CameraLocation::Unknown,
        }
    }
}

/// What the caller asks of the capture device
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CaptureConstraints {
    /// Preferred facing; a preference, not a requirement
    pub facing: Facing,
    /// Exact device path; when set it is a requirement
    pub device_path: Option<String>,
}

impl CaptureConstraints {
    pub fn prefer(facing: Facing) -> Self {
        Self {
            facing,
            device_path: None,
        }
    }

    /// Pick a device from `devices`
    ///
    /// An explicit path must match exactly. Otherwise a camera with the preferred
    /// facing wins, then any camera not facing the opposite way, then the first one.
    pub fn select<'a>(&self, devices: &'a [CameraDevice]) -> Option<&'a CameraDevice> {
        if let Some(path) = &self.device_path {
            return devices.iter().find(|d| &d.path == path);
        }

        devices
            .iter()
            .find(|d| d.location.matches(self.facing))
            .or_else(|| devices.iter().find(|d| !d.location.opposes(self.facing)))
            .or_else(|| devices.first())
    }
}

/// Pixel layout of frame data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    RGBA,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::RGBA => 4,
        }
    }
}

/// A single frame, from the camera or from an image file
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    pub format: PixelFormat,
    /// Bytes per row, may include padding
    pub stride: u32,
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Wrap tightly packed RGBA pixels
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            format: PixelFormat::RGBA,
            stride: width * PixelFormat::RGBA.bytes_per_pixel(),
            captured_at: Instant::now(),
        }
    }

    /// Pixels without stride padding, borrowed when already packed
    pub fn packed_rgba(&self) -> Cow<'_, [u8]> {
        let row_bytes = (self.width * self.format.bytes_per_pixel()) as usize;
        let height = self.height as usize;
        let stride = self.stride as usize;

        if stride == row_bytes {
            let len = (row_bytes * height).min(self.data.len());
            return Cow::Borrowed(&self.data[..len]);
        }

        let mut packed = Vec::with_capacity(row_bytes * height);
        for y in 0..height {
            let row_start = y * stride;
            let row_end = row_start + row_bytes;
            if row_end <= self.data.len() {
                packed.extend_from_slice(&self.data[row_start..row_end]);
            }
        }
        Cow::Owned(packed)
    }

    /// RGB of the pixel at (x, y), clamped to the frame
    pub fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if self.width == 0 || self.height == 0 {
            return (0, 0, 0);
        }
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let idx = (y * self.stride + x * self.format.bytes_per_pixel()) as usize;
        match self.data.get(idx..idx + 3) {
            Some(px) => (px[0], px[1], px[2]),
            None => (0, 0, 0),
        }
    }
}

/// Frame receiver type for preview streams
pub type FrameReceiver = futures::channel::mpsc::Receiver<CameraFrame>;

/// Frame sender type for preview streams
pub type FrameSender = futures::channel::mpsc::Sender<CameraFrame>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// Camera device not found
    DeviceNotFound(String),
    /// Access to the camera was refused
    PermissionDenied(String),
    /// Failed to start the capture pipeline
    InitializationFailed(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}
