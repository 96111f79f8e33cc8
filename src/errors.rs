// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scanner
//!
//! Every error here is recoverable: the controller turns it into a message
//! for the error panel and stays in a state from which Idle is reachable.

use crate::backends::camera::BackendError;
use std::fmt;

/// Result type alias using ScanError
pub type ScanResultOf<T> = Result<T, ScanError>;

/// Top-level error surfaced to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// Camera unavailable, busy or access denied
    Device(DeviceError),
    /// The provided file is not a usable image
    InvalidInput(InvalidInputError),
    /// The decoder ran but found no code. A normal negative result.
    DecodeNotFound,
    /// Writing to the system clipboard failed
    Clipboard(ClipboardError),
}

/// Camera acquisition errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// No camera matched the request
    NoCameraFound,
    /// The user or the sandbox refused camera access
    PermissionDenied(String),
    /// The camera exists but could not be started
    Unavailable(String),
}

/// File input errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidInputError {
    /// The file's MIME type is not `image/*`
    NotAnImage { name: String, mime: String },
    /// The file claims to be an image but could not be read or decoded
    Unreadable { name: String, reason: String },
}

/// Clipboard errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    /// No clipboard could be opened (no display server, no permission)
    Unavailable(String),
    /// The clipboard refused the text
    WriteFailed(String),
}

impl ScanError {
    /// Message shown in the error panel
    pub fn user_message(&self) -> &'static str {
        match self {
            ScanError::Device(_) => "Unable to access the camera. Please check permissions.",
            ScanError::InvalidInput(_) => "Invalid image. Please select a valid image file.",
            ScanError::DecodeNotFound => {
                "No QR code found in this image. Please try with another image."
            }
            ScanError::Clipboard(_) => "Unable to copy the result. Please copy it manually.",
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Device(e) => write!(f, "Camera error: {}", e),
            ScanError::InvalidInput(e) => write!(f, "Invalid input: {}", e),
            ScanError::DecodeNotFound => write!(f, "No QR code found"),
            ScanError::Clipboard(e) => write!(f, "Clipboard error: {}", e),
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::NoCameraFound => write!(f, "No camera devices found"),
            DeviceError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            DeviceError::Unavailable(msg) => write!(f, "Camera unavailable: {}", msg),
        }
    }
}

impl fmt::Display for InvalidInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidInputError::NotAnImage { name, mime } => {
                write!(f, "'{}' is not an image ({})", name, mime)
            }
            InvalidInputError::Unreadable { name, reason } => {
                write!(f, "Failed to read image '{}': {}", name, reason)
            }
        }
    }
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipboardError::Unavailable(msg) => write!(f, "Clipboard unavailable: {}", msg),
            ClipboardError::WriteFailed(msg) => write!(f, "Failed to write clipboard: {}", msg),
        }
    }
}

impl std::error::Error for ScanError {}
impl std::error::Error for DeviceError {}
impl std::error::Error for InvalidInputError {}
impl std::error::Error for ClipboardError {}

impl From<DeviceError> for ScanError {
    fn from(err: DeviceError) -> Self {
        ScanError::Device(err)
    }
}

impl From<InvalidInputError> for ScanError {
    fn from(err: InvalidInputError) -> Self {
        ScanError::InvalidInput(err)
    }
}

impl From<ClipboardError> for ScanError {
    fn from(err: ClipboardError) -> Self {
        ScanError::Clipboard(err)
    }
}

impl From<BackendError> for DeviceError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::DeviceNotFound(_) => DeviceError::NoCameraFound,
            BackendError::PermissionDenied(msg) => DeviceError::PermissionDenied(msg),
            other => DeviceError::Unavailable(other.to_string()),
        }
    }
}

impl From<BackendError> for ScanError {
    fn from(err: BackendError) -> Self {
        ScanError::Device(err.into())
    }
}
