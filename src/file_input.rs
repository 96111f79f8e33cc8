// SPDX-License-Identifier: GPL-3.0-only

//! File input surface
//!
//! Files reach the scanner three ways: the file picker dialog, a typed path,
//! or a terminal drag-and-drop, which arrives as pasted text. Each becomes a
//! [`SelectedFile`] whose MIME type decides whether it is scanned at all.

use crate::backends::camera::CameraFrame;
use crate::constants::file_formats;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A file chosen by the user, not yet validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub mime: String,
}

impl SelectedFile {
    /// Derive the MIME type from the file extension
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mime = mime_for_path(&path);
        Self { path, mime }
    }

    /// Use a MIME type supplied by the caller
    pub fn with_mime(path: impl Into<PathBuf>, mime: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mime: mime.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }

    /// File name for messages
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// MIME type of a path, judged by its extension
pub fn mime_for_path(path: &Path) -> String {
    if let Ok(format) = ImageFormat::from_path(path) {
        return format.to_mime_type().to_string();
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "txt" | "log" | "md" => "text/plain",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => file_formats::UNKNOWN_MIME,
    }
    .to_string()
}

/// Load an image file as an RGBA frame
pub fn load_frame(path: &Path) -> Result<CameraFrame, image::ImageError> {
    info!(path = %path.display(), "Loading image file");

    let rgba = image::open(path)?.to_rgba8();
    let (width, height) = rgba.dimensions();

    info!(width, height, "Image loaded successfully");
    Ok(CameraFrame::from_rgba(width, height, rgba.into_raw()))
}

/// Turn pasted text into a path
///
/// Terminals paste dropped files as plain paths, quoted paths, paths with
/// backslash-escaped spaces, or `file://` URIs. Only the first line counts:
/// when several files are dropped the first one is used.
pub fn parse_dropped_path(text: &str) -> Option<PathBuf> {
    let first = text.lines().map(str::trim).find(|line| !line.is_empty())?;

    let unquoted = strip_matching_quotes(first);

    if let Some(uri_path) = unquoted.strip_prefix("file://") {
        // file://host/path is not supported, only file:///path and file://localhost/path
        let uri_path = uri_path.strip_prefix("localhost").unwrap_or(uri_path);
        if !uri_path.starts_with('/') {
            debug!(text = %first, "Ignoring file URI with a remote host");
            return None;
        }
        return Some(PathBuf::from(percent_decode(uri_path)));
    }

    Some(PathBuf::from(unescape_spaces(unquoted)))
}

fn strip_matching_quotes(s: &str) -> &str {
    for quote in ['\'', '"'] {
        if s.len() >= 2
            && let Some(inner) = s.strip_prefix(quote).and_then(|s| s.strip_suffix(quote))
        {
            return inner;
        }
    }
    s
}

fn unescape_spaces(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\'
            && let Some(&next) = chars.peek()
            && matches!(next, ' ' | '\'' | '"' | '(' | ')' | '&' | '\\')
        {
            result.push(next);
            chars.next();
        } else {
            result.push(c);
        }
    }
    result
}

/// Decode %XX escapes, keeping malformed escapes as-is
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && let Some(hex) = s.get(i + 1..i + 3)
            && let Ok(byte) = u8::from_str_radix(hex, 16)
        {
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8_lossy(&result).into_owned()
}

/// Ask the desktop for an image file
///
/// Blocks until the dialog closes. `None` when the user cancels.
pub fn pick_file(start_dir: Option<&Path>) -> Option<SelectedFile> {
    let mut dialog = rfd::FileDialog::new()
        .set_title("Select an image containing a QR code")
        .add_filter("Images", file_formats::IMAGE_EXTENSIONS);

    if let Some(dir) = start_dir {
        dialog = dialog.set_directory(dir);
    }

    let path = dialog.pick_file()?;
    info!(path = %path.display(), "File picked");
    Some(SelectedFile::from_path(path))
}
