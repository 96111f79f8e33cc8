// SPDX-License-Identifier: GPL-3.0-only

//! Scanner state types

use crate::constants::timing;
use crate::decoder::CodePosition;
use crate::errors::ScanError;
use chrono::{DateTime, Local};
use std::fmt;
use std::time::Instant;

/// Where frames come from. Also names the two UI tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    #[default]
    Camera,
    File,
}

impl ScanMode {
    pub const ALL: [ScanMode; 2] = [ScanMode::Camera, ScanMode::File];

    pub fn title(&self) -> &'static str {
        match self {
            ScanMode::Camera => "Camera",
            ScanMode::File => "File",
        }
    }

    /// The other tab
    pub fn toggled(&self) -> Self {
        match self {
            ScanMode::Camera => ScanMode::File,
            ScanMode::File => ScanMode::Camera,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            ScanMode::Camera => 0,
            ScanMode::File => 1,
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A decoded code, immutable once produced
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    pub text: String,
    pub mode: ScanMode,
    /// Corners in the source frame, when the decoder reported them
    pub position: Option<CodePosition>,
    pub scanned_at: DateTime<Local>,
}

impl ScanResult {
    pub fn new(text: String, mode: ScanMode, position: Option<CodePosition>) -> Self {
        Self {
            text,
            mode,
            position,
            scanned_at: Local::now(),
        }
    }
}

/// What the user is looking at. Exactly one variant holds at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum UiState {
    #[default]
    Idle,
    Scanning(ScanMode),
    ResultShown(ScanResult),
    ErrorShown(ScanError),
}

impl UiState {
    pub fn is_scanning(&self) -> bool {
        matches!(self, UiState::Scanning(_))
    }

    /// Result panel visibility
    pub fn result(&self) -> Option<&ScanResult> {
        match self {
            UiState::ResultShown(result) => Some(result),
            _ => None,
        }
    }

    /// Error panel visibility
    pub fn error(&self) -> Option<&ScanError> {
        match self {
            UiState::ErrorShown(error) => Some(error),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UiState::Idle => "Idle",
            UiState::Scanning(ScanMode::Camera) => "Scanning (camera)",
            UiState::Scanning(ScanMode::File) => "Scanning (file)",
            UiState::ResultShown(_) => "Result",
            UiState::ErrorShown(_) => "Error",
        }
    }
}

/// Copy button confirmation, reset after a fixed delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CopyFeedback {
    copied_at: Option<Instant>,
}

impl CopyFeedback {
    pub fn start(&mut self, now: Instant) {
        self.copied_at = Some(now);
    }

    pub fn reset(&mut self) {
        self.copied_at = None;
    }

    /// While active the button reads "Copied!" and ignores presses
    pub fn is_active(&self, now: Instant) -> bool {
        self.copied_at
            .is_some_and(|at| now.saturating_duration_since(at) < timing::COPY_FEEDBACK_DURATION)
    }

    /// Clear an expired confirmation. Returns true when it changed.
    pub fn refresh(&mut self, now: Instant) -> bool {
        if self.copied_at.is_some() && !self.is_active(now) {
            self.copied_at = None;
            return true;
        }
        false
    }

    pub fn label(&self, now: Instant) -> &'static str {
        if self.is_active(now) { "Copied!" } else { "Copy" }
    }
}
