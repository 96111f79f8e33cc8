// SPDX-License-Identifier: GPL-3.0-only

//! Scan controller state machine
//!
//! ```text
//!            start_camera            tick: decoded
//!   Idle ───────────────▶ Scanning ─────────────────▶ ResultShown
//!    ▲   process_file        │   tick: file not found       │
//!    │                       ├──────────────────────▶ ErrorShown
//!    │  stop_camera/switch_tab                              │
//!    ◀───────────────────────┘                              │
//!    ◀─────────────── clear / retry / new scan ─────────────┘
//! ```
//!
//! The controller owns at most one [`Session`], and with it at most one open
//! capture handle. Every path that leaves a scanning state or starts a new
//! scan releases the previous session first.

use super::session::Session;
use super::types::{CopyFeedback, ScanMode, ScanResult, UiState};
use crate::backends::camera::{CameraDevice, CameraFrame, CaptureConstraints, CaptureDevice};
use crate::clipboard::ClipboardSink;
use crate::decoder::{DecodeOptions, Decoded, Decoder};
use crate::errors::{InvalidInputError, ScanError, ScanResultOf};
use crate::file_input::{self, SelectedFile};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No active session
    Inactive,
    /// Camera session, but no new frame since the last tick
    Waiting,
    /// A frame was decoded without finding a code
    Missed,
    /// A code was found, the result is shown
    Decoded,
    /// The file contained no code, the error is shown
    Failed,
}

/// Drives camera and file scans and the result/error panels
pub struct ScanController {
    device: Box<dyn CaptureDevice>,
    decoder: Box<dyn Decoder>,
    clipboard: Box<dyn ClipboardSink>,
    constraints: CaptureConstraints,
    options: DecodeOptions,
    session: Option<Session>,
    state: UiState,
    active_tab: ScanMode,
    selected_file: Option<SelectedFile>,
    camera_preview: Option<CameraFrame>,
    file_preview: Option<CameraFrame>,
    copy_feedback: CopyFeedback,
    frames_decoded: u64,
}

impl ScanController {
    pub fn new(
        device: Box<dyn CaptureDevice>,
        decoder: Box<dyn Decoder>,
        clipboard: Box<dyn ClipboardSink>,
    ) -> Self {
        Self {
            device,
            decoder,
            clipboard,
            constraints: CaptureConstraints::default(),
            options: DecodeOptions::scanning(),
            session: None,
            state: UiState::Idle,
            active_tab: ScanMode::Camera,
            selected_file: None,
            camera_preview: None,
            file_preview: None,
            copy_feedback: CopyFeedback::default(),
            frames_decoded: 0,
        }
    }

    pub fn with_constraints(mut self, constraints: CaptureConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn active_tab(&self) -> ScanMode {
        self.active_tab
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_ref()
    }

    pub fn constraints(&self) -> &CaptureConstraints {
        &self.constraints
    }

    /// Preview for the active tab: the last camera frame or the loaded image
    pub fn preview(&self) -> Option<&CameraFrame> {
        match self.active_tab {
            ScanMode::Camera => self.camera_preview.as_ref(),
            ScanMode::File => self.file_preview.as_ref(),
        }
    }

    /// Whether a capture handle is currently held
    pub fn is_camera_open(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.mode() == ScanMode::Camera && s.is_active())
    }

    pub fn copy_label(&self, now: Instant) -> &'static str {
        self.copy_feedback.label(now)
    }

    pub fn is_copy_enabled(&self, now: Instant) -> bool {
        self.state.result().is_some() && !self.copy_feedback.is_active(now)
    }

    /// Cameras the capture device can open
    pub fn cameras(&mut self) -> Vec<CameraDevice> {
        self.device.enumerate()
    }

    /// Acquire the camera and start scanning
    ///
    /// A new scan clears any shown result or error and releases the previous
    /// session before the device is opened.
    pub fn start_camera(&mut self) -> ScanResultOf<()> {
        self.hide_panels();
        self.end_session();
        self.camera_preview = None;
        self.active_tab = ScanMode::Camera;

        match self.device.open(&self.constraints) {
            Ok(stream) => {
                self.session = Some(Session::camera(stream));
                self.state = UiState::Scanning(ScanMode::Camera);
                self.frames_decoded = 0;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to open camera");
                self.show_error(ScanError::from(e))
            }
        }
    }

    /// Cancel a camera scan and release the device
    ///
    /// Safe to call in any state. Only a camera scan moves back to Idle; a
    /// shown result or error stays visible.
    pub fn stop_camera(&mut self) {
        if self
            .session
            .as_ref()
            .is_some_and(|s| s.mode() == ScanMode::Camera)
        {
            info!(frames = self.frames_decoded, "Stopping camera scan");
            self.end_session();
        }
        self.camera_preview = None;

        if self.state == UiState::Scanning(ScanMode::Camera) {
            self.state = UiState::Idle;
        }
    }

    /// Validate and load a file, then queue its single decode attempt
    ///
    /// A file that is not an image goes straight to the error panel without
    /// entering Scanning.
    pub fn process_file(&mut self, file: SelectedFile) -> ScanResultOf<()> {
        self.hide_panels();
        self.end_session();
        self.camera_preview = None;
        self.file_preview = None;
        self.active_tab = ScanMode::File;

        let name = file.name();
        info!(file = %name, mime = %file.mime, "Processing file");
        self.selected_file = Some(file.clone());

        if !file.is_image() {
            warn!(file = %name, mime = %file.mime, "Rejected non-image file");
            return self.show_error(
                InvalidInputError::NotAnImage {
                    name,
                    mime: file.mime,
                }
                .into(),
            );
        }

        let frame = match file_input::load_frame(&file.path) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(file = %name, error = %e, "Failed to load image");
                return self.show_error(
                    InvalidInputError::Unreadable {
                        name,
                        reason: e.to_string(),
                    }
                    .into(),
                );
            }
        };

        self.file_preview = Some(frame.clone());
        self.session = Some(Session::file(frame));
        self.state = UiState::Scanning(ScanMode::File);
        Ok(())
    }

    /// One refresh tick: sample a frame and decode it
    ///
    /// Camera scans retry on every tick until a code is found or the scan is
    /// stopped. File scans decode exactly once.
    pub fn tick(&mut self) -> TickOutcome {
        let Some(session) = self.session.as_mut().filter(|s| s.is_active()) else {
            return TickOutcome::Inactive;
        };
        let mode = session.mode();

        let Some(frame) = session.sample() else {
            return TickOutcome::Waiting;
        };

        let decoded = {
            let pixels = frame.packed_rgba();
            self.decoder
                .decode(&pixels, frame.width, frame.height, &self.options)
        };
        self.frames_decoded += 1;

        match (mode, decoded) {
            (ScanMode::Camera, decoded) => {
                self.camera_preview = Some(frame);
                match decoded {
                    Some(decoded) => {
                        self.show_result(decoded, mode);
                        TickOutcome::Decoded
                    }
                    None => {
                        debug!(frames = self.frames_decoded, "No code in camera frame");
                        TickOutcome::Missed
                    }
                }
            }
            (ScanMode::File, Some(decoded)) => {
                self.show_result(decoded, mode);
                TickOutcome::Decoded
            }
            (ScanMode::File, None) => {
                info!("No code found in file");
                self.end_session();
                self.state = UiState::ErrorShown(ScanError::DecodeNotFound);
                TickOutcome::Failed
            }
        }
    }

    /// Select a tab. Always releases the camera, even for the current tab.
    pub fn switch_tab(&mut self, tab: ScanMode) {
        debug!(from = %self.active_tab, to = %tab, "Switching tab");
        self.active_tab = tab;
        self.stop_camera();
    }

    /// Back to Idle: panels hidden, file input reset, camera released
    pub fn clear(&mut self) {
        self.stop_camera();
        self.end_session();
        self.file_preview = None;
        self.selected_file = None;
        self.hide_panels();
    }

    /// Dismiss the error panel
    pub fn retry(&mut self) {
        if self.state.error().is_some() {
            self.state = UiState::Idle;
        }
    }

    /// End whatever scan is running, camera or file
    pub fn cancel(&mut self) {
        self.end_session();
        self.camera_preview = None;
        if self.state.is_scanning() {
            self.state = UiState::Idle;
        }
    }

    /// Copy the shown result to the clipboard
    ///
    /// Ignored while nothing is shown or the previous copy is still being
    /// confirmed. A clipboard failure replaces the result with an error.
    pub fn copy_result(&mut self, now: Instant) -> ScanResultOf<()> {
        if !self.is_copy_enabled(now) {
            return Ok(());
        }
        let Some(result) = self.state.result() else {
            return Ok(());
        };

        match self.clipboard.write_text(&result.text) {
            Ok(()) => {
                self.copy_feedback.start(now);
                Ok(())
            }
            Err(e) => self.show_error(e.into()),
        }
    }

    /// Reset the copy confirmation once its delay has passed
    pub fn refresh_copy_feedback(&mut self, now: Instant) -> bool {
        self.copy_feedback.refresh(now)
    }

    fn show_result(&mut self, decoded: Decoded, mode: ScanMode) {
        self.end_session();
        info!(
            mode = %mode,
            len = decoded.text.len(),
            frames = self.frames_decoded,
            "QR code found"
        );
        self.state = UiState::ResultShown(ScanResult::new(
            decoded.text,
            mode,
            Some(decoded.position),
        ));
    }

    fn show_error(&mut self, err: ScanError) -> ScanResultOf<()> {
        self.end_session();
        self.state = UiState::ErrorShown(err.clone());
        Err(err)
    }

    fn hide_panels(&mut self) {
        self.state = UiState::Idle;
        self.copy_feedback.reset();
    }

    fn end_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.release();
        }
    }
}

impl Drop for ScanController {
    fn drop(&mut self) {
        self.end_session();
    }
}
