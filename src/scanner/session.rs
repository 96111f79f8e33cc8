// SPDX-License-Identifier: GPL-3.0-only

//! One scan attempt and the frame source it owns

use super::types::ScanMode;
use crate::backends::camera::{CameraFrame, CaptureStream};
use tracing::{info, warn};

/// Live camera stream or a single loaded image
pub enum FrameSource {
    Camera(Box<dyn CaptureStream>),
    Image(CameraFrame),
}

/// A scan attempt
///
/// Owns its frame source exclusively. Releasing the session stops the
/// capture stream immediately; dropping it does the same.
pub struct Session {
    mode: ScanMode,
    active: bool,
    source: FrameSource,
}

impl Session {
    pub fn camera(stream: Box<dyn CaptureStream>) -> Self {
        info!(device = %stream.device().name, "Camera session started");
        Self {
            mode: ScanMode::Camera,
            active: true,
            source: FrameSource::Camera(stream),
        }
    }

    pub fn file(image: CameraFrame) -> Self {
        info!(width = image.width, height = image.height, "File session started");
        Self {
            mode: ScanMode::File,
            active: true,
            source: FrameSource::Image(image),
        }
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Next frame to decode. `None` when inactive or no new camera frame arrived.
    pub fn sample(&mut self) -> Option<CameraFrame> {
        if !self.active {
            return None;
        }
        match &mut self.source {
            FrameSource::Camera(stream) => stream.latest_frame(),
            // Frame data is shared, the clone does not copy pixels
            FrameSource::Image(image) => Some(image.clone()),
        }
    }

    /// Deactivate and release the capture device. Idempotent.
    pub fn release(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;

        if let FrameSource::Camera(stream) = &mut self.source {
            let device = stream.device().name.clone();
            match stream.stop() {
                Ok(()) => info!(device = %device, "Camera released"),
                Err(e) => warn!(device = %device, error = %e, "Failed to stop camera cleanly"),
            }
        } else {
            info!(mode = %self.mode, "Session ended");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.release();
    }
}
