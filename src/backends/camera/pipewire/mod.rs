// SPDX-License-Identifier: GPL-3.0-only

//! PipeWire camera backend
//!
//! Enumerates cameras through `pw-cli` and captures through a GStreamer
//! `pipewiresrc` pipeline.

mod enumeration;
mod pipeline;

pub use enumeration::{PipeWireNode, enumerate_pipewire_cameras, parse_pw_cli_nodes};
pub use pipeline::PipeWirePipeline;

use super::types::*;
use super::{CaptureDevice, CaptureStream};
use crate::constants::pipeline::FRAME_CHANNEL_CAPACITY;
use tracing::{debug, info};

/// PipeWire capture device
#[derive(Debug, Default)]
pub struct PipeWireCamera;

impl PipeWireCamera {
    pub fn new() -> Self {
        Self
    }

    fn resolve_device(&mut self, constraints: &CaptureConstraints) -> BackendResult<CameraDevice> {
        let cameras = self.enumerate();

        if let Some(device) = constraints.select(&cameras) {
            return Ok(device.clone());
        }

        match &constraints.device_path {
            Some(path) if !cameras.is_empty() || !path.starts_with("/dev/video") => {
                Err(BackendError::DeviceNotFound(format!("No camera at '{}'", path)))
            }
            // Unlisted V4L2 node: let PipeWire try it directly
            Some(path) => Ok(CameraDevice {
                name: path.clone(),
                path: path.clone(),
                location: CameraLocation::Unknown,
            }),
            None => {
                info!("No cameras listed, using PipeWire auto-selection");
                Ok(CameraDevice::system_default())
            }
        }
    }
}

impl CaptureDevice for PipeWireCamera {
    fn enumerate(&mut self) -> Vec<CameraDevice> {
        enumerate_pipewire_cameras()
    }

    fn open(&mut self, constraints: &CaptureConstraints) -> BackendResult<Box<dyn CaptureStream>> {
        let device = self.resolve_device(constraints)?;
        info!(
            device = %device.name,
            location = %device.location,
            facing = %constraints.facing,
            "Opening camera"
        );

        let (sender, receiver) = futures::channel::mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let pipeline = PipeWirePipeline::new(&device, sender)?;

        Ok(Box::new(PipeWireStream {
            device,
            pipeline,
            receiver,
        }))
    }
}

/// An open PipeWire camera
pub struct PipeWireStream {
    device: CameraDevice,
    pipeline: PipeWirePipeline,
    receiver: FrameReceiver,
}

impl CaptureStream for PipeWireStream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn latest_frame(&mut self) -> Option<CameraFrame> {
        let mut latest = None;
        let mut drained = 0usize;
        while let Ok(frame) = self.receiver.try_recv() {
            latest = Some(frame);
            drained += 1;
        }
        if drained > 1 {
            debug!(skipped = drained - 1, "Skipped stale frames");
        }
        latest
    }

    fn stop(&mut self) -> BackendResult<()> {
        self.pipeline.stop()
    }
}
