// SPDX-License-Identifier: GPL-3.0-only

//! PipeWire GStreamer pipeline for camera capture

use super::super::types::*;
use crate::constants::{pipeline, timing};
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// PipeWire camera pipeline
///
/// Converts whatever the camera produces to RGBA and hands frames to the
/// scan loop through a bounded channel. Holding this value holds the camera.
pub struct PipeWirePipeline {
    pipeline: Option<gstreamer::Pipeline>,
    appsink: AppSink,
}

impl PipeWirePipeline {
    /// Create and start a pipeline for `device`
    pub fn new(device: &CameraDevice, frame_sender: FrameSender) -> BackendResult<Self> {
        info!(device = %device.name, path = %device.path, "Creating PipeWire pipeline");

        gstreamer::init().map_err(|e| BackendError::NotAvailable(e.to_string()))?;

        gstreamer::ElementFactory::find("pipewiresrc").ok_or_else(|| {
            BackendError::NotAvailable("pipewiresrc not available: factory not found".to_string())
        })?;

        let description = build_pipeline_string(&determine_pipewire_path(&device.path));
        debug!(pipeline = %description, "Launching pipeline");

        let pipeline = gstreamer::parse::launch(&description)
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?
            .downcast::<gstreamer::Pipeline>()
            .map_err(|_| {
                BackendError::InitializationFailed("Failed to downcast to Pipeline".to_string())
            })?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| BackendError::InitializationFailed("Failed to get appsink".to_string()))?
            .dynamic_cast::<AppSink>()
            .map_err(|_| {
                BackendError::InitializationFailed("Failed to cast appsink".to_string())
            })?;

        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", pipeline::MAX_BUFFERS);
        appsink.set_property("drop", true); // Only the newest frame matters for scanning
        appsink.set_property("enable-last-sample", false);

        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let frame_num = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);

                    let sample = appsink.pull_sample().map_err(|_| gstreamer::FlowError::Eos)?;
                    let buffer = sample.buffer().ok_or(gstreamer::FlowError::Error)?;
                    let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;

                    let video_info = VideoInfo::from_caps(caps).map_err(|e| {
                        if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                            error!(frame = frame_num, error = ?e, "Failed to get video info");
                        }
                        gstreamer::FlowError::Error
                    })?;

                    let map = buffer.map_readable().map_err(|e| {
                        if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                            error!(frame = frame_num, error = ?e, "Failed to map buffer");
                        }
                        gstreamer::FlowError::Error
                    })?;

                    let frame = CameraFrame {
                        width: video_info.width(),
                        height: video_info.height(),
                        data: Arc::from(map.as_slice()),
                        format: PixelFormat::RGBA,
                        stride: video_info.stride()[0] as u32,
                        captured_at: Instant::now(),
                    };

                    // Non-blocking; a full channel means the scan loop is behind
                    let mut sender = frame_sender.clone();
                    if let Err(e) = sender.try_send(frame)
                        && frame_num % timing::FRAME_LOG_INTERVAL == 0
                    {
                        debug!(frame = frame_num, error = ?e, "Frame dropped (channel full)");
                    }

                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        if let Err(e) = pipeline.set_state(gstreamer::State::Playing) {
            release_failed_start(&pipeline);
            return Err(classify_bus_error(&pipeline)
                .unwrap_or_else(|| BackendError::InitializationFailed(e.to_string())));
        }

        let (result, state, _) = pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::START_TIMEOUT_SECS,
        ));
        if let Some(err) = classify_bus_error(&pipeline) {
            release_failed_start(&pipeline);
            return Err(err);
        }
        if result.is_err() {
            release_failed_start(&pipeline);
            return Err(BackendError::InitializationFailed(format!(
                "Pipeline did not start (state {:?})",
                state
            )));
        }

        info!(state = ?state, "PipeWire camera started");

        Ok(Self {
            pipeline: Some(pipeline),
            appsink,
        })
    }

    /// Stop the pipeline and release the camera. Idempotent.
    pub fn stop(&mut self) -> BackendResult<()> {
        let Some(pipeline) = self.pipeline.take() else {
            return Ok(());
        };

        info!("Stopping PipeWire pipeline");

        // Drop the callback so the frame sender is released too
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());

        pipeline
            .set_state(gstreamer::State::Null)
            .map_err(|e| BackendError::Other(format!("Failed to stop pipeline: {}", e)))?;

        let (result, state, _) =
            pipeline.state(gstreamer::ClockTime::from_seconds(timing::STOP_TIMEOUT_SECS));
        match result {
            Ok(_) => info!(state = ?state, "PipeWire pipeline stopped"),
            Err(e) => warn!(error = ?e, state = ?state, "Pipeline state change had issues"),
        }

        Ok(())
    }
}

impl Drop for PipeWirePipeline {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!(error = %e, "Failed to stop pipeline on drop");
        }
    }
}

/// Map the first error on the bus to a backend error
fn classify_bus_error(pipeline: &gstreamer::Pipeline) -> Option<BackendError> {
    let bus = pipeline.bus()?;
    let msg = bus.pop_filtered(&[gstreamer::MessageType::Error])?;
    let gstreamer::MessageView::Error(err) = msg.view() else {
        return None;
    };

    let message = err.error().to_string();
    warn!(error = %message, debug = ?err.debug(), "Pipeline reported an error");

    Some(match err.error().kind::<gstreamer::ResourceError>() {
        Some(gstreamer::ResourceError::NotAuthorized) => BackendError::PermissionDenied(message),
        Some(gstreamer::ResourceError::NotFound) => BackendError::DeviceNotFound(message),
        _ => BackendError::InitializationFailed(message),
    })
}

/// Determine the pipewiresrc property selecting the device
fn determine_pipewire_path(device_path: &str) -> String {
    if device_path.is_empty() {
        // Empty path = PipeWire auto-selects the default camera
        String::new()
    } else if let Some(serial) = device_path.strip_prefix("pipewire-serial-") {
        format!("target-object={} ", serial)
    } else if let Some(node_id) = device_path.strip_prefix("pipewire-") {
        format!("target-object={} ", node_id)
    } else if device_path.starts_with("/dev/video") {
        // V4L2 device exposed through PipeWire
        format!("path=v4l2:{} ", device_path)
    } else {
        warn!(device_path, "Unknown device path format, using path property");
        format!("path={} ", device_path)
    }
}

fn build_pipeline_string(pw_path_prop: &str) -> String {
    format!(
        "pipewiresrc {}do-timestamp=true ! \
         queue max-size-buffers={} leaky=downstream ! \
         videoconvert ! video/x-raw,format=RGBA ! \
         appsink name=sink",
        pw_path_prop,
        pipeline::MAX_BUFFERS
    )
}

/// Tear down a pipeline that failed to start. Returns whether the device was let go.
fn release_failed_start(pipeline: &gstreamer::Pipeline) -> bool {
    match pipeline.set_state(gstreamer::State::Null) {
        Ok(_) => true,
        Err(e) => {
            warn!(error = ?e, "Failed to release pipeline after start failure");
            false
        }
    }
}
