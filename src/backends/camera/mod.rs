// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! The scanner only needs two things from a camera: open a stream that
//! honours some [`CaptureConstraints`], and pull the newest frame from it.
//!
//! ```text
//! ┌─────────────────────┐
//! │   ScanController    │
//! └──────────┬──────────┘
//!            │ open / latest_frame / stop
//!            ▼
//! ┌─────────────────────┐
//! │ CaptureDevice trait │
//! └──────────┬──────────┘
//!            ▼
//!       ┌────────┐
//!       │PipeWire│  ← GStreamer pipewiresrc pipeline
//!       └────────┘
//! ```

pub mod pipewire;
pub mod types;

pub use pipewire::PipeWireCamera;
pub use types::*;

/// A source of camera streams
///
/// Implementations must not keep a device open on their own: every open
/// handle belongs to the [`CaptureStream`] returned by [`CaptureDevice::open`].
pub trait CaptureDevice {
    /// List the cameras this backend can open
    fn enumerate(&mut self) -> Vec<CameraDevice>;

    /// Acquire a camera and start streaming
    ///
    /// # Returns
    /// * `Ok(stream)` - The camera is open and producing frames
    /// * `Err(BackendError::PermissionDenied)` - Access was refused
    /// * `Err(BackendError::DeviceNotFound)` - No camera matched
    /// * `Err(BackendError)` - Any other start failure
    fn open(&mut self, constraints: &CaptureConstraints) -> BackendResult<Box<dyn CaptureStream>>;
}

/// An open camera
pub trait CaptureStream {
    /// The device behind this stream
    fn device(&self) -> &CameraDevice;

    /// Newest frame delivered since the last call, dropping older ones
    fn latest_frame(&mut self) -> Option<CameraFrame>;

    /// Release the device. Calling it again is a no-op.
    fn stop(&mut self) -> BackendResult<()>;
}
