// SPDX-License-Identifier: GPL-3.0-only

//! QR Scanner - scan QR codes from a live camera feed or an image file
//!
//! The crate is organized into several modules:
//!
//! - [`scanner`]: Scan controller state machine, sessions and the scan loop
//! - [`backends`]: Camera capture abstraction and the PipeWire backend
//! - [`decoder`]: QR decoding boundary and the rqrr implementation
//! - [`file_input`]: File selection, drag-and-drop paths and image loading
//! - [`clipboard`]: System clipboard access
//! - [`config`]: User configuration handling
//! - [`terminal`]: Terminal UI
//!
//! # Example
//!
//! ```ignore
//! let mut controller = ScanController::new(
//!     Box::new(PipeWireCamera::new()),
//!     Box::new(RqrrDecoder::new()),
//!     Box::new(SystemClipboard::new()),
//! );
//! controller.process_file(SelectedFile::from_path("code.png"))?;
//! controller.tick();
//! ```

pub mod backends;
pub mod clipboard;
pub mod config;
pub mod constants;
pub mod decoder;
pub mod errors;
pub mod file_input;
pub mod scanner;
pub mod terminal;

// Re-export commonly used types
pub use config::Config;
pub use errors::ScanError;
pub use scanner::{ScanController, ScanMode, ScanResult, UiState};
