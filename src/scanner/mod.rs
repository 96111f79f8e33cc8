// SPDX-License-Identifier: GPL-3.0-only

//! Scan orchestration: sessions, the controller state machine and the scan loop

mod controller;
mod scan_loop;
mod session;
mod types;

pub use controller::{ScanController, TickOutcome};
pub use scan_loop::{CancelFlag, ScanOutcome, run_until_settled};
pub use session::{FrameSource, Session};
pub use types::{CopyFeedback, ScanMode, ScanResult, UiState};
