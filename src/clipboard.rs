// SPDX-License-Identifier: GPL-3.0-only

//! System clipboard access

use crate::errors::ClipboardError;
use tracing::{debug, info, warn};

/// Accepts plain text for the clipboard
pub trait ClipboardSink {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Clipboard of the desktop session, through arboard
///
/// The handle is opened on first use and kept: on X11 the clipboard content
/// lives only as long as the process holding it.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self) -> Result<&mut arboard::Clipboard, ClipboardError> {
        if self.inner.is_none() {
            debug!("Opening system clipboard");
            let clipboard = arboard::Clipboard::new().map_err(|e| {
                warn!(error = %e, "System clipboard unavailable");
                ClipboardError::Unavailable(e.to_string())
            })?;
            self.inner = Some(clipboard);
        }
        self.inner
            .as_mut()
            .ok_or_else(|| ClipboardError::Unavailable("clipboard not initialized".to_string()))
    }
}

impl ClipboardSink for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let clipboard = self.handle()?;
        match clipboard.set_text(text.to_owned()) {
            Ok(()) => {
                info!(len = text.len(), "Copied result to clipboard");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to write clipboard");
                // Reopen next time, the connection may have gone away
                self.inner = None;
                Err(ClipboardError::WriteFailed(e.to_string()))
            }
        }
    }
}
