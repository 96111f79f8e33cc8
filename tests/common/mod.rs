// SPDX-License-Identifier: GPL-3.0-only

//! In-memory stand-ins for the camera, decoder and clipboard

#![allow(dead_code)]

use qr_scanner::backends::camera::{
    BackendError, BackendResult, CameraDevice, CameraFrame, CameraLocation, CaptureConstraints,
    CaptureDevice, CaptureStream,
};
use qr_scanner::clipboard::ClipboardSink;
use qr_scanner::decoder::{CodePosition, DecodeOptions, Decoded, Decoder, Point};
use qr_scanner::errors::ClipboardError;
use qr_scanner::scanner::ScanController;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Counts open capture handles across all streams of a fake camera
#[derive(Clone, Default)]
pub struct HandleCounter {
    open: Rc<Cell<usize>>,
    opened_total: Rc<Cell<usize>>,
    max_open: Rc<Cell<usize>>,
}

impl HandleCounter {
    pub fn open(&self) -> usize {
        self.open.get()
    }

    pub fn opened_total(&self) -> usize {
        self.opened_total.get()
    }

    pub fn max_open(&self) -> usize {
        self.max_open.get()
    }

    fn acquire(&self) {
        self.open.set(self.open.get() + 1);
        self.opened_total.set(self.opened_total.get() + 1);
        self.max_open.set(self.max_open.get().max(self.open.get()));
    }

    fn release(&self) {
        self.open.set(self.open.get() - 1);
    }
}

pub struct FakeCamera {
    pub handles: HandleCounter,
    pub failure: Option<BackendError>,
    /// Streams never deliver a frame
    pub silent: bool,
}

impl FakeCamera {
    pub fn new(handles: HandleCounter) -> Self {
        Self {
            handles,
            failure: None,
            silent: false,
        }
    }

    pub fn failing(handles: HandleCounter, failure: BackendError) -> Self {
        Self {
            failure: Some(failure),
            ..Self::new(handles)
        }
    }

    pub fn silent(handles: HandleCounter) -> Self {
        Self {
            silent: true,
            ..Self::new(handles)
        }
    }
}

impl CaptureDevice for FakeCamera {
    fn enumerate(&mut self) -> Vec<CameraDevice> {
        vec![CameraDevice {
            name: "Fake Camera".into(),
            path: "pipewire-serial-1".into(),
            location: CameraLocation::Back,
        }]
    }

    fn open(&mut self, _: &CaptureConstraints) -> BackendResult<Box<dyn CaptureStream>> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        self.handles.acquire();
        Ok(Box::new(FakeStream {
            device: self.enumerate().remove(0),
            handles: self.handles.clone(),
            open: true,
            silent: self.silent,
        }))
    }
}

struct FakeStream {
    device: CameraDevice,
    handles: HandleCounter,
    open: bool,
    silent: bool,
}

impl CaptureStream for FakeStream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn latest_frame(&mut self) -> Option<CameraFrame> {
        (self.open && !self.silent)
            .then(|| CameraFrame::from_rgba(4, 4, vec![128; 4 * 4 * 4]))
    }

    fn stop(&mut self) -> BackendResult<()> {
        if self.open {
            self.open = false;
            self.handles.release();
        }
        Ok(())
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Returns scripted results in order, then `None` forever
#[derive(Clone, Default)]
pub struct ScriptedDecoder {
    script: Rc<RefCell<VecDeque<Option<String>>>>,
    calls: Rc<Cell<usize>>,
}

impl ScriptedDecoder {
    pub fn new<I, S>(script: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            script: Rc::new(RefCell::new(
                script.into_iter().map(|s| s.map(Into::into)).collect(),
            )),
            calls: Rc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Decoder for ScriptedDecoder {
    fn decode(&self, pixels: &[u8], width: u32, height: u32, _: &DecodeOptions) -> Option<Decoded> {
        assert_eq!(pixels.len(), (width * height * 4) as usize);
        self.calls.set(self.calls.get() + 1);
        let text = self.script.borrow_mut().pop_front().flatten()?;
        Some(Decoded {
            text,
            position: CodePosition {
                top_left: Point { x: 0.0, y: 0.0 },
                top_right: Point { x: 3.0, y: 0.0 },
                bottom_right: Point { x: 3.0, y: 3.0 },
                bottom_left: Point { x: 0.0, y: 3.0 },
            },
        })
    }
}

/// Records written text, or refuses every write
#[derive(Clone, Default)]
pub struct RecordingClipboard {
    pub written: Rc<RefCell<Vec<String>>>,
    pub fail: bool,
}

impl ClipboardSink for RecordingClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.fail {
            return Err(ClipboardError::WriteFailed("permission denied".into()));
        }
        self.written.borrow_mut().push(text.to_string());
        Ok(())
    }
}

/// Controller over fakes, with handles to inspect them
pub struct Harness {
    pub controller: ScanController,
    pub handles: HandleCounter,
    pub decoder: ScriptedDecoder,
    pub clipboard: RecordingClipboard,
}

impl Harness {
    pub fn new(decoder: ScriptedDecoder) -> Self {
        Self::with_clipboard(decoder, RecordingClipboard::default())
    }

    pub fn with_clipboard(decoder: ScriptedDecoder, clipboard: RecordingClipboard) -> Self {
        let handles = HandleCounter::default();
        let controller = ScanController::new(
            Box::new(FakeCamera::new(handles.clone())),
            Box::new(decoder.clone()),
            Box::new(clipboard.clone()),
        );
        Self {
            controller,
            handles,
            decoder,
            clipboard,
        }
    }
}

/// Write a small valid PNG and return its path
pub fn write_png(dir: &std::path::Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    image::RgbaImage::from_pixel(8, 8, image::Rgba([255, 255, 255, 255]))
        .save(&path)
        .unwrap();
    path
}
