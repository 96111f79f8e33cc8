// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for QR decoding with rendered symbols

mod common;

use common::{FakeCamera, HandleCounter, RecordingClipboard};
use qr_scanner::decoder::{DecodeOptions, Decoder, InversionMode, RqrrDecoder};
use qr_scanner::file_input::SelectedFile;
use qr_scanner::scanner::{ScanController, ScanMode, TickOutcome};
use qrcode::QrCode;

/// Quiet zone around the symbol, in modules
const QUIET_ZONE: u32 = 4;

/// Render `text` as a QR symbol: RGBA pixels, side length in pixels, symbol width in modules
fn render_qr(text: &str, module_px: u32, invert: bool) -> (Vec<u8>, u32, u32) {
    let code = QrCode::new(text.as_bytes()).unwrap();
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let size = (modules + 2 * QUIET_ZONE) * module_px;

    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let mx = (x / module_px) as i64 - QUIET_ZONE as i64;
            let my = (y / module_px) as i64 - QUIET_ZONE as i64;
            let in_symbol = mx >= 0 && my >= 0 && mx < modules as i64 && my < modules as i64;
            let dark = in_symbol
                && colors[(my as u32 * modules + mx as u32) as usize] == qrcode::Color::Dark;
            let value = if dark != invert { 0 } else { 255 };
            pixels.extend_from_slice(&[value, value, value, 255]);
        }
    }

    (pixels, size, modules)
}

fn options(inversion: InversionMode) -> DecodeOptions {
    DecodeOptions { inversion }
}

#[test]
fn test_decodes_exact_text() {
    let (pixels, size, _) = render_qr("HELLO", 4, false);
    let decoded = RqrrDecoder::new()
        .decode(&pixels, size, size, &DecodeOptions::scanning())
        .expect("code found");
    assert_eq!(decoded.text, "HELLO");
}

#[test]
fn test_decodes_url_payload() {
    let text = "https://example.org/scan?id=42&lang=en";
    let (pixels, size, _) = render_qr(text, 4, false);
    let decoded = RqrrDecoder::new()
        .decode(&pixels, size, size, &DecodeOptions::scanning())
        .expect("code found");
    assert_eq!(decoded.text, text);
}

#[test]
fn test_position_covers_symbol() {
    let module_px = 6;
    let (pixels, size, modules) = render_qr("position", module_px, false);
    let decoded = RqrrDecoder::new()
        .decode(&pixels, size, size, &DecodeOptions::scanning())
        .expect("code found");

    let (x, y, w, h) = decoded.position.bounding_box();
    let start = (QUIET_ZONE * module_px) as f32;
    let extent = (modules * module_px) as f32;
    let tolerance = 2.0 * module_px as f32;

    assert!((x - start).abs() <= tolerance, "x = {}", x);
    assert!((y - start).abs() <= tolerance, "y = {}", y);
    assert!((w - extent).abs() <= tolerance, "w = {}", w);
    assert!((h - extent).abs() <= tolerance, "h = {}", h);
}

#[test]
fn test_downscaled_frame_maps_position_back() {
    let module_px = 8;
    let (pixels, size, modules) = render_qr("downscaled", module_px, false);
    let decoder = RqrrDecoder::with_max_dimension(size / 2);

    let decoded = decoder
        .decode(&pixels, size, size, &DecodeOptions::scanning())
        .expect("code found");
    assert_eq!(decoded.text, "downscaled");

    let (_, _, w, _) = decoded.position.bounding_box();
    let extent = (modules * module_px) as f32;
    assert!((w - extent).abs() <= 3.0 * module_px as f32, "w = {}", w);
}

#[test]
fn test_inverted_symbol_needs_inversion_pass() {
    let (pixels, size, _) = render_qr("INVERTED", 4, true);
    let decoder = RqrrDecoder::new();

    for inversion in [
        InversionMode::OnlyInvert,
        InversionMode::AttemptBoth,
        InversionMode::InvertFirst,
    ] {
        let decoded = decoder
            .decode(&pixels, size, size, &options(inversion))
            .unwrap_or_else(|| panic!("not found with {:?}", inversion));
        assert_eq!(decoded.text, "INVERTED");
    }
}

#[test]
fn test_dimension_mismatch_yields_nothing() {
    let (pixels, size, _) = render_qr("HELLO", 4, false);
    let decoder = RqrrDecoder::new();
    assert!(
        decoder
            .decode(&pixels, size + 1, size, &DecodeOptions::scanning())
            .is_none()
    );
}

#[test]
fn test_file_scan_end_to_end() {
    let (pixels, size, _) = render_qr("file scan", 4, false);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("code.png");
    image::RgbaImage::from_raw(size, size, pixels)
        .unwrap()
        .save(&path)
        .unwrap();

    let mut controller = ScanController::new(
        Box::new(FakeCamera::new(HandleCounter::default())),
        Box::new(RqrrDecoder::new()),
        Box::new(RecordingClipboard::default()),
    );

    controller.process_file(SelectedFile::from_path(&path)).unwrap();
    assert_eq!(controller.tick(), TickOutcome::Decoded);

    let result = controller.state().result().expect("result shown");
    assert_eq!(result.text, "file scan");
    assert_eq!(result.mode, ScanMode::File);
}
