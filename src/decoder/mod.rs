// SPDX-License-Identifier: GPL-3.0-only

//! QR decoding boundary
//!
//! The scanner treats decoding as an opaque function over an RGBA buffer.
//! [`RqrrDecoder`] is the production implementation.

mod qr_decoder;

pub use qr_decoder::RqrrDecoder;

/// How hard the decoder should look for light-on-dark codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InversionMode {
    /// Only dark-on-light codes. The cheapest mode, used for scanning.
    #[default]
    DontInvert,
    /// Only light-on-dark codes
    OnlyInvert,
    /// Normal first, then inverted
    AttemptBoth,
    /// Inverted first, then normal
    InvertFirst,
}

impl InversionMode {
    /// Passes to run, `true` meaning the luma is inverted
    pub fn passes(&self) -> &'static [bool] {
        match self {
            InversionMode::DontInvert => &[false],
            InversionMode::OnlyInvert => &[true],
            InversionMode::AttemptBoth => &[false, true],
            InversionMode::InvertFirst => &[true, false],
        }
    }
}

/// Options passed with every decode call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeOptions {
    pub inversion: InversionMode,
}

impl DecodeOptions {
    /// What the scan controller always asks for
    pub fn scanning() -> Self {
        Self {
            inversion: InversionMode::DontInvert,
        }
    }
}

/// A point in source frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Corners of a decoded code in the source frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodePosition {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

impl CodePosition {
    /// Axis-aligned bounding box as (x, y, width, height)
    pub fn bounding_box(&self) -> (f32, f32, f32, f32) {
        let corners = [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ];
        let min_x = corners.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
        let max_x = corners.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
        let min_y = corners.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        let max_y = corners.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
        (min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// A successful decode
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub text: String,
    pub position: CodePosition,
}

/// Turns a pixel buffer into decoded text, if it contains a code
pub trait Decoder {
    /// `pixels` is tightly packed RGBA, `width * height * 4` bytes.
    /// Buffers that do not match the dimensions yield `None`.
    fn decode(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        options: &DecodeOptions,
    ) -> Option<Decoded>;
}
