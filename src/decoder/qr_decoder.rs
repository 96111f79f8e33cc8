// SPDX-License-Identifier: GPL-3.0-only

//! QR decoding with the rqrr crate
//!
//! Frames are converted to luma, downscaled when larger than the configured
//! maximum, and handed to rqrr. Corner positions are mapped back to the
//! source frame's pixel coordinates.

use super::{CodePosition, DecodeOptions, Decoded, Decoder, Point};
use crate::constants::decoding;
use tracing::{debug, trace};

/// QR decoder backed by rqrr
#[derive(Debug, Clone)]
pub struct RqrrDecoder {
    /// Maximum dimension for processing (frames are downscaled to this)
    max_dimension: u32,
}

impl Default for RqrrDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RqrrDecoder {
    pub fn new() -> Self {
        Self {
            max_dimension: decoding::DEFAULT_MAX_DIMENSION,
        }
    }

    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(decoding::MIN_MAX_DIMENSION),
        }
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }
}

impl Decoder for RqrrDecoder {
    fn decode(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        options: &DecodeOptions,
    ) -> Option<Decoded> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            debug!(
                width,
                height,
                len = pixels.len(),
                expected,
                "Pixel buffer does not match dimensions"
            );
            return None;
        }

        let start = std::time::Instant::now();
        let image = LumaImage::from_rgba(pixels, width, height).fit_within(self.max_dimension);

        trace!(
            width = image.width,
            height = image.height,
            scale = image.scale,
            prepare_ms = start.elapsed().as_millis(),
            "Prepared luma image"
        );

        let decoded = options
            .inversion
            .passes()
            .iter()
            .find_map(|&invert| decode_luma(&image, invert));

        trace!(
            found = decoded.is_some(),
            total_ms = start.elapsed().as_millis(),
            "QR decode pass complete"
        );

        decoded
    }
}

/// 8-bit luma plane plus the factor that maps it back to the source frame
struct LumaImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
    /// Source pixels per luma pixel
    scale: f32,
}

impl LumaImage {
    /// BT.601 luma, integer weights
    fn from_rgba(pixels: &[u8], width: u32, height: u32) -> Self {
        let data = pixels
            .chunks_exact(4)
            .map(|px| ((77 * px[0] as u32 + 150 * px[1] as u32 + 29 * px[2] as u32) >> 8) as u8)
            .collect();
        Self {
            data,
            width,
            height,
            scale: 1.0,
        }
    }

    /// Downscale so neither side exceeds `max_dimension`
    fn fit_within(self, max_dimension: u32) -> Self {
        if self.width <= max_dimension && self.height <= max_dimension {
            return self;
        }

        let scale = (self.width as f32 / max_dimension as f32)
            .max(self.height as f32 / max_dimension as f32);
        let new_width = ((self.width as f32 / scale) as u32).max(1);
        let new_height = ((self.height as f32 / scale) as u32).max(1);

        Self {
            data: downscale_luma(&self.data, self.width, self.height, new_width, new_height),
            width: new_width,
            height: new_height,
            scale: self.width as f32 / new_width as f32,
        }
    }

    fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width as usize + x]
    }
}

fn decode_luma(image: &LumaImage, invert: bool) -> Option<Decoded> {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        image.width as usize,
        image.height as usize,
        |x, y| {
            let v = image.get(x, y);
            if invert { 255 - v } else { v }
        },
    );

    for grid in prepared.detect_grids() {
        match grid.decode() {
            Ok((_meta, text)) => {
                let scale = image.scale;
                let to_point = |p: &rqrr::Point| Point {
                    x: p.x as f32 * scale,
                    y: p.y as f32 * scale,
                };
                // rqrr reports corners clockwise from top-left
                let position = CodePosition {
                    top_left: to_point(&grid.bounds[0]),
                    top_right: to_point(&grid.bounds[1]),
                    bottom_right: to_point(&grid.bounds[2]),
                    bottom_left: to_point(&grid.bounds[3]),
                };
                debug!(len = text.len(), invert, "Decoded QR code");
                return Some(Decoded { text, position });
            }
            Err(e) => {
                debug!(error = ?e, invert, "Found QR grid but failed to decode");
            }
        }
    }

    None
}

/// Downscale a luma plane using bilinear interpolation
fn downscale_luma(
    src: &[u8],
    src_width: u32,
    src_height: u32,
    dst_width: u32,
    dst_height: u32,
) -> Vec<u8> {
    let src_w = src_width as usize;
    let src_h = src_height as usize;
    let mut result = Vec::with_capacity((dst_width * dst_height) as usize);

    let x_ratio = src_width as f32 / dst_width as f32;
    let y_ratio = src_height as f32 / dst_height as f32;

    for y in 0..dst_height {
        for x in 0..dst_width {
            let src_x = x as f32 * x_ratio;
            let src_y = y as f32 * y_ratio;

            let x0 = (src_x as usize).min(src_w - 1);
            let y0 = (src_y as usize).min(src_h - 1);
            let x1 = (x0 + 1).min(src_w - 1);
            let y1 = (y0 + 1).min(src_h - 1);

            let x_frac = src_x - x0 as f32;
            let y_frac = src_y - y0 as f32;

            let p = |px: usize, py: usize| src[py * src_w + px] as f32;

            let value = p(x0, y0) * (1.0 - x_frac) * (1.0 - y_frac)
                + p(x1, y0) * x_frac * (1.0 - y_frac)
                + p(x0, y1) * (1.0 - x_frac) * y_frac
                + p(x1, y1) * x_frac * y_frac;

            result.push(value as u8);
        }
    }

    result
}
