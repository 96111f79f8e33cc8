// SPDX-License-Identifier: GPL-3.0-only

//! Custom widgets: half-block frame preview and status bar

use crate::backends::camera::CameraFrame;
use crate::decoder::CodePosition;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Highlight colour for the outline of a decoded code
const CODE_OUTLINE: Color = Color::Rgb(0, 220, 90);

/// Renders a frame using half-block characters
///
/// Each terminal cell shows two vertical pixels: the upper half (▀) in the
/// foreground colour and the lower half in the background colour.
pub struct FrameWidget<'a> {
    frame: Option<&'a CameraFrame>,
    placeholder: &'a str,
    outline: Option<(f32, f32, f32, f32)>,
}

impl<'a> FrameWidget<'a> {
    pub fn new(frame: Option<&'a CameraFrame>, placeholder: &'a str) -> Self {
        Self {
            frame,
            placeholder,
            outline: None,
        }
    }

    /// Outline a decoded code on top of the frame
    pub fn outline(mut self, position: Option<&CodePosition>) -> Self {
        self.outline = position.map(CodePosition::bounding_box);
        self
    }
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = self.frame.filter(|f| f.width > 0 && f.height > 0) else {
            render_centered(self.placeholder, area, buf);
            return;
        };
        if area.width == 0 || area.height == 0 {
            return;
        }

        // Fit the frame, keeping its aspect ratio
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        let on_outline = |src_x: f64, src_y: f64| -> bool {
            let Some((bx, by, bw, bh)) = self.outline else {
                return false;
            };
            let (bx, by, bw, bh) = (bx as f64, by as f64, bw as f64, bh as f64);
            let inside_x = src_x >= bx - x_scale && src_x <= bx + bw + x_scale;
            let inside_y = src_y >= by - y_scale && src_y <= by + bh + y_scale;
            let near_vertical = (src_x - bx).abs() < x_scale || (src_x - (bx + bw)).abs() < x_scale;
            let near_horizontal =
                (src_y - by).abs() < y_scale || (src_y - (by + bh)).abs() < y_scale;
            (near_vertical && inside_y) || (near_horizontal && inside_x)
        };

        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;

                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let src_x = tx as f64 * x_scale;
                let src_y_top = ty as f64 * 2.0 * y_scale;
                let src_y_bottom = (ty as f64 * 2.0 + 1.0) * y_scale;

                let sample = |src_y: f64| {
                    if on_outline(src_x, src_y) {
                        CODE_OUTLINE
                    } else {
                        let (r, g, b) = frame.rgb_at(src_x as u32, src_y as u32);
                        Color::Rgb(r, g, b)
                    }
                };

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(sample(src_y_top));
                    cell.set_bg(sample(src_y_bottom));
                }
            }
        }
    }
}

fn render_centered(msg: &str, area: Rect, buf: &mut Buffer) {
    let width = msg.chars().count() as u16;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + area.height / 2;
    if y < area.y + area.height && x < area.x + area.width {
        buf.set_stringn(
            x,
            y,
            msg,
            (area.x + area.width - x) as usize,
            Style::default().fg(Color::Gray),
        );
    }
}

/// Single-line status bar
pub struct StatusBar<'a> {
    pub message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }

        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        buf.set_stringn(
            area.x,
            area.y,
            self.message,
            area.width as usize,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}
