// SPDX-License-Identifier: GPL-3.0-only

//! Screen layout
//!
//! ```text
//! ┌ QR Scanner ─────────────────────────────┐
//! │ 1 Camera │ 2 File                       │
//! └─────────────────────────────────────────┘
//! ┌ Preview ──────────────┐┌ Result ────────┐
//! │                       ││                │
//! │   half-block frame    ││ text / error   │
//! │                       ││                │
//! └───────────────────────┘└────────────────┘
//!  status bar
//! ```

use super::app::App;
use super::widgets::{FrameWidget, StatusBar};
use crate::errors::ScanError;
use crate::scanner::{ScanMode, ScanResult, UiState};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Tabs, Wrap},
};
use std::time::Instant;

pub fn draw(frame: &mut Frame, app: &App, now: Instant) {
    let prompt_height = if app.path_input.is_some() { 3 } else { 0 };
    let [tabs_area, body_area, prompt_area, status_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(4),
        Constraint::Length(prompt_height),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_tabs(frame, app, tabs_area);

    let [preview_area, panel_area] =
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
            .areas(body_area);

    draw_preview(frame, app, preview_area);
    draw_panel(frame, app, panel_area, now);

    if let Some(input) = &app.path_input {
        let prompt = Paragraph::new(Line::from(vec![
            Span::raw(input.as_str()),
            Span::styled("█", Style::default().fg(Color::Gray)),
        ]))
        .block(Block::bordered().title(" Image path "));
        frame.render_widget(prompt, prompt_area);
    }

    let message = app.status_message();
    frame.render_widget(StatusBar { message: &message }, status_area);
}

fn draw_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles = ScanMode::ALL
        .iter()
        .enumerate()
        .map(|(i, mode)| format!("{} {}", i + 1, mode.title()));

    let tabs = Tabs::new(titles)
        .select(app.controller.active_tab().index())
        .block(Block::bordered().title(" QR Scanner "))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, area);
}

fn draw_preview(frame: &mut Frame, app: &App, area: Rect) {
    let controller = &app.controller;
    let block = Block::bordered().title(match controller.active_tab() {
        ScanMode::Camera => " Camera ",
        ScanMode::File => " Image ",
    });
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let placeholder = match (controller.active_tab(), controller.state()) {
        (ScanMode::Camera, UiState::Scanning(ScanMode::Camera)) => "Waiting for camera...",
        (ScanMode::Camera, _) => "Press 's' to start the camera",
        (ScanMode::File, _) => "Drop an image here, 'o' to browse or 'i' to type a path",
    };

    let position = controller
        .state()
        .result()
        .filter(|r| r.mode == controller.active_tab())
        .and_then(|r| r.position.as_ref());

    frame.render_widget(
        FrameWidget::new(controller.preview(), placeholder).outline(position),
        inner,
    );
}

fn draw_panel(frame: &mut Frame, app: &App, area: Rect, now: Instant) {
    let controller = &app.controller;
    let (title, lines) = match controller.state() {
        UiState::ResultShown(result) => (
            " Result ",
            result_lines(result, controller.copy_label(now), controller.is_copy_enabled(now)),
        ),
        UiState::ErrorShown(error) => (" Error ", error_lines(error)),
        UiState::Scanning(ScanMode::Camera) => (
            " Scanning ",
            vec![Line::from("Point the camera at a QR code.")],
        ),
        UiState::Scanning(ScanMode::File) => (" Scanning ", vec![Line::from("Decoding image...")]),
        UiState::Idle => (" Ready ", idle_lines(app)),
    };

    let panel = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::bordered().title(title));
    frame.render_widget(panel, area);
}

fn result_lines(result: &ScanResult, copy_label: &str, copy_enabled: bool) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::styled(result.text.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Line::default(),
        Line::styled(
            format!(
                "From {} at {}",
                result.mode.title().to_lowercase(),
                result.scanned_at.format("%H:%M:%S")
            ),
            Style::default().fg(Color::Gray),
        ),
    ];

    if let Some(position) = &result.position {
        let (x, y, w, h) = position.bounding_box();
        lines.push(Line::styled(
            format!("Position {:.0},{:.0} size {:.0}x{:.0}", x, y, w, h),
            Style::default().fg(Color::Gray),
        ));
    }

    lines.push(Line::default());
    let copy_style = if copy_enabled {
        Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
        Style::default().fg(Color::Black).bg(Color::Green)
    };
    lines.push(Line::from(vec![
        Span::styled(format!(" c: {} ", copy_label), copy_style),
        Span::raw("  "),
        Span::styled(" d: Clear ", Style::default().fg(Color::Black).bg(Color::Gray)),
    ]));
    lines
}

fn error_lines(error: &ScanError) -> Vec<Line<'static>> {
    vec![
        Line::styled(
            error.user_message(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Line::default(),
        Line::styled(error.to_string(), Style::default().fg(Color::Gray)),
        Line::default(),
        Line::from(Span::styled(
            " r: Retry ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
    ]
}

fn idle_lines(app: &App) -> Vec<Line<'static>> {
    match app.controller.active_tab() {
        ScanMode::Camera => vec![Line::from("Start the camera and hold a QR code in view.")],
        ScanMode::File => {
            let mut lines = vec![Line::from("Select an image containing a QR code.")];
            if let Some(file) = app.controller.selected_file() {
                lines.push(Line::default());
                lines.push(Line::styled(
                    format!("Last file: {}", file.name()),
                    Style::default().fg(Color::Gray),
                ));
            }
            lines
        }
    }
}
