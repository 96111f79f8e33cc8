// SPDX-License-Identifier: GPL-3.0-only

//! Terminal application state and input handling

use crate::file_input::{self, SelectedFile};
use crate::scanner::{ScanController, ScanMode, TickOutcome};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;

/// Work the event loop has to do outside the key handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Open the desktop file picker
    BrowseFile,
}

pub struct App {
    pub controller: ScanController,
    /// Path being typed, when the path prompt is open
    pub path_input: Option<String>,
    pub show_help: bool,
    pub should_quit: bool,
    last_dir: Option<PathBuf>,
}

impl App {
    pub fn new(controller: ScanController) -> Self {
        Self {
            controller,
            path_input: None,
            show_help: false,
            should_quit: false,
            last_dir: None,
        }
    }

    /// Directory the file picker should open in
    pub fn last_dir(&self) -> Option<PathBuf> {
        self.last_dir.clone()
    }

    /// Advance the scan and the copy confirmation by one refresh
    pub fn on_tick(&mut self, now: Instant) -> TickOutcome {
        let outcome = self.controller.tick();
        self.controller.refresh_copy_feedback(now);
        outcome
    }

    pub fn handle_event(&mut self, event: Event, now: Instant) -> Option<AppCommand> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key, now),
            Event::Paste(text) => {
                self.handle_paste(&text);
                None
            }
            _ => None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Option<AppCommand> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return None;
        }

        if self.path_input.is_some() {
            self.handle_path_key(key);
            return None;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab | KeyCode::BackTab => {
                let next = self.controller.active_tab().toggled();
                self.controller.switch_tab(next);
            }
            KeyCode::Char('1') => self.controller.switch_tab(ScanMode::Camera),
            KeyCode::Char('2') => self.controller.switch_tab(ScanMode::File),
            KeyCode::Char('s') => {
                if let Err(e) = self.controller.start_camera() {
                    debug!(error = %e, "Camera start failed");
                }
            }
            KeyCode::Char('x') | KeyCode::Esc => self.controller.stop_camera(),
            KeyCode::Char('o') => {
                if self.controller.active_tab() != ScanMode::File {
                    self.controller.switch_tab(ScanMode::File);
                }
                return Some(AppCommand::BrowseFile);
            }
            KeyCode::Char('i') | KeyCode::Char('/') => {
                if self.controller.active_tab() != ScanMode::File {
                    self.controller.switch_tab(ScanMode::File);
                }
                self.path_input = Some(String::new());
            }
            KeyCode::Char('c') => {
                if let Err(e) = self.controller.copy_result(now) {
                    debug!(error = %e, "Copy failed");
                }
            }
            KeyCode::Char('d') => self.controller.clear(),
            KeyCode::Char('r') => self.controller.retry(),
            KeyCode::Char('h') | KeyCode::Char('?') => self.show_help = !self.show_help,
            _ => {}
        }
        None
    }

    fn handle_path_key(&mut self, key: KeyEvent) {
        let Some(input) = self.path_input.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.path_input = None,
            KeyCode::Enter => {
                let text = self.path_input.take().unwrap_or_default();
                self.submit_path_text(&text);
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(c) => input.push(c),
            _ => {}
        }
    }

    /// Pasted text: a dropped file, or text for the open path prompt
    pub fn handle_paste(&mut self, text: &str) {
        if let Some(input) = self.path_input.as_mut() {
            input.push_str(text.lines().next().unwrap_or_default());
            return;
        }
        self.submit_path_text(text);
    }

    /// Result of the file picker; `None` when the user cancelled
    pub fn file_picked(&mut self, file: Option<SelectedFile>) {
        match file {
            Some(file) => self.open_file(file),
            None => debug!("File selection cancelled"),
        }
    }

    fn submit_path_text(&mut self, text: &str) {
        match file_input::parse_dropped_path(text) {
            Some(path) => self.open_file(SelectedFile::from_path(path)),
            None => debug!("Ignoring input without a usable path"),
        }
    }

    fn open_file(&mut self, file: SelectedFile) {
        if let Some(parent) = file.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.last_dir = Some(parent.to_path_buf());
        }
        if let Err(e) = self.controller.process_file(file) {
            debug!(error = %e, "File rejected");
        }
    }

    /// Key hints for the status bar
    pub fn status_message(&self) -> String {
        if self.path_input.is_some() {
            return "Enter: scan file | Esc: cancel".to_string();
        }
        if self.show_help {
            return "Tab/1/2: switch tab | s: start camera | x: stop | o: browse | i: type path \
                    | c: copy | d: clear | r: retry | h: help | q: quit"
                .to_string();
        }

        let state = self.controller.state();
        let mut msg = String::from(state.name());
        if state.result().is_some() {
            msg.push_str(" | 'c' copy | 'd' clear");
        } else if state.error().is_some() {
            msg.push_str(" | 'r' retry | 'd' clear");
        } else {
            match self.controller.active_tab() {
                ScanMode::Camera if self.controller.is_camera_open() => msg.push_str(" | 'x' stop"),
                ScanMode::Camera => msg.push_str(" | 's' start camera"),
                ScanMode::File => msg.push_str(" | 'o' browse | 'i' type path | drop a file"),
            }
        }
        msg.push_str(" | 'h' help | 'q' quit");
        msg
    }
}
