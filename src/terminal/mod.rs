// SPDX-License-Identifier: GPL-3.0-only

//! Terminal scanner UI
//!
//! Renders the camera feed or the selected image with Unicode half-block
//! characters, next to the result or error panel. The scan loop runs on the
//! same task as input handling: one controller tick per refresh period.

mod app;
mod view;
mod widgets;

pub use app::{App, AppCommand};
pub use widgets::{FrameWidget, StatusBar};

use crate::file_input;
use crate::scanner::ScanController;
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste, EventStream},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Write, stdout};
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Run the terminal scanner until the user quits
pub async fn run(
    controller: ScanController,
    refresh: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut guard = TerminalGuard::enter(stdout())?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = App::new(controller);
    let result = run_app(&mut terminal, &mut app, refresh).await;

    // Release the camera before handing the terminal back
    app.controller.clear();

    guard.restore()?;
    terminal.show_cursor()?;

    result
}

/// Raw mode, alternate screen and bracketed paste, undone on drop
///
/// Any early return after entering still hands the terminal back in its
/// normal mode.
struct TerminalGuard<W: Write> {
    out: W,
    raw_mode: bool,
    screen: bool,
}

impl<W: Write> TerminalGuard<W> {
    fn enter(out: W) -> io::Result<Self> {
        enable_raw_mode()?;
        let mut guard = Self {
            out,
            raw_mode: true,
            screen: true,
        };
        execute!(guard.out, EnterAlternateScreen, EnableBracketedPaste)?;
        Ok(guard)
    }

    /// Leave the UI screen modes. Calling it again is a no-op.
    fn restore(&mut self) -> io::Result<()> {
        if self.raw_mode {
            self.raw_mode = false;
            disable_raw_mode()?;
        }
        if self.screen {
            self.screen = false;
            execute!(self.out, DisableBracketedPaste, LeaveAlternateScreen)?;
        }
        Ok(())
    }
}

impl<W: Write> Drop for TerminalGuard<W> {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            warn!(error = %e, "Failed to restore terminal");
        }
    }
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    refresh: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(refresh_ms = refresh.as_millis(), "Terminal UI started");

    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(refresh);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        terminal.draw(|f| view::draw(f, app, Instant::now()))?;

        if app.should_quit {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {
                app.on_tick(Instant::now());
            }
            event = events.next() => match event {
                Some(Ok(event)) => {
                    if let Some(command) = app.handle_event(event, Instant::now()) {
                        run_command(app, command).await;
                    }
                }
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
        }
    }

    info!("Terminal UI exiting");
    Ok(())
}

async fn run_command(app: &mut App, command: AppCommand) {
    match command {
        AppCommand::BrowseFile => {
            let start_dir = app.last_dir();
            match tokio::task::spawn_blocking(move || file_input::pick_file(start_dir.as_deref()))
                .await
            {
                Ok(picked) => app.file_picked(picked),
                Err(e) => warn!(error = %e, "File picker task failed"),
            }
        }
    }
}
