mod app;
mod event_handler;
mod ui;

use anyhow::Result;
use crossterm::{
    event::{
        poll, read, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste,
        EnableMouseCapture, Event, KeyCode, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;

use crate::config::Config;

pub use app::{App, AppMode};

/// Per-frame crossfade step at the 100ms frame cadence.
const CROSSFADE_STEP: f32 = 0.1;

/// Run the TUI application
pub async fn run(config: &mut Config) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config.clone());

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    // Save config if changed
    if app.config_changed {
        *config = app.config.clone();
        config.save()?;
    }

    result
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Apply any finished generation before drawing
        app.session.pump();
        if app.session.crossfade() < 1.0 {
            app.session.advance_crossfade(CROSSFADE_STEP);
        }

        // Draw UI
        terminal.draw(|f| ui::draw(f, app))?;

        // Handle events
        if poll(Duration::from_millis(100))? {
            match read()? {
                Event::Key(key) => {
                    // Global quit shortcuts
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        return Ok(());
                    }
                    if key.code == KeyCode::Char('q')
                        && app.mode != AppMode::Input
                        && app.mode != AppMode::Settings
                    {
                        return Ok(());
                    }

                    // Handle mode-specific input
                    match app.mode {
                        AppMode::Main => event_handler::handle_main_input(app, key)?,
                        AppMode::Input => event_handler::handle_input_mode(app, key)?,
                        AppMode::Settings => event_handler::handle_settings_input(app, key)?,
                    }
                }
                // Terminals deliver file drops as bracketed paste of
                // the path.
                Event::Paste(text) => {
                    event_handler::handle_paste(app, &text).await?;
                }
                _ => {}
            }
        }

        // Check if we should quit
        if app.should_quit {
            return Ok(());
        }
    }
}
