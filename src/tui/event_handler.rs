use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use std::path::Path;

use super::app::{App, AppMode, SettingsField};

/// Handle input in main mode
pub fn handle_main_input(app: &mut App, key: KeyEvent) -> Result<()> {
    match key.code {
        // Enter input mode
        KeyCode::Char('i') | KeyCode::Char('/') => {
            app.mode = AppMode::Input;
            app.clear_messages();
        }

        // Toggle edit mode (next generation conditions on the current image)
        KeyCode::Char('e') => {
            let enabled = !app.session.edit_mode();
            app.session.set_edit_mode(enabled);
            app.set_status(if enabled {
                "Edit mode on: next prompt edits the current image"
            } else {
                "Edit mode off"
            });
        }

        // Open settings
        KeyCode::Char('s') => {
            app.mode = AppMode::Settings;
            app.settings_selected = 0;
            app.settings_editing = false;
        }

        // Quit
        KeyCode::Char('q') | KeyCode::Esc => {
            app.should_quit = true;
        }

        _ => {}
    }
    Ok(())
}

/// Handle input in text input mode
pub fn handle_input_mode(app: &mut App, key: KeyEvent) -> Result<()> {
    match key.code {
        KeyCode::Esc => {
            app.mode = AppMode::Main;
            app.input.clear();
            app.cursor_pos = 0;
        }

        KeyCode::Enter => {
            if !app.input.is_empty() {
                let prompt = app.input.clone();
                app.input.clear();
                app.cursor_pos = 0;
                app.mode = AppMode::Main;

                // A second Enter while one attempt is in flight is a
                // silent no-op inside the session.
                app.session.trigger(&prompt);
            }
        }

        KeyCode::Char(c) => {
            app.input.insert(app.cursor_pos, c);
            app.cursor_pos += 1;
        }

        KeyCode::Backspace => {
            if app.cursor_pos > 0 {
                app.cursor_pos -= 1;
                app.input.remove(app.cursor_pos);
            }
        }

        KeyCode::Delete => {
            if app.cursor_pos < app.input.len() {
                app.input.remove(app.cursor_pos);
            }
        }

        KeyCode::Left => {
            if app.cursor_pos > 0 {
                app.cursor_pos -= 1;
            }
        }

        KeyCode::Right => {
            if app.cursor_pos < app.input.len() {
                app.cursor_pos += 1;
            }
        }

        KeyCode::Home => {
            app.cursor_pos = 0;
        }

        KeyCode::End => {
            app.cursor_pos = app.input.len();
        }

        _ => {}
    }
    Ok(())
}

/// A pasted file path is the terminal equivalent of a drop: ingest it
/// as the next reference image. Non-image files are ignored.
pub async fn handle_paste(app: &mut App, text: &str) -> Result<()> {
    let path = Path::new(text.trim());
    if !path.is_file() {
        return Ok(());
    }

    match app.session.ingest_dropped_file(path).await {
        Ok(true) => app.set_status(format!("Reference image loaded: {}", path.display())),
        Ok(false) => {}
        Err(e) => app.set_status(format!("Could not read file: {e}")),
    }
    Ok(())
}

/// Handle input in settings mode
pub fn handle_settings_input(app: &mut App, key: KeyEvent) -> Result<()> {
    let fields = SettingsField::all();

    if app.settings_editing {
        // Editing a text field
        match key.code {
            KeyCode::Esc => {
                app.settings_editing = false;
                app.settings_edit_buffer.clear();
            }

            KeyCode::Enter => {
                let field = fields[app.settings_selected];
                let value = app.settings_edit_buffer.clone();
                if let Err(e) = app.set_settings_value(&field, &value) {
                    app.set_status(e.to_string());
                } else {
                    app.set_status(format!("Updated {}", field.label()));
                }
                app.settings_editing = false;
                app.settings_edit_buffer.clear();
            }

            KeyCode::Char(c) => {
                app.settings_edit_buffer.push(c);
            }

            KeyCode::Backspace => {
                app.settings_edit_buffer.pop();
            }

            _ => {}
        }
    } else {
        // Navigation
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                if app.settings_selected > 0 {
                    app.settings_selected -= 1;
                }
            }

            KeyCode::Down | KeyCode::Char('j') => {
                if app.settings_selected < fields.len() - 1 {
                    app.settings_selected += 1;
                }
            }

            KeyCode::Enter | KeyCode::Char(' ') => {
                let field = &fields[app.settings_selected];

                // Check if this field has options to cycle
                if app.get_settings_options(field).is_some() {
                    app.cycle_settings_option(field)?;
                    app.set_status(format!("Updated {}", field.label()));
                } else {
                    // Enter edit mode for text fields
                    app.settings_editing = true;
                    app.settings_edit_buffer = app.get_settings_value(field);
                }
            }

            KeyCode::Esc | KeyCode::Char('q') => {
                app.mode = AppMode::Main;
                app.clear_messages();
            }

            _ => {}
        }
    }
    Ok(())
}
