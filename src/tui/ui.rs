use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use super::app::{App, AppMode, SettingsField};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
    match app.mode {
        AppMode::Main | AppMode::Input => draw_main(frame, app),
        AppMode::Settings => draw_settings(frame, app),
    }
}

fn draw_main(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title/input
            Constraint::Min(8),    // Image panel
            Constraint::Length(3), // Status bar
            Constraint::Length(2), // Help line
        ])
        .split(frame.area());

    // Title or input
    if app.mode == AppMode::Input {
        draw_input(frame, app, chunks[0]);
    } else {
        draw_title(frame, chunks[0]);
    }

    draw_images(frame, app, chunks[1]);
    draw_status(frame, app, chunks[2]);
    draw_help(frame, app, chunks[3]);
}

fn draw_title(frame: &mut Frame, area: Rect) {
    let title = Paragraph::new(vec![Line::from(vec![
        Span::styled(
            "Klein",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" - FLUX.2 Image Generation", Style::default().fg(Color::Gray)),
    ])])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)),
    );
    frame.render_widget(title, area);
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let input = Paragraph::new(app.input.as_str())
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title("Enter prompt (Enter to generate, Esc to cancel)"),
        );
    frame.render_widget(input, area);

    // Show cursor
    frame.set_cursor_position((area.x + app.cursor_pos as u16 + 1, area.y + 1));
}

/// The crossfade panel: previous image fades out as the current one
/// fades in.
fn draw_images(frame: &mut Frame, app: &App, area: Rect) {
    let fade = app.session.crossfade();
    let mut lines: Vec<Line> = Vec::new();

    if let Some(current) = app.session.current() {
        let style = if fade < 1.0 {
            Style::default().fg(Color::White)
        } else {
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD)
        };
        lines.push(Line::from(vec![
            Span::styled("current  ", Style::default().fg(Color::Green)),
            Span::styled(current.handle.clone(), style),
        ]));
    } else {
        lines.push(Line::from(Span::styled(
            "No image yet - press 'i' and describe one",
            Style::default().fg(Color::DarkGray),
        )));
    }

    if let Some(previous) = app.session.previous() {
        if fade < 1.0 {
            lines.push(Line::from(vec![
                Span::styled("previous ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    previous.handle.clone(),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("  (fading, {:.0}%)", fade * 100.0),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
        }
    }

    if app.session.edit_mode() {
        lines.push(Line::from(Span::styled(
            "edit mode: next prompt conditions on the current image",
            Style::default().fg(Color::Cyan),
        )));
    }

    if app.session.drag_active() {
        lines.push(Line::from(Span::styled(
            "drop the file to use it as reference",
            Style::default().fg(Color::Cyan),
        )));
    }

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Image [{}]", app.session.variant().as_str())),
    );
    frame.render_widget(panel, area);
}

fn draw_status(frame: &mut Frame, app: &App, area: Rect) {
    let elapsed = app.session.elapsed_readout();

    let (message, style) = if let Some(err) = app.session.error() {
        (err.to_string(), Style::default().fg(Color::Red))
    } else if let Some(warn) = app.session.warning() {
        (warn.to_string(), Style::default().fg(Color::Yellow))
    } else if app.session.is_generating() {
        (
            format!("Generating... {elapsed}"),
            Style::default().fg(Color::Yellow),
        )
    } else if let Some(status) = &app.status_message {
        (status.clone(), Style::default().fg(Color::Green))
    } else if !elapsed.is_empty() {
        (
            format!("Ready ({elapsed})"),
            Style::default().fg(Color::Gray),
        )
    } else {
        ("Ready".to_string(), Style::default().fg(Color::Gray))
    };

    let status = Paragraph::new(message)
        .style(style)
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(status, area);
}

fn draw_help(frame: &mut Frame, app: &App, area: Rect) {
    let help = match app.mode {
        AppMode::Input => "Enter: generate | Esc: cancel",
        _ => "i: prompt | e: toggle edit mode | paste a file path for reference | s: settings | q: quit",
    };
    let help = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, area);
}

fn draw_settings(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let title = Paragraph::new("Settings").block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)),
    );
    frame.render_widget(title, chunks[0]);

    let items: Vec<ListItem> = SettingsField::all()
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let selected = i == app.settings_selected;
            let value = if selected && app.settings_editing {
                format!("{}_", app.settings_edit_buffer)
            } else {
                app.get_settings_value(field)
            };

            let style = if selected {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<22}", field.label()), style),
                Span::styled(value, Style::default().fg(Color::Gray)),
            ]))
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Fields"));
    frame.render_widget(list, chunks[1]);

    let help = Paragraph::new("j/k: move | Enter: edit or cycle | Esc: back")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[2]);
}
