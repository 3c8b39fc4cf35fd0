use std::sync::Arc;
use std::time::Duration;

use crate::api::{FluxClient, PollMode};
use crate::config::Config;
use crate::core::Session;

/// Application mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Main view with the image panel
    Main,
    /// Text input mode
    Input,
    /// Settings screen
    Settings,
}

/// Settings field being edited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Variant,
    PollLimit,
    OutputDirectory,
    AutoDownload,
    Display,
    ShowImages,
    Theme,
}

impl SettingsField {
    pub fn all() -> &'static [SettingsField] {
        &[
            SettingsField::Variant,
            SettingsField::PollLimit,
            SettingsField::OutputDirectory,
            SettingsField::AutoDownload,
            SettingsField::Display,
            SettingsField::ShowImages,
            SettingsField::Theme,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            SettingsField::Variant => "Model Variant",
            SettingsField::PollLimit => "Poll Limit",
            SettingsField::OutputDirectory => "Output Directory",
            SettingsField::AutoDownload => "Auto Download",
            SettingsField::Display => "Display Mode",
            SettingsField::ShowImages => "Show Images in TUI",
            SettingsField::Theme => "Theme",
        }
    }

    pub fn config_key(&self) -> &'static str {
        match self {
            SettingsField::Variant => "api.variant",
            SettingsField::PollLimit => "api.poll_limit",
            SettingsField::OutputDirectory => "output.directory",
            SettingsField::AutoDownload => "output.auto_download",
            SettingsField::Display => "output.display",
            SettingsField::ShowImages => "tui.show_images",
            SettingsField::Theme => "tui.theme",
        }
    }
}

/// TUI application state: a view over one generation session.
pub struct App {
    /// Current mode
    pub mode: AppMode,

    /// Configuration
    pub config: Config,

    /// The generation session this TUI drives
    pub session: Session,

    /// Current prompt input
    pub input: String,

    /// Cursor position in input
    pub cursor_pos: usize,

    /// Status message
    pub status_message: Option<String>,

    /// Whether to quit
    pub should_quit: bool,

    /// Whether config was changed
    pub config_changed: bool,

    /// Settings: selected field index
    pub settings_selected: usize,

    /// Settings: currently editing
    pub settings_editing: bool,

    /// Settings: edit buffer
    pub settings_edit_buffer: String,
}

impl App {
    pub fn new(config: Config) -> Self {
        let session = build_session(&config);
        Self {
            mode: AppMode::Main,
            config,
            session,
            input: String::new(),
            cursor_pos: 0,
            status_message: None,
            should_quit: false,
            config_changed: false,
            settings_selected: 0,
            settings_editing: false,
            settings_edit_buffer: String::new(),
        }
    }

    /// Set status message
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
    }

    /// Clear messages
    pub fn clear_messages(&mut self) {
        self.status_message = None;
    }

    /// Rebuild the session backend after a config change. Safe only
    /// while no attempt is in flight; callers check the session first.
    pub fn rebuild_session(&mut self) {
        if !self.session.is_generating() {
            self.session = build_session(&self.config);
        }
    }

    /// Get current settings value
    pub fn get_settings_value(&self, field: &SettingsField) -> String {
        self.config.get(field.config_key()).unwrap_or_default()
    }

    /// Set settings value
    pub fn set_settings_value(&mut self, field: &SettingsField, value: &str) -> anyhow::Result<()> {
        self.config.set(field.config_key(), value)?;
        self.config_changed = true;
        self.rebuild_session();
        Ok(())
    }

    /// Get options for a settings field (if applicable)
    pub fn get_settings_options(&self, field: &SettingsField) -> Option<Vec<&'static str>> {
        match field {
            SettingsField::Variant => Some(crate::core::ModelVariant::variants().to_vec()),
            SettingsField::AutoDownload => Some(vec!["true", "false"]),
            SettingsField::Display => Some(crate::config::DisplayMode::variants().to_vec()),
            SettingsField::ShowImages => Some(vec!["true", "false"]),
            SettingsField::Theme => Some(vec!["dark", "light"]),
            _ => None,
        }
    }

    /// Cycle to next option for a settings field
    pub fn cycle_settings_option(&mut self, field: &SettingsField) -> anyhow::Result<()> {
        if let Some(options) = self.get_settings_options(field) {
            let current = self.get_settings_value(field);
            let current_idx = options.iter().position(|&o| o == current).unwrap_or(0);
            let next_idx = (current_idx + 1) % options.len();
            self.set_settings_value(field, options[next_idx])?;
        }
        Ok(())
    }
}

fn build_session(config: &Config) -> Session {
    let mut client = FluxClient::new(
        config.api_key().unwrap_or_default(),
        config.api.base_url.clone(),
    )
    .with_poll_interval(Duration::from_millis(config.api.poll_interval_ms));
    if let Some(cap) = config.api.poll_limit {
        client = client.with_poll_mode(PollMode::Bounded(cap));
    }

    Session::new(
        Arc::new(client),
        config.api_key().map(str::to_string),
        config.api.variant,
    )
}
