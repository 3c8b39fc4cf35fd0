use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::core::ModelVariant;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub tui: TuiConfig,

    #[serde(skip)]
    pub config_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub variant: ModelVariant,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Iteration cap for the polling loop. None keeps the interactive
    /// unbounded behavior; automated contexts set a bound and get a
    /// distinct timeout error when it is exceeded.
    #[serde(default)]
    pub poll_limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: String,
    #[serde(default = "default_true")]
    pub auto_download: bool,
    #[serde(default = "default_display")]
    pub display: DisplayMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuiConfig {
    #[serde(default = "default_true")]
    pub show_images: bool,
    #[serde(default = "default_theme")]
    pub theme: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Terminal,
    Viewer,
    None,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Terminal => "terminal",
            DisplayMode::Viewer => "viewer",
            DisplayMode::None => "none",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "viewer" => DisplayMode::Viewer,
            "none" => DisplayMode::None,
            _ => DisplayMode::Terminal,
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &["terminal", "viewer", "none"]
    }
}

// Default value functions
fn default_base_url() -> String {
    "https://api.bfl.ai/v1".to_string()
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_output_directory() -> String {
    "./klein-output".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3030
}

fn default_true() -> bool {
    true
}

fn default_display() -> DisplayMode {
    DisplayMode::Terminal
}

fn default_theme() -> String {
    "dark".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: None,
            variant: ModelVariant::default(),
            base_url: default_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_limit: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            auto_download: true,
            display: DisplayMode::Terminal,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            show_images: true,
            theme: default_theme(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            output: OutputConfig::default(),
            server: ServerConfig::default(),
            tui: TuiConfig::default(),
            config_path: PathBuf::new(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "kleinstudio", "klein-cli")
            .context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from file or create default
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path()?;

        // Environment variable takes precedence over the stored key
        let env_key = std::env::var("BFL_API_KEY").ok();

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            let mut config: Config = toml::from_str(&content)
                .context("Failed to parse config file")?;
            config.config_path = config_path;

            if let Some(key) = env_key {
                config.api.key = Some(key);
            }

            Ok(config)
        } else {
            let mut config = Config::default();
            config.config_path = config_path;

            if let Some(key) = env_key {
                config.api.key = Some(key);
            }

            config.save()?;
            Ok(config)
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(&self.config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get API key (from config or environment)
    pub fn api_key(&self) -> Option<&str> {
        self.api.key.as_deref()
    }

    /// Set a config value by key path (e.g., "api.key", "api.variant")
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api.key" => self.api.key = Some(value.to_string()),
            "api.base_url" => self.api.base_url = value.to_string(),
            "api.variant" => {
                if !ModelVariant::variants().contains(&value) {
                    anyhow::bail!(
                        "Invalid variant. Valid values: {}",
                        ModelVariant::variants().join(", ")
                    );
                }
                self.api.variant = ModelVariant::from_str(value);
            }
            "api.poll_interval_ms" => {
                self.api.poll_interval_ms = value.parse()
                    .context("Invalid interval in milliseconds")?;
            }
            "api.poll_limit" => {
                self.api.poll_limit = if value.is_empty() || value == "none" {
                    None
                } else {
                    Some(value.parse().context("Invalid poll limit")?)
                };
            }
            "output.directory" => self.output.directory = value.to_string(),
            "output.auto_download" => {
                self.output.auto_download = value.parse()
                    .context("Invalid boolean value")?;
            }
            "output.display" => {
                self.output.display = DisplayMode::from_str(value);
            }
            "server.host" => self.server.host = value.to_string(),
            "server.port" => {
                self.server.port = value.parse().context("Invalid port")?;
            }
            "tui.show_images" => {
                self.tui.show_images = value.parse()
                    .context("Invalid boolean value")?;
            }
            "tui.theme" => self.tui.theme = value.to_string(),
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    /// Get a config value by key path
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "api.key" => self.api.key.clone().map(|_| "****".to_string()), // Mask API key
            "api.base_url" => Some(self.api.base_url.clone()),
            "api.variant" => Some(self.api.variant.as_str().to_string()),
            "api.poll_interval_ms" => Some(self.api.poll_interval_ms.to_string()),
            "api.poll_limit" => Some(
                self.api
                    .poll_limit
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "none".to_string()),
            ),
            "output.directory" => Some(self.output.directory.clone()),
            "output.auto_download" => Some(self.output.auto_download.to_string()),
            "output.display" => Some(self.output.display.as_str().to_string()),
            "server.host" => Some(self.server.host.clone()),
            "server.port" => Some(self.server.port.to_string()),
            "tui.show_images" => Some(self.tui.show_images.to_string()),
            "tui.theme" => Some(self.tui.theme.clone()),
            _ => None,
        }
    }

    /// Get all config keys
    pub fn keys() -> &'static [&'static str] {
        &[
            "api.key",
            "api.base_url",
            "api.variant",
            "api.poll_interval_ms",
            "api.poll_limit",
            "output.directory",
            "output.auto_download",
            "output.display",
            "server.host",
            "server.port",
            "tui.show_images",
            "tui.theme",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_and_poll_settings_round_trip() {
        let mut config = Config::default();
        config.set("api.variant", "pro").unwrap();
        config.set("api.poll_interval_ms", "50").unwrap();
        config.set("api.poll_limit", "20").unwrap();

        assert_eq!(config.get("api.variant").unwrap(), "pro");
        assert_eq!(config.get("api.poll_interval_ms").unwrap(), "50");
        assert_eq!(config.get("api.poll_limit").unwrap(), "20");

        config.set("api.poll_limit", "none").unwrap();
        assert_eq!(config.api.poll_limit, None);
    }

    #[test]
    fn api_key_is_masked_on_read() {
        let mut config = Config::default();
        config.set("api.key", "secret-key").unwrap();
        assert_eq!(config.get("api.key").unwrap(), "****");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut config = Config::default();
        assert!(config.set("api.bogus", "x").is_err());
        assert!(config.set("api.variant", "turbo").is_err());
        assert!(config.get("api.bogus").is_none());
    }
}
