pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "klein",
    version,
    about = "Klein CLI - Generate images with FLUX.2 Klein",
    long_about = r#"Klein CLI - Generate images with FLUX.2 Klein

A CLI for generating and editing images through the Black Forest Labs
FLUX.2 API. Run without arguments to launch the interactive TUI.

SETUP:
  Set your API key via environment variable or config:
    export BFL_API_KEY=your-key-here
    klein config set api.key your-key-here

EXAMPLES:
  Generate an image:
    klein generate "a cosmic whale drifting through fog"
    klein g "sunset over mountains" --variant pro

  Edit an existing image:
    klein edit image.png "add a rainbow in the sky"
    klein e photo.jpg "make it look like a watercolor painting"

  Run the local generation proxy:
    klein serve
    klein serve --port 8080

  Manage configuration:
    klein config show
    klein config set api.variant pro

  Launch interactive TUI:
    klein

OUTPUT FORMATS:
  --format text   Human-readable output (default)
  --format json   Machine-readable JSON for AI agents
  --format quiet  Minimal output, just file paths"#,
    after_help = r#"CONFIGURATION:
  Config file: ~/.config/klein-cli/config.toml (macOS/Linux)

  Model variants:
    - klein (default)
    - pro

  Polling is unbounded by default; set api.poll_limit (or pass
  --max-polls) to cap it in automated contexts."#
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a new image from a text prompt
    ///
    /// Submits the prompt to the FLUX.2 API and polls until the result
    /// is ready. Images are saved to the configured output directory.
    #[command(
        alias = "g",
        after_help = r#"EXAMPLES:
  Basic generation:
    klein generate "a red apple on a wooden table"

  Pro model:
    klein generate "detailed portrait" --variant pro

  With a remote reference image:
    klein generate "same scene at night" --image-url https://example.com/day.png

  Bounded polling for scripts:
    klein generate "abstract art" --max-polls 120 --format json"#
    )]
    Generate(commands::generate::GenerateArgs),

    /// Edit an existing image using a text prompt
    ///
    /// Sends the image as a conditioning reference - describe what you
    /// want changed and the model applies the edit.
    #[command(
        alias = "e",
        after_help = r#"EXAMPLES:
  Add elements:
    klein edit photo.png "add sunglasses to the person"

  Change style:
    klein edit image.jpg "convert to pencil sketch style""#
    )]
    Edit(commands::edit::EditArgs),

    /// Run the local HTTP generation proxy
    ///
    /// Exposes POST /api/generate for clients that hold their own API
    /// key; the proxy forwards the credential and normalizes errors.
    #[command(
        alias = "s",
        after_help = r#"EXAMPLES:
  Defaults from config:
    klein serve

  Explicit address:
    klein serve --host 0.0.0.0 --port 8080"#
    )]
    Serve(commands::serve::ServeArgs),

    /// View or modify configuration
    ///
    /// Manage the API key, model variant, polling and output settings.
    /// Changes are saved to the config file immediately.
    #[command(
        alias = "c",
        after_help = r#"EXAMPLES:
  Show all settings:
    klein config show

  Set values:
    klein config set api.key YOUR_API_KEY
    klein config set api.variant pro
    klein config set api.poll_limit 120

AVAILABLE SETTINGS:
  api.key              - BFL API key
  api.base_url         - Provider base URL
  api.variant          - Default model variant (klein/pro)
  api.poll_interval_ms - Delay between result polls
  api.poll_limit       - Poll iteration cap (none = unbounded)
  output.directory     - Where to save images
  output.auto_download - Auto-download images (true/false)
  output.display       - Display mode (terminal/viewer/none)
  server.host          - Proxy bind host
  server.port          - Proxy bind port
  tui.show_images      - Show images in TUI (true/false)
  tui.theme            - TUI theme (dark/light)"#
    )]
    Config(commands::config::ConfigArgs),
}
