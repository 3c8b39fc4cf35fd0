use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use klein_cli::cli::{self, Cli, Commands};
use klein_cli::config::Config;
use klein_cli::tui;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    // Load or create config
    let mut config = Config::load_or_create()?;

    match cli.command {
        Some(Commands::Generate(args)) => {
            cli::commands::generate::run(args, &config).await?;
        }
        Some(Commands::Edit(args)) => {
            cli::commands::edit::run(args, &config).await?;
        }
        Some(Commands::Serve(args)) => {
            cli::commands::serve::run(args, &config).await?;
        }
        Some(Commands::Config(args)) => {
            cli::commands::config::run(args, &mut config)?;
        }
        None => {
            // Launch TUI
            tui::run(&mut config).await?;
        }
    }

    Ok(())
}
