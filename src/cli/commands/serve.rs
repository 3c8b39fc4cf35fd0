use anyhow::Result;
use clap::Args;

use crate::config::Config;
use crate::server;

#[derive(Args)]
pub struct ServeArgs {
    /// Bind host (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,
}

pub async fn run(args: ServeArgs, config: &Config) -> Result<()> {
    let mut config = config.clone();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    server::serve(&config).await
}
