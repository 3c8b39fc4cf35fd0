use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::json;
use std::path::PathBuf;

use super::generate::{finish, prompt_preview, spinner};
use crate::api::{load_image_base64, FluxClient, PollMode};
use crate::config::Config;
use crate::core::{GenerationRequest, ModelVariant, ReferenceImage};

#[derive(Args)]
pub struct EditArgs {
    /// Path to the image to edit
    #[arg(required = true)]
    pub image: PathBuf,

    /// The edit instruction (e.g., "make the sky blue", "add a hat")
    #[arg(required = true)]
    pub prompt: String,

    /// Model variant (klein, pro)
    #[arg(short, long)]
    pub variant: Option<String>,

    /// Cap on poll iterations (default: unbounded)
    #[arg(long)]
    pub max_polls: Option<u32>,

    /// Output directory for edited images
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Don't download the image automatically
    #[arg(long)]
    pub no_download: bool,

    /// Output format (text, json, quiet)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub async fn run(args: EditArgs, config: &Config) -> Result<()> {
    let image_path = args.image.canonicalize().context("Image file not found")?;

    let base64_data = load_image_base64(&image_path)
        .await
        .context("Failed to load image file")?;

    let variant = args
        .variant
        .as_deref()
        .map(ModelVariant::from_str)
        .unwrap_or(config.api.variant);

    let request = GenerationRequest::new(&args.prompt)
        .with_variant(variant)
        .with_reference(ReferenceImage::Inline(base64_data));

    let mut client = FluxClient::from_config(config)?;
    if let Some(cap) = args.max_polls {
        client = client.with_poll_mode(PollMode::Bounded(cap));
    }

    let pb = spinner(
        &args.format,
        format!("Editing image: {}...", prompt_preview(&args.prompt, 40)),
    );

    let url = match client.submit(&request).await {
        Ok(url) => url,
        Err(e) => {
            if let Some(pb) = pb {
                pb.finish_with_message(format!("{} Edit failed", "✗".red()));
            }
            if args.format == "json" {
                println!("{}", serde_json::to_string_pretty(&json!({ "error": e.to_string() }))?);
            } else if args.format != "quiet" {
                eprintln!("{}: {}", "Error".red().bold(), e);
            }
            return Err(e.into());
        }
    };

    finish(
        &args.prompt,
        &url,
        variant,
        args.output,
        args.no_download,
        &args.format,
        pb,
        config,
    )
    .await
}
