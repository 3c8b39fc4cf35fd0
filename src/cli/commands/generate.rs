use anyhow::Result;
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::{FluxClient, PollMode};
use crate::config::Config;
use crate::core::{GenerationRequest, ModelVariant, ReferenceImage};

#[derive(Args)]
pub struct GenerateArgs {
    /// The prompt describing the image to generate
    #[arg(required = true)]
    pub prompt: String,

    /// Model variant (klein, pro)
    #[arg(short, long)]
    pub variant: Option<String>,

    /// Remote reference image URL (fetched and forwarded by the proxy)
    #[arg(long)]
    pub image_url: Option<String>,

    /// Cap on poll iterations (default: unbounded)
    #[arg(long)]
    pub max_polls: Option<u32>,

    /// Output directory for downloaded images
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Don't download the image automatically
    #[arg(long)]
    pub no_download: bool,

    /// Output format (text, json, quiet)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub async fn run(args: GenerateArgs, config: &Config) -> Result<()> {
    let variant = args
        .variant
        .as_deref()
        .map(ModelVariant::from_str)
        .unwrap_or(config.api.variant);

    let mut request = GenerationRequest::new(&args.prompt).with_variant(variant);
    if let Some(url) = &args.image_url {
        request = request.with_reference(ReferenceImage::Url(url.clone()));
    }

    let mut client = FluxClient::from_config(config)?;
    if let Some(cap) = args.max_polls {
        client = client.with_poll_mode(PollMode::Bounded(cap));
    }

    let pb = spinner(&args.format, format!("Generating image: {}...", prompt_preview(&args.prompt, 40)));

    let url = match client.submit(&request).await {
        Ok(url) => url,
        Err(e) => {
            if let Some(pb) = pb {
                pb.finish_with_message(format!("{} Generation failed", "✗".red()));
            }
            if args.format == "json" {
                println!("{}", serde_json::to_string_pretty(&json!({ "error": e.to_string() }))?);
            } else if args.format != "quiet" {
                eprintln!("{}: {}", "Error".red().bold(), e);
            }
            return Err(e.into());
        }
    };

    finish(&args.prompt, &url, variant, args.output, args.no_download, &args.format, pb, config).await
}

/// Shared tail of generate/edit: download, report, display.
pub async fn finish(
    prompt: &str,
    url: &str,
    variant: ModelVariant,
    output: Option<PathBuf>,
    no_download: bool,
    format: &str,
    pb: Option<ProgressBar>,
    config: &Config,
) -> Result<()> {
    let client = FluxClient::from_config(config)?;
    let output_dir = output.unwrap_or_else(|| PathBuf::from(&config.output.directory));

    if !no_download && config.output.auto_download {
        let path = client.download(url, &output_dir).await?;

        if let Some(pb) = &pb {
            pb.finish_with_message(format!("{} Image generated", "✓".green()));
        }

        match format {
            "json" => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "url": url,
                        "path": path.to_string_lossy(),
                        "variant": variant.as_str(),
                    }))?
                );
            }
            "quiet" => println!("{}", path.display()),
            _ => {
                println!();
                println!("{}: {}", "Prompt".cyan().bold(), prompt);
                println!("{}: {}", "Variant".cyan().bold(), variant.as_str());
                println!("{}: {}", "URL".cyan().bold(), url);
                println!("{}: {}", "Saved to".cyan().bold(), path.display());

                if config.output.display == crate::config::DisplayMode::Terminal {
                    println!();
                    display_image_terminal(&path.to_string_lossy());
                }
            }
        }
    } else {
        if let Some(pb) = &pb {
            pb.finish_with_message(format!("{} Image generated (not downloaded)", "✓".green()));
        }

        match format {
            "json" => println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "url": url, "variant": variant.as_str() }))?
            ),
            "quiet" => println!("{}", url),
            _ => println!("{}: {}", "URL".cyan().bold(), url),
        }
    }

    Ok(())
}

pub fn spinner(format: &str, message: String) -> Option<ProgressBar> {
    if format != "text" {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.yellow} {msg} {elapsed}")
            .unwrap(),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

pub fn prompt_preview(prompt: &str, max_len: usize) -> String {
    if prompt.len() <= max_len {
        prompt.to_string()
    } else {
        format!("{}...", &prompt[..max_len.saturating_sub(3)])
    }
}

/// Display an image in the terminal using viuer
pub fn display_image_terminal(path: &str) {
    let conf = viuer::Config {
        width: Some(80),
        height: Some(30),
        absolute_offset: false,
        ..Default::default()
    };

    if let Err(e) = viuer::print_from_file(path, &conf) {
        tracing::debug!("Failed to display image in terminal: {}", e);
    }
}
