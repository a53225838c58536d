//! `show` and `download` for a single workflow

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use flowdeck_core::{sanitize_text, DeckConfig, WorkflowApi};
use tracing::info;

use super::{connect, download_target};
use crate::{clipboard, ui};

#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Workflow filename (e.g. 0042_slack_webhook.json)
    pub filename: String,

    /// Print the diagram source instead of the raw JSON
    #[arg(long)]
    pub diagram: bool,

    /// Also copy the output to the clipboard
    #[arg(long)]
    pub copy: bool,
}

#[derive(Parser, Debug)]
pub struct DownloadArgs {
    /// Workflow filename
    pub filename: String,

    /// Destination file or directory (default: paths.download_dir)
    #[arg(long = "out", short = 'O', value_name = "PATH")]
    pub out: Option<PathBuf>,
}

pub async fn run_show(args: ShowArgs, config: &DeckConfig) -> Result<()> {
    let api = connect(config)?;

    let text = if args.diagram {
        ui::with_spinner_async("Fetching diagram", "Diagram loaded", api.workflow_diagram(&args.filename))
            .await
            .context(format!("Failed to load diagram for {}", args.filename))?
    } else {
        let raw = ui::with_spinner_async("Fetching workflow", "Workflow loaded", api.workflow_json(&args.filename))
            .await
            .context(format!("Failed to load {}", args.filename))?;
        serde_json::to_string_pretty(&raw)?
    };

    println!("{}", sanitize_text(&text));

    if args.copy {
        let backend = clipboard::copy(&text)?;
        eprintln!("Copied to clipboard ({})", backend);
    }
    Ok(())
}

pub async fn run_download(args: DownloadArgs, config: &DeckConfig) -> Result<()> {
    let api = connect(config)?;
    let target = download_target(&args.filename, args.out.as_deref(), &config.download_dir());

    let body = ui::with_spinner_async("Downloading", "Downloaded", api.download(&args.filename))
        .await
        .context(format!("Failed to download {}", args.filename))?;

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .context(format!("Failed to create {:?}", parent))?;
    }
    tokio::fs::write(&target, &body)
        .await
        .context(format!("Failed to write {:?}", target))?;

    info!(filename = %args.filename, bytes = body.len(), target = %target.display(), "download saved");
    println!("{}", target.display());
    Ok(())
}
