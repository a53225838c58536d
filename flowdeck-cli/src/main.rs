//! flowdeck CLI - browse a workflow catalogue from the terminal
//!
//! Entry point for the `flowdeck` binary:
//! - Interactive browser (default, `tui` subcommand)
//! - One-shot listing, stats and category queries
//! - Raw JSON / diagram preview and file download for a single workflow
//! - Config file management and shell completions

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use flowdeck_core::DeckConfig;
use tracing::info;

mod clipboard;
mod commands;
mod config;
mod tracing_setup;
mod tui;
mod ui;

#[derive(Parser, Debug)]
#[command(
    name = "flowdeck",
    author,
    version,
    about = "Browse, filter and preview workflows from a catalogue API",
    long_about = "Search a workflow catalogue by text, trigger, complexity, category and \
                  status; page through results; and preview raw JSON or diagrams. \
                  Runs an interactive browser when no subcommand is given."
)]
struct Cli {
    /// Suppress progress spinners (for scripts)
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Catalogue API base URL (overrides config and FLOWDECK_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive browser (default)
    Tui,
    /// List workflows matching filters
    List(commands::browse::ListArgs),
    /// Show catalogue statistics
    Stats(commands::browse::OutputArgs),
    /// List categories with mapped workflow counts
    Categories(commands::browse::OutputArgs),
    /// Print a workflow's raw JSON or diagram
    Show(commands::workflow::ShowArgs),
    /// Download a workflow file
    Download(commands::workflow::DownloadArgs),
    /// Manage flowdeck configuration (path, show, init, validate)
    Config(config::ConfigArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun, not a suffix
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// Config file, then env overrides, then `--api-url`
fn load_config(api_url: Option<String>) -> Result<DeckConfig> {
    let mut config = DeckConfig::load()?;
    if let Some(url) = api_url {
        config.api.base_url = url;
        config.validate()?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let Cli {
        quiet,
        debug,
        api_url,
        command,
    } = Cli::parse();
    ui::init_quiet_mode(quiet);

    let command = command.unwrap_or(Commands::Tui);
    if !matches!(command, Commands::Tui) {
        tracing_setup::init(&tracing_setup::TracingConfig {
            debug,
            log_file: None,
        })
        .ok();
    }

    match command {
        Commands::Tui => {
            let config = load_config(api_url)?;
            // stderr belongs to the alternate screen from here on
            tracing_setup::init(&tracing_setup::TracingConfig {
                debug,
                log_file: Some(config.log_path()),
            })
            .ok();
            info!(base_url = %config.api.base_url, "starting browser");
            let handle = tokio::runtime::Handle::current();
            tokio::task::block_in_place(|| tui::run(config, handle))
        }
        Commands::List(args) => commands::run_list(args, &load_config(api_url)?).await,
        Commands::Stats(args) => commands::run_stats(args, &load_config(api_url)?).await,
        Commands::Categories(args) => {
            commands::run_categories(args, &load_config(api_url)?).await
        }
        Commands::Show(args) => commands::run_show(args, &load_config(api_url)?).await,
        Commands::Download(args) => commands::run_download(args, &load_config(api_url)?).await,
        Commands::Config(args) => config::run_config(args),
        Commands::Completions(args) => run_completions(args),
    }
}

fn run_completions(args: CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());
    Ok(())
}
