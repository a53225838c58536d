use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flowdeck_core::prefs::PreferenceStore;
use flowdeck_core::DeckConfig;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show config file path
    Path,
    /// Print the effective configuration (file + environment)
    Show,
    /// Write a config file with the default values
    Init(InitArgs),
    /// Check the configuration for unusable values
    Validate,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Force overwrite existing config
    #[arg(long, short)]
    pub force: bool,
}

pub fn run_config(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show => run_show(),
        ConfigCommands::Init(args) => run_init(args),
        ConfigCommands::Validate => run_validate(),
    }
}

fn run_path() -> Result<()> {
    println!("{}", DeckConfig::config_path().display());
    Ok(())
}

fn run_show() -> Result<()> {
    let config = DeckConfig::load()?;
    let toml_str =
        toml::to_string_pretty(&config).context("Failed to serialize config to TOML")?;
    println!("{}", toml_str);

    let prefs = PreferenceStore::default();
    println!("# preferences: {}", prefs.path().display());
    println!("# theme = {:?}", prefs.load().theme.as_str());
    Ok(())
}

fn run_init(args: InitArgs) -> Result<()> {
    let config_path = DeckConfig::config_path();

    if config_path.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "Config already exists at {:?}\n\nUse --force to overwrite",
            config_path
        ));
    }

    DeckConfig::default().save_to(&config_path)?;

    println!("✅ Created config at: {:?}", config_path);
    println!("\nNext steps:");
    println!("  1. Edit the config: $EDITOR {:?}", config_path);
    println!("  2. Point api.base_url at your catalogue server");
    println!("  3. Run: flowdeck config validate");
    Ok(())
}

fn run_validate() -> Result<()> {
    println!("🔍 Validating configuration...");
    let config = DeckConfig::load()?;
    println!("   ✓ Config loaded");
    println!("   API: {}", config.api.base_url);
    println!(
        "   Page size: {} (category walk: {})",
        config.browse.page_size, config.browse.category_page_size
    );
    println!("   Downloads: {}", config.download_dir().display());
    println!("\n✅ Configuration valid!");
    Ok(())
}
