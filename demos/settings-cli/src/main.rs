//! Command-line demo reading and writing addon settings backed by JSON files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use addon_settings::prelude::*;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "settings-cli")]
#[command(about = "Inspect and change addon settings stored in JSON files")]
struct Cli {
    /// JSON object holding the default value of every option
    #[arg(long)]
    defaults: PathBuf,
    /// JSON file standing in for the synced storage scope
    #[arg(long)]
    sync: PathBuf,
    /// JSON file standing in for administrator policy
    #[arg(long)]
    managed: Option<PathBuf>,
    /// JSON file with cache configuration
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print one option, or every option when none is named
    Get { option: Option<String> },
    /// Store a value (given as JSON) for an option
    Set { option: String, value: String },
    /// Print default values
    Defaults { option: Option<String> },
    /// Check the defaults file against the authoring rules
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let defaults = Arc::new(load_defaults(&cli.defaults).await?);

    let config = match &cli.config {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            CacheConfig::from_json_str(&raw)?
        }
        None => CacheConfig::default(),
    };

    let mut storage = Storage::new(Arc::new(FileArea::sync(&cli.sync)));
    if let Some(path) = &cli.managed {
        storage = storage.with_managed(Arc::new(FileArea::managed(path)));
    }

    let cache = SettingsCache::builder(defaults)
        .with_storage(storage)
        .with_config(config)
        .start()?;

    match cli.command {
        Command::Get { option: Some(option) } => {
            print_json(&cache.get(&option).await?.into_json())?;
        }
        Command::Get { option: None } => {
            print_json(&addon_settings::primitives::option_map_to_json(
                &cache.get_all().await?,
            ))?;
        }
        Command::Set { option, value } => {
            let value: serde_json::Value = serde_json::from_str(&value)
                .with_context(|| format!("value for \"{option}\" is not valid JSON"))?;
            cache
                .set((option.as_str(), SettingValue::from(value)))
                .await?;
            info!(option, "option saved");
        }
        Command::Defaults { option: Some(option) } => {
            print_json(&cache.get_default_value(&option)?.into_json())?;
        }
        Command::Defaults { option: None } => {
            print_json(&addon_settings::primitives::option_map_to_json(
                &cache.default_values(),
            ))?;
        }
        Command::Validate => {
            cache.defaults().validate()?;
            info!(options = cache.defaults().len(), "defaults are valid");
        }
    }

    Ok(())
}

async fn load_defaults(path: &Path) -> Result<DefaultsTable> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let document: serde_json::Value = serde_json::from_slice(&raw)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(DefaultsTable::from_json(document)?)
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
