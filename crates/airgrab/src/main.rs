//! # Airgrab
//! Watches the clipboard for Civitai AIR identifiers and downloads each
//! referenced model, with its preview images, into an organised tree.

mod clipboard;
mod progress;

use airgrab_civitai::{CivitaiClient, Settings};
use airgrab_core::{air, ResourceLocator};
use airgrab_stem::{handoff, source, Orchestrator};
use anyhow::{Context, Result};
use async_std::io::prelude::BufReadExt;
use async_std::task;
use clap::{Parser, Subcommand};
use colored::*;
use futures::channel::mpsc;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file [default: <config dir>/airgrab/config.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Download root, overrides the config file
    #[arg(long, global = true)]
    dir: Option<String>,
    /// Civitai API key, overrides the config file
    #[arg(long, global = true)]
    api_key: Option<String>,
    /// Give up on a single download after this many seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,
    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the clipboard and download every AIR copied to it (default)
    Watch {
        /// Read snippets from stdin, one per line, instead of the clipboard
        #[arg(long)]
        stdin: bool,
    },
    /// Download the given identifiers
    Get {
        /// AIR identifiers (urn:air:..., urn:... or air:...)
        #[arg(required = true)]
        airs: Vec<String>,
    },
    /// Parse identifiers and print their coordinates
    Parse {
        #[arg(required = true)]
        airs: Vec<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration
    Config,
}

#[async_std::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command.as_ref().unwrap_or(&Commands::Watch { stdin: false }) {
        Commands::Watch { stdin } => {
            let settings = load_settings(&cli)?;
            let snippets: BoxStream<'static, String> = if *stdin {
                println!("📋 Reading identifiers from {}", "stdin".cyan());
                async_std::io::BufReader::new(async_std::io::stdin())
                    .lines()
                    .filter_map(|line| async move { line.ok() })
                    .boxed()
            } else {
                println!("📋 Watching the clipboard for {} identifiers", "urn:air".cyan());
                clipboard::watch(settings.poll_interval())?.boxed()
            };
            run_pipeline(&settings, snippets, true).await?;
        }
        Commands::Get { airs } => {
            let settings = load_settings(&cli)?;
            run_pipeline(&settings, stream::iter(airs.clone()).boxed(), false).await?;
        }
        Commands::Parse { airs, json } => {
            let mut failures = 0;
            for input in airs {
                match air::parse(input) {
                    Ok(locator) if *json => println!("{}", serde_json::to_string_pretty(&locator)?),
                    Ok(locator) => print_locator(&locator),
                    Err(e) => {
                        eprintln!("❌ {}", e.to_string().red());
                        failures += 1;
                    }
                }
            }
            if failures > 0 {
                anyhow::bail!("{} identifier(s) could not be parsed", failures);
            }
        }
        Commands::Config => {
            let (settings, path) = resolve_settings(&cli)?;
            let settings = settings.redacted();
            println!("{} {}", "config:".bold(), path.display());
            println!("{} {}", "directory:".bold(), settings.download_root().display());
            println!("{} {}", "host:".bold(), settings.host);
            println!(
                "{} {}",
                "api key:".bold(),
                settings.api_key.as_deref().unwrap_or("(none)")
            );
            println!("{} {}ms", "poll interval:".bold(), settings.poll_interval().as_millis());
            match settings.item_timeout() {
                Some(limit) => println!("{} {}s", "item timeout:".bold(), limit.as_secs()),
                None => println!("{} none", "item timeout:".bold()),
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "info,surf=warn",
        1 => "debug,surf=info",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

/// Config file, then environment, then command line.
fn resolve_settings(cli: &Cli) -> Result<(Settings, PathBuf)> {
    let (settings, path) = match &cli.config {
        Some(path) => (Settings::load_from(path)?.with_env(), path.clone()),
        None => Settings::load()?,
    };

    let mut settings = settings.with_overrides(cli.api_key.clone(), cli.dir.clone());
    if let Some(secs) = cli.timeout {
        settings.item_timeout_secs = Some(secs);
    }
    Ok((settings, path))
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    log::info!("Loading config");
    let (settings, path) = resolve_settings(cli)?;
    log::debug!("Config loaded from {:?}", path);
    Ok(settings)
}

fn print_locator(locator: &ResourceLocator) {
    println!("{}", locator.to_string().cyan());
    println!("  ecosystem: {}", locator.ecosystem);
    println!("  type:      {}", locator.resource_type);
    println!("  source:    {}", locator.source);
    println!("  model:     {}", locator.model_id);
    match locator.version() {
        Some(version) => println!("  version:   {}", version),
        None => println!("  version:   {}", "latest".dimmed()),
    }
    println!("  format:    {}", locator.format().unwrap_or("-"));
}

/// Run the producer and the consumer side by side until both finish.
/// `filtered` applies the clipboard `urn:air` prefix filter.
async fn run_pipeline(
    settings: &Settings,
    snippets: BoxStream<'static, String>,
    filtered: bool,
) -> Result<()> {
    if !settings.has_api_key() {
        log::warn!("No API key defined in config. Some models require you to login, these will fail");
    }

    let root = settings.download_root();
    log::info!("Using directory: {:?}", root);
    std::fs::create_dir_all(&root)
        .with_context(|| format!("Failed to create download directory {:?}", root))?;

    let (events_tx, events_rx) = mpsc::unbounded();
    let orchestrator = Orchestrator::new(CivitaiClient::from_settings(settings), root)
        .with_item_timeout(settings.item_timeout())
        .with_events(events_tx);
    let (sender, receiver) = handoff();

    let display = task::spawn(progress::render(events_rx));
    let consumer = task::spawn(async move { orchestrator.run(receiver).await });
    let producer = task::spawn(async move {
        if filtered {
            source::watch(snippets, sender).await
        } else {
            source::forward(snippets, sender).await
        }
    });

    let (sources, summary) = futures::join!(producer, consumer);
    display.await;

    log::info!(
        "Done: {} snippet(s) seen, {} queued, {} rejected; {} downloaded, {} failed",
        sources.seen,
        sources.forwarded,
        sources.rejected,
        summary.completed,
        summary.failed
    );
    Ok(())
}
