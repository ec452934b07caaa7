//! feedsplit CLI
//!
//! Local execution entry point: serve the per-show feeds over HTTP, or run a
//! single split and write or list the result.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use feedsplit::{
    error::Result,
    models::{Config, Snapshot},
    pipeline,
    services::TitleClassifier,
    storage::{FeedStorage, LocalStorage},
    utils::http,
};

/// feedsplit - Podcast Feed Splitter
#[derive(Parser, Debug)]
#[command(
    name = "feedsplit",
    version,
    about = "Splits an aggregated podcast feed into one feed per show"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "feedsplit.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Keep the feeds refreshed and serve them over HTTP
    #[cfg(feature = "server")]
    Serve {
        /// Address to listen on (overrides server.addr)
        #[arg(long)]
        addr: Option<String>,

        /// Source feed URL (overrides source.url)
        #[arg(long)]
        url: Option<String>,

        /// Seconds between refreshes (overrides refresh.interval_secs)
        #[arg(long)]
        refresh: Option<u64>,

        /// Also mirror every snapshot into this directory
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Split the feed once and write one `<slug>.xml` per show
    Split {
        /// Source feed URL (overrides source.url)
        #[arg(long)]
        url: Option<String>,

        /// Directory to write the feeds into
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Split the feed once and list the shows found
    Shows {
        /// Source feed URL (overrides source.url)
        #[arg(long)]
        url: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging with `level` unless `RUST_LOG` is set.
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Fetch the source feed once and split it.
async fn split_once(config: &Config) -> Result<Snapshot> {
    let client = http::create_client(&config.source)?;
    let classifier = TitleClassifier::from_rules(&config.shows)?;

    log::info!("Fetching {}", config.source.url);
    let data = http::fetch_feed(&client, &config.source.url, config.source.timeout_secs).await?;
    pipeline::split_feed(&data, &classifier)
}

#[cfg(feature = "server")]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down...");
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load(&cli.config);
    let level = match (&loaded, cli.verbose) {
        (_, true) => "debug".to_string(),
        (Ok(config), false) => config.logging.level.clone(),
        (Err(_), false) => Config::default().logging.level,
    };
    init_logging(&level);

    let mut config = match loaded {
        Ok(config) => {
            log::info!("Loaded configuration from {}", cli.config.display());
            config
        }
        Err(e) if cli.config.exists() => {
            log::warn!(
                "Config load failed from {}: {}. Using defaults.",
                cli.config.display(),
                e
            );
            Config::default()
        }
        Err(_) => {
            log::debug!("No config at {}, using defaults", cli.config.display());
            Config::default()
        }
    };

    match cli.command {
        #[cfg(feature = "server")]
        Command::Serve {
            addr,
            url,
            refresh,
            output,
        } => {
            use feedsplit::{pipeline::Refresher, server, storage::FeedRegistry};

            if let Some(addr) = addr {
                config.server.addr = addr;
            }
            if let Some(url) = url {
                config.source.url = url;
            }
            if let Some(secs) = refresh {
                config.refresh.interval_secs = secs;
            }
            if let Some(dir) = output {
                config.output.dir = Some(dir.display().to_string());
            }
            config.validate()?;

            let registry = Arc::new(FeedRegistry::new());
            let mut refresher = Refresher::new(&config, Arc::clone(&registry))?;
            if let Some(dir) = &config.output.dir {
                log::info!("Mirroring feeds to {}", dir);
                refresher = refresher.with_mirror(Arc::new(LocalStorage::new(dir)));
            }

            let listener = tokio::net::TcpListener::bind(config.server.socket_addr()?).await?;
            log::info!(
                "Serving {} (refresh every {}s)",
                config.source.url,
                config.refresh.interval_secs
            );

            let refresher = Arc::new(refresher);
            let refresh_task = tokio::spawn(async move { refresher.run().await });

            server::serve(listener, registry, shutdown_signal()).await?;
            refresh_task.abort();
        }

        Command::Split { url, output } => {
            if let Some(url) = url {
                config.source.url = url;
            }
            config.validate()?;

            let snapshot = split_once(&config).await?;
            let storage = LocalStorage::new(&output);
            let summary = storage.write_snapshot(&snapshot).await?;

            log::info!(
                "Wrote {} feeds to {} ({} stale removed, {} episodes dropped)",
                summary.written,
                summary.location,
                summary.removed,
                snapshot.stats.unclassified
            );
        }

        Command::Shows { url, json } => {
            if let Some(url) = url {
                config.source.url = url;
            }
            config.validate()?;

            let snapshot = split_once(&config).await?;
            let shows: Vec<_> = snapshot.feeds().map(|feed| feed.summary()).collect();

            if json {
                let report = serde_json::json!({
                    "shows": shows,
                    "stats": snapshot.stats,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for show in &shows {
                    println!(
                        "{:<32} {:<40} {:>4}  {}",
                        show.slug,
                        show.title,
                        show.episodes,
                        show.pub_date.to_rfc2822()
                    );
                }
                println!(
                    "{} shows, {} episodes, {} unclassified",
                    snapshot.stats.shows, snapshot.stats.episodes, snapshot.stats.unclassified
                );
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            TitleClassifier::from_rules(&config.shows)?;
            log::info!("✓ Config OK ({} show rules)", config.shows.len());

            log::info!("All validations passed!");
        }
    }

    Ok(())
}
