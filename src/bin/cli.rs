//! compwatch CLI
//!
//! Local execution entry point, typically run from a scheduler.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use compwatch::{
    error::Result,
    models::Config,
    notify::{DiscordSink, LogSink, NotificationSink},
    pipeline::{self, NotificationPolicy, WatchContext},
    services::{CompetitionApi, directory},
    storage::{LocalStorage, SnapshotStore},
    utils::http,
};

/// compwatch - WCA competition registry watcher
#[derive(Parser, Debug)]
#[command(
    name = "compwatch",
    version,
    about = "Announces nearby competitions, club registrations and registration windows"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "compwatch.toml")]
    config: PathBuf,

    /// Snapshot directory (overrides storage.dir)
    #[arg(short, long)]
    storage_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one watch pass
    Run {
        /// Log notifications instead of posting them to Discord
        #[arg(long)]
        log_only: bool,
    },

    /// Validate the configuration
    Validate,

    /// Show current snapshot info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env();
    log::debug!("Loaded configuration from {}", cli.config.display());

    let storage_dir = cli
        .storage_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.storage.dir));
    let storage = LocalStorage::new(&storage_dir);

    match cli.command {
        Command::Run { log_only } => {
            config.validate()?;

            let api = CompetitionApi::from_config(&config.api)?;
            let client = http::create_async_client(&config.api)?;
            let members = directory::from_config(client.clone(), &config.directory);
            let sink: Box<dyn NotificationSink> = if log_only {
                Box::new(LogSink)
            } else {
                Box::new(DiscordSink::from_config(client, &config.discord)?)
            };
            let policy = NotificationPolicy::from_config(&config.watch, &config.api.site_url);

            let ctx = WatchContext {
                api: &api,
                store: &storage,
                directory: members.as_ref(),
                sink: sink.as_ref(),
                policy: &policy,
                closing_window: config.watch.closing_window(),
            };

            if let Err(e) = pipeline::run_watch(&ctx, Utc::now()).await {
                log::error!("Watch run failed: {}", e);
                return Err(e);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            if config.discord.bot_token.is_none() || config.discord.channel_id.is_none() {
                log::warn!("Discord is not configured; only `run --log-only` will work");
            }
            log::info!("✓ Config OK");
        }

        Command::Info => {
            log::info!("Storage directory: {}", storage_dir.display());

            match storage.last_run().await? {
                Some(at) => log::info!("Last run: {}", at.to_rfc3339()),
                None => log::info!("No run recorded yet."),
            }

            let snapshot = storage.load_snapshot().await?;
            log::info!(
                "Snapshot: {} competitions, {} registration states",
                snapshot.competitions.len(),
                snapshot.registration_states.len()
            );
        }
    }

    Ok(())
}
