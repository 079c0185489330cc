mod enrich;
mod harvest;
mod schedule;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tickerpulse_storage::FsObjectStore;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tickerpulse")]
#[command(about = "Harvest trending-ticker posts and enrich them with sentiment")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one harvest cycle and print its report
    Harvest,
    /// Enrich raw partitions named by a notification batch, or all pending ones
    Enrich {
        /// Path to a notification batch JSON file, or `-` for stdin
        #[arg(long, conflicts_with = "pending", required_unless_present = "pending")]
        event: Option<PathBuf>,
        /// Process every raw partition currently in the source bucket
        #[arg(long)]
        pending: bool,
    },
    /// Harvest on the configured cron schedule, enriching after each cycle
    Schedule,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = tickerpulse_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let store = FsObjectStore::new(config.storage_root.clone());

    match cli.command {
        Commands::Harvest => {
            let report = harvest::run_harvest(&config, &store).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Enrich { event, pending } => {
            let event = if pending {
                enrich::pending_event(&config, &store).await?
            } else if let Some(path) = event {
                enrich::read_event(&path).await?
            } else {
                anyhow::bail!("either --event or --pending is required");
            };
            let report = enrich::run_enrich(&config, &store, &event).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Schedule => schedule::run_schedule(config, store).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests;
