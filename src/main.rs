use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use m3u_aggregator::{
    config::Config,
    pipeline::{write_playlist, PlaylistOrchestrator, SourceOutcome},
    utils::StandardHttpClient,
};

#[derive(Parser)]
#[command(name = "m3u-aggregator")]
#[command(version)]
#[command(about = "Merge, filter and rewrite M3U playlists from many sources")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Output playlist path (overrides config file)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Write the playlist to stdout instead of a file
    #[arg(long)]
    stdout: bool,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so --stdout output stays a clean playlist
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("m3u_aggregator={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting M3U Aggregator v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;
    info!(
        "Configuration loaded from: {} ({} sources)",
        cli.config,
        config.sources.len()
    );

    if let Some(output) = cli.output {
        config.output.path = output;
    }

    if cli.check {
        info!("Configuration is valid");
        return Ok(());
    }

    if config.sources.is_empty() {
        warn!("No sources configured, the playlist will only contain a header");
    }

    let fetcher = StandardHttpClient::new(
        &config.fetch.user_agent,
        config.fetch.connect_timeout_duration()?,
    )?;
    let orchestrator = PlaylistOrchestrator::from_config(&config, Arc::new(fetcher))?;

    let run = orchestrator.run().await;

    for source in run.report.skipped_sources() {
        match &source.outcome {
            SourceOutcome::FetchFailed { error } => {
                warn!("Source '{}' skipped: {}", source.name, error)
            }
            SourceOutcome::Empty { .. } => {
                warn!("Source '{}' contributed no entries", source.name)
            }
            SourceOutcome::Included { .. } => {}
        }
    }

    if cli.stdout {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(run.content.as_bytes())?;
        stdout.flush()?;
    } else {
        write_playlist(&config.output.path, &run.content).await?;
    }

    info!(
        "Done: {} entries from {} of {} sources",
        run.report.total_entries(),
        run.report.included_sources(),
        run.report.sources.len()
    );

    Ok(())
}
