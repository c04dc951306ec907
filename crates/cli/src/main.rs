mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reflac_core::encoder::flac::probe_version;
use reflac_core::{
    discover, exit_code, load_config, policy_for, validate_config, BatchDriver, BatchOutcome,
    BatchProgress, Config, ConfigError, JobPool,
};

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            exit_code::ERROR
        }
    };
    std::process::exit(code);
}

fn init_logging(verbose: bool, json: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Progress goes to stdout, logs to stderr.
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> Result<i32> {
    // Load configuration
    let config = match configure(&cli) {
        Ok(config) => config,
        Err(ConfigError::InvalidParallelism(value)) => {
            error!(
                "Invalid number of parallel jobs: {} (must be a positive integer)",
                value
            );
            return Ok(exit_code::INVALID_PARALLELISM);
        }
        Err(e) => return Err(e).context("Failed to load configuration"),
    };

    info!("Folder: {}", config.discovery.folder.display());
    info!("Parallel jobs: {}", config.pool.jobs);
    info!("Verify: {}", config.encoder.verify);

    let version = probe_version(&config.encoder)
        .await
        .with_context(|| format!("Cannot run {:?}", config.encoder.flac_path))?;
    info!("Encoder: {}", version);

    let files = discover(&config.discovery)
        .await
        .context("Failed to discover files")?;
    if files.is_empty() {
        info!("Nothing to re-encode");
    }

    let pool = JobPool::new(config.encoder.clone(), policy_for(config.pool.on_failure));
    let mut driver = BatchDriver::new(pool, &config.pool)
        .with_root(config.discovery.folder.clone())
        .with_progress(Arc::new(|progress: &BatchProgress| {
            println!("{}", progress);
        }));

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Interrupt received, waiting for running encoders to finish...");
        signal_token.cancel();
    });

    let outcome = driver
        .run(&files, &cancel)
        .await
        .context("Batch stopped on an internal error")?;

    report(&outcome, cli.json_summary)?;
    Ok(outcome.exit_code())
}

/// Defaults, config file, environment, then flags.
fn configure(cli: &Cli) -> Result<Config, ConfigError> {
    let mut config = load_config(cli.config.as_deref())?;
    cli.apply(&mut config)?;
    validate_config(&config)?;
    Ok(config)
}

fn report(outcome: &BatchOutcome, json: bool) -> Result<()> {
    let summary = outcome.summary();
    match outcome {
        BatchOutcome::Completed(_) => info!(
            "Done: {} of {} file(s) re-encoded, {} retried, {} skipped",
            summary.stats.succeeded,
            summary.total,
            summary.stats.retried,
            summary.skipped.len()
        ),
        BatchOutcome::Aborted(_) => warn!(
            "Aborted after submitting {} of {} file(s)",
            summary.submitted, summary.total
        ),
        BatchOutcome::Failed { path, .. } => match path {
            Some(path) => error!("Stopped: '{}' could not be re-encoded", path.display()),
            None => error!("Stopped: a failure could not be resolved"),
        },
        BatchOutcome::Interrupted(_) => warn!(
            "Interrupted after submitting {} of {} file(s)",
            summary.submitted, summary.total
        ),
    }

    for path in &summary.skipped {
        warn!("Skipped: {}", path.display());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    }
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
