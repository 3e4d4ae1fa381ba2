//! # Verigov Lookup CLI
//!
//! Resolve CNPJs from the command line, inline or through the job tracker,
//! and check configuration before deploying it.

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::error;

use verigov_lookup::{logging, ConfigLoader, JobStatus, LookupConfig, LookupSystem};

#[derive(Parser)]
#[command(name = "verigov-lookup")]
#[command(about = "Resilient CNPJ registry lookups")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration file (default: config/verigov.toml, or $VERIGOV_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Skip registries and answer with placeholder records
    #[arg(long, global = true)]
    mock_only: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up identifiers and print one JSON line per identifier
    Lookup {
        #[arg(required = true)]
        identifiers: Vec<String>,

        /// Run each lookup as a background job and print the final job record
        #[arg(long = "async")]
        run_async: bool,

        /// Print the summary projection instead of the full record
        #[arg(long, conflicts_with = "run_async")]
        summary: bool,

        /// Seconds to wait for each job (with --async)
        #[arg(long, default_value_t = 60)]
        wait_seconds: u64,

        /// Milliseconds between job status polls (with --async)
        #[arg(long, default_value_t = 250)]
        poll_ms: u64,
    },

    /// Load and validate configuration, then print it
    Validate,

    /// Probe the store and print circuit breaker state; exits 1 when unhealthy
    Health,
}

#[tokio::main]
async fn main() {
    logging::init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!(error = %e, "Command failed");
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(&cli)?;
    if cli.mock_only {
        config.providers.mock_only = true;
    }

    match cli.command {
        Commands::Validate => {
            config.validate()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Health => {
            let system = LookupSystem::bootstrap(config).await?;
            let health = system.health().await;
            system.shutdown().await;
            println!("{}", serde_json::to_string_pretty(&health)?);
            anyhow::ensure!(health.healthy, "system unhealthy");
            Ok(())
        }
        Commands::Lookup {
            identifiers,
            run_async,
            summary,
            wait_seconds,
            poll_ms,
        } => {
            let system = LookupSystem::bootstrap(config).await?;
            let failures = if run_async {
                anyhow::ensure!(
                    system.store().is_enabled(),
                    "--async needs a reachable store, job state lives there"
                );
                submit_all(
                    &system,
                    &identifiers,
                    Duration::from_millis(poll_ms),
                    Duration::from_secs(wait_seconds),
                )
                .await?
            } else {
                lookup_all(&system, &identifiers, summary).await?
            };
            system.shutdown().await;
            anyhow::ensure!(failures == 0, "{failures} lookup(s) failed");
            Ok(())
        }
    }
}

async fn lookup_all(
    system: &LookupSystem,
    identifiers: &[String],
    summary: bool,
) -> anyhow::Result<usize> {
    let mut failures = 0usize;
    for identifier in identifiers {
        match system.lookup().lookup(identifier).await {
            Ok(record) if summary => println!("{}", serde_json::to_string(&record.summary())?),
            Ok(record) => println!("{}", serde_json::to_string(&record)?),
            Err(e) => {
                failures += 1;
                println!(
                    "{}",
                    json!({ "identifier": identifier, "error": e.to_string(), "kind": e.kind() })
                );
            }
        }
    }
    Ok(failures)
}

async fn submit_all(
    system: &LookupSystem,
    identifiers: &[String],
    poll_interval: Duration,
    deadline: Duration,
) -> anyhow::Result<usize> {
    let mut job_ids = Vec::with_capacity(identifiers.len());
    for identifier in identifiers {
        job_ids.push(system.jobs().enqueue(identifier).await?);
    }

    let mut failures = 0usize;
    for job_id in &job_ids {
        match system
            .jobs()
            .wait_for_terminal(job_id, poll_interval, deadline)
            .await
        {
            Ok(job) => {
                if job.status == JobStatus::Error {
                    failures += 1;
                }
                println!("{}", serde_json::to_string(&job)?);
            }
            Err(e) => {
                failures += 1;
                println!("{}", json!({ "job_id": job_id, "error": e.to_string() }));
            }
        }
    }
    Ok(failures)
}

fn load_config(cli: &Cli) -> anyhow::Result<LookupConfig> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from(Some(path.as_path()))
            .with_context(|| format!("loading {}", path.display()))?,
        None => ConfigLoader::load().context("loading configuration")?,
    };
    Ok(config)
}
