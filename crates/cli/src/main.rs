//! Challenge runner for the backup_restore workflow.
//!
//! Linear pipeline: fetch encoded dump → decode → extract version → start a
//! matching Postgres container → restore → query → submit → cleanup. The
//! container is cleaned up exactly once on every path after it exists; a
//! provisioning failure leaves nothing to clean up.

mod api_client;
mod container;
mod db;

use anyhow::{Context, Result};
use api_client::ApiClient;
use clap::Parser;
use container::PostgresContainer;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use revive_core::config::AppConfig;
use revive_core::dump;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Restore a PostgreSQL dump into a throwaway container and report the result
#[derive(Parser, Debug)]
#[command(name = "revive")]
#[command(version, about, long_about = None)]
struct Args {
    /// Access token for the challenge service
    access_token: String,

    /// Path to configuration file (optional; defaults cover everything)
    #[arg(
        short,
        long,
        env = "REVIVE_CONFIG",
        default_value = "config/revive.toml"
    )]
    config: String,
}

fn load_config(path: &str) -> Result<AppConfig> {
    let mut figment = Figment::new();
    if std::path::Path::new(path).exists() {
        tracing::info!(config_path = %path, "Loading configuration from file");
        figment = figment.merge(Toml::file(path));
    }
    figment
        .merge(Env::prefixed("REVIVE_").split("__"))
        .extract()
        .context("failed to load configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = load_config(&args.config)?;

    let client = ApiClient::new(&config.service.base_url, &args.access_token)?;

    let problem = client.fetch_problem().await?;
    let dump_text = dump::decode(&problem.dump).context("failed to decode dump payload")?;
    let version = dump::extract_version(&dump_text)?;
    tracing::info!(version, "Extracted dump server version");

    // Provisioning failure propagates here, before any cleanup obligation
    let container = PostgresContainer::start(&config.database, version).await?;

    // Everything after acquisition runs with its result captured so the
    // container is always stopped and removed, exactly once.
    let outcome = run_challenge(&client, &container, &config, &dump_text).await;

    if let Err(err) = container.cleanup().await {
        tracing::warn!(container_id = %container.id(), error = %err, "Container cleanup failed");
    }

    let response = outcome?;
    println!("{response}");
    Ok(())
}

/// Readiness, restore, query and submit — the phases that run between
/// container acquisition and cleanup.
async fn run_challenge(
    client: &ApiClient,
    container: &PostgresContainer,
    config: &AppConfig,
    dump_text: &str,
) -> Result<String> {
    container.wait_ready(&config.readiness).await?;
    container.restore(dump_text).await?;

    let solution = db::fetch_alive_ssns(&config.database).await?;
    client.submit_solution(&solution).await
}
