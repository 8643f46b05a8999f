//! Query step: pull the alive SSNs out of the restored database.

use crate::api_client::Solution;
use anyhow::{Context, Result};
use revive_core::config::DatabaseConfig;
use sqlx::Row;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

const ALIVE_SSNS_QUERY: &str = "select ssn from public.criminal_records where status='alive'";

/// Connect to the restored instance and run the fixed challenge query.
///
/// Row order is whatever the server returns; the challenge payload carries it
/// through unchanged. Any connection or query error fails the run — this
/// stage is as loud as every other one.
pub async fn fetch_alive_ssns(config: &DatabaseConfig) -> Result<Solution> {
    let options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.database);

    tracing::info!(
        host = %config.host,
        port = config.port,
        database = %config.database,
        "Connecting to restored database"
    );

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .context("failed to connect to the restored database")?;

    let rows = sqlx::query(ALIVE_SSNS_QUERY)
        .fetch_all(&pool)
        .await
        .context("alive SSN query failed")?;

    let mut alive_ssns = Vec::with_capacity(rows.len());
    for row in &rows {
        alive_ssns.push(row.try_get::<String, _>("ssn")?);
    }

    pool.close().await;

    tracing::info!(count = alive_ssns.len(), "Fetched alive SSNs");
    Ok(Solution { alive_ssns })
}
