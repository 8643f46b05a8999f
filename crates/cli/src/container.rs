//! Ephemeral Postgres container lifecycle via the docker CLI.
//!
//! One container per run. `start` returns a handle; once a handle exists the
//! caller is responsible for invoking [`PostgresContainer::cleanup`] exactly
//! once, whatever happens in between. If `start` itself fails there is
//! nothing to clean up.

use anyhow::{Context, Result};
use revive_core::config::{DatabaseConfig, ReadinessConfig};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Handle to a running Postgres container.
pub struct PostgresContainer {
    pub(crate) id: String,
    pub(crate) config: DatabaseConfig,
}

/// Arguments for `docker run` launching a detached Postgres instance.
fn run_args(config: &DatabaseConfig, version: &str) -> Vec<String> {
    vec![
        "run".to_string(),
        "-d".to_string(),
        "-e".to_string(),
        format!("POSTGRES_USER={}", config.user),
        "-e".to_string(),
        format!("POSTGRES_DB={}", config.database),
        "-e".to_string(),
        format!("POSTGRES_PASSWORD={}", config.password),
        "-p".to_string(),
        format!("{}:5432", config.port),
        format!("{}:{version}", config.image),
    ]
}

/// Arguments for the readiness probe inside the container.
fn probe_args(id: &str, config: &DatabaseConfig) -> Vec<String> {
    vec![
        "exec".to_string(),
        id.to_string(),
        "pg_isready".to_string(),
        "-U".to_string(),
        config.user.clone(),
        "-d".to_string(),
        config.database.clone(),
    ]
}

/// Arguments for the interactive SQL client fed over stdin.
fn restore_args(id: &str, config: &DatabaseConfig) -> Vec<String> {
    vec![
        "exec".to_string(),
        "-i".to_string(),
        id.to_string(),
        "psql".to_string(),
        "-d".to_string(),
        config.database.clone(),
        "-U".to_string(),
        config.user.clone(),
        "-h".to_string(),
        "localhost".to_string(),
        "-p".to_string(),
        "5432".to_string(),
    ]
}

impl PostgresContainer {
    /// Launch a detached `<image>:<version>` container publishing the
    /// configured host port.
    pub async fn start(config: &DatabaseConfig, version: &str) -> Result<Self> {
        let image = format!("{}:{version}", config.image);
        tracing::info!(image = %image, port = config.port, "Starting Postgres container");

        let output = Command::new("docker")
            .args(run_args(config, version))
            .output()
            .await
            .context("failed to spawn docker run (is docker on PATH?)")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("docker run failed for {image}: {}", stderr.trim());
        }

        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if id.is_empty() {
            anyhow::bail!("docker run returned no container id");
        }

        tracing::info!(container_id = %id, "Postgres container started");
        Ok(Self {
            id,
            config: config.clone(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Poll `pg_isready` inside the container until it accepts connections.
    ///
    /// Backs off exponentially between attempts; gives up after the
    /// configured attempt budget.
    pub async fn wait_ready(&self, readiness: &ReadinessConfig) -> Result<()> {
        for attempt in 0..readiness.max_attempts {
            let status = Command::new("docker")
                .args(probe_args(&self.id, &self.config))
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await
                .context("failed to spawn readiness probe")?;

            if status.success() {
                tracing::info!(container_id = %self.id, attempt, "Postgres is ready");
                return Ok(());
            }

            // No sleep after the final attempt; the bail below follows directly
            if attempt + 1 < readiness.max_attempts {
                let delay = readiness.delay_after(attempt);
                tracing::debug!(
                    container_id = %self.id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Postgres not ready yet"
                );
                tokio::time::sleep(delay).await;
            }
        }

        anyhow::bail!(
            "Postgres container {} did not become ready after {} attempts",
            self.id,
            readiness.max_attempts
        )
    }

    /// Pipe the full dump text into `psql` running inside the container.
    ///
    /// Stdout and stderr are both captured and included in the failure
    /// report when the client exits non-zero.
    pub async fn restore(&self, dump: &str) -> Result<()> {
        tracing::info!(container_id = %self.id, bytes = dump.len(), "Restoring dump");

        let mut child = Command::new("docker")
            .args(restore_args(&self.id, &self.config))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("failed to spawn psql inside the container")?;

        let mut stdin = child
            .stdin
            .take()
            .context("psql stdin handle unavailable")?;

        // Feed stdin while the output pipes are drained; psql stops reading
        // stdin once its stdout pipe fills, so writing the whole dump up
        // front can deadlock on large dumps.
        let (write_result, output) = tokio::join!(
            async move {
                stdin.write_all(dump.as_bytes()).await?;
                // Close stdin so psql sees EOF and finishes
                stdin.shutdown().await
            },
            child.wait_with_output(),
        );

        let output = output.context("psql did not exit cleanly")?;
        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "restore failed (psql exit {:?}):\n{}{}",
                output.status.code(),
                stdout,
                stderr
            );
        }
        // A write error only matters if psql did not already finish cleanly;
        // a broken pipe from an early psql failure is reported above instead.
        write_result.context("failed to write dump to psql stdin")?;

        tracing::info!(container_id = %self.id, "Dump restored");
        Ok(())
    }

    /// Stop and remove the container.
    pub async fn cleanup(&self) -> Result<()> {
        tracing::info!(container_id = %self.id, "Stopping Postgres container");
        let stop = Command::new("docker")
            .args(["stop", &self.id])
            .output()
            .await
            .context("failed to spawn docker stop")?;
        if !stop.status.success() {
            let stderr = String::from_utf8_lossy(&stop.stderr);
            anyhow::bail!("docker stop {} failed: {}", self.id, stderr.trim());
        }

        tracing::info!(container_id = %self.id, "Removing Postgres container");
        let rm = Command::new("docker")
            .args(["rm", &self.id])
            .output()
            .await
            .context("failed to spawn docker rm")?;
        if !rm.status.success() {
            let stderr = String::from_utf8_lossy(&rm.stderr);
            anyhow::bail!("docker rm {} failed: {}", self.id, stderr.trim());
        }

        tracing::info!(container_id = %self.id, "Postgres container removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> DatabaseConfig {
        DatabaseConfig::default()
    }

    #[test]
    fn run_args_publish_port_and_credentials() {
        let args = run_args(&test_config(), "14.9");
        assert_eq!(args[0], "run");
        assert!(args.contains(&"-d".to_string()));
        assert!(args.contains(&"POSTGRES_USER=postgres".to_string()));
        assert!(args.contains(&"POSTGRES_DB=postgres".to_string()));
        assert!(args.contains(&"POSTGRES_PASSWORD=postgres".to_string()));
        assert!(args.contains(&"5432:5432".to_string()));
        assert_eq!(args.last().unwrap(), "postgres:14.9");
    }

    #[test]
    fn run_args_respect_custom_port() {
        let config = DatabaseConfig {
            port: 15432,
            ..test_config()
        };
        let args = run_args(&config, "15.3");
        assert!(args.contains(&"15432:5432".to_string()));
    }

    #[test]
    fn probe_args_target_configured_database() {
        let args = probe_args("abc123", &test_config());
        assert_eq!(
            args,
            vec!["exec", "abc123", "pg_isready", "-U", "postgres", "-d", "postgres"]
        );
    }

    #[test]
    fn restore_args_run_psql_interactively() {
        let args = restore_args("abc123", &test_config());
        assert_eq!(args[0], "exec");
        assert_eq!(args[1], "-i");
        assert_eq!(args[2], "abc123");
        assert_eq!(args[3], "psql");
        assert!(args.windows(2).any(|w| w == ["-d", "postgres"]));
        assert!(args.windows(2).any(|w| w == ["-U", "postgres"]));
        assert!(args.windows(2).any(|w| w == ["-p", "5432"]));
    }
}
