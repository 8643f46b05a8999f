//! Configuration types shared between the core crate and the CLI.
//!
//! All fields carry serde defaults so the binary runs without any config
//! file; a TOML file and `REVIVE_`-prefixed environment variables can
//! override individual values.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Challenge service endpoint configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the challenge service.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Ephemeral database configuration.
///
/// The same credentials are used to provision the container, to run `psql`
/// inside it, and to connect from the host, so they live in one place.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Docker image name (the extracted dump version becomes the tag).
    #[serde(default = "default_image")]
    pub image: String,
    /// Superuser name.
    #[serde(default = "default_postgres")]
    pub user: String,
    /// Superuser password.
    #[serde(default = "default_postgres")]
    pub password: String,
    /// Database name to create and restore into.
    #[serde(default = "default_postgres")]
    pub database: String,
    /// Host to connect to for the query step.
    #[serde(default = "default_host")]
    pub host: String,
    /// Published host port (the container's 5432 is mapped here).
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Readiness polling configuration.
///
/// Replaces a fixed post-launch sleep: the container is probed with
/// `pg_isready` until it accepts connections or the attempt budget runs out.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReadinessConfig {
    /// Maximum number of probe attempts before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Upper bound on the backoff delay, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl ReadinessConfig {
    /// Backoff delay after the given zero-based attempt: doubles from the
    /// initial delay, capped at the configured maximum.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.min(16);
        let millis = self
            .initial_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(millis)
    }
}

/// Top-level application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    pub readiness: ReadinessConfig,
}

fn default_base_url() -> String {
    "https://hackattic.com".to_string()
}

fn default_image() -> String {
    "postgres".to_string()
}

fn default_postgres() -> String {
    "postgres".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_max_attempts() -> u32 {
    15
}

fn default_initial_delay_ms() -> u64 {
    250
}

fn default_max_delay_ms() -> u64 {
    4000
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            image: default_image(),
            user: default_postgres(),
            password: default_postgres(),
            database: default_postgres(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}
