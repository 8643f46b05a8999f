//! Core domain logic for the revive challenge runner.
//!
//! This crate holds everything that does not touch the network or a
//! subprocess:
//! - Dump decoding (base64 + gzip) and version extraction
//! - Configuration types shared with the CLI
//! - Typed errors for the decode pipeline

pub mod config;
pub mod dump;
pub mod error;

pub use config::{AppConfig, DatabaseConfig, ReadinessConfig, ServiceConfig};
pub use error::{DumpError, Result};

/// Marker that precedes the server version in a `pg_dump` header.
pub const VERSION_MARKER: &str = "Dumped from database version ";
