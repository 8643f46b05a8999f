//! Dump decoding and version extraction.
//!
//! The challenge service delivers a `pg_dump` export as a gzip stream wrapped
//! in base64. `decode` reverses both layers; `extract_version` pulls the
//! server version out of the dump header so the caller can launch a matching
//! Postgres image.

use crate::error::{DumpError, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flate2::read::GzDecoder;
use regex::Regex;
use std::io::Read;
use std::sync::OnceLock;

/// Decode a base64-wrapped gzip payload into SQL text.
///
/// Every layer failure maps to a distinct [`DumpError`] variant so the caller
/// can report exactly which stage rejected the payload.
pub fn decode(encoded: &str) -> Result<String> {
    let compressed = STANDARD.decode(encoded.trim())?;

    let mut decoder = GzDecoder::new(compressed.as_slice());
    let mut bytes = Vec::new();
    decoder
        .read_to_end(&mut bytes)
        .map_err(DumpError::Gunzip)?;

    Ok(String::from_utf8(bytes)?)
}

fn version_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!("{}([0-9][0-9.]*)", regex::escape(crate::VERSION_MARKER));
        Regex::new(&pattern).expect("version pattern is a valid regex")
    })
}

/// Extract the first server version following the dump header marker.
///
/// Returns [`DumpError::VersionNotFound`] when the marker is absent instead
/// of panicking on an empty match list.
pub fn extract_version(dump: &str) -> Result<&str> {
    version_pattern()
        .captures(dump)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or(DumpError::VersionNotFound)
}
