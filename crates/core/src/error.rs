//! Error types for the decode pipeline.

use thiserror::Error;

/// Errors produced while decoding a dump or extracting its version.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("gzip decompression failed: {0}")]
    Gunzip(#[source] std::io::Error),

    #[error("decompressed dump is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::string::FromUtf8Error),

    #[error("dump does not contain a \"{marker}\" header", marker = crate::VERSION_MARKER.trim_end())]
    VersionNotFound,
}

/// Result type alias for decode operations.
pub type Result<T> = std::result::Result<T, DumpError>;
