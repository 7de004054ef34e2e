//! Error types for the Ergast client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the resource does not exist" from "the server returned an unexpected
//! status." All other non-200 responses land in `HttpError` with the raw
//! status code and body for debugging. Transport failures keep the underlying
//! ureq error so nothing is lost on the way up.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by `ErgastClient` parse methods and `Session` calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-success status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The request never produced a response (DNS, connect, TLS, I/O).
    #[error("transport failed: {0}")]
    Transport(#[from] ureq::Error),

    /// The body is not an `MRData` payload of the expected shape.
    #[error("decoding failed: {0}")]
    Decode(String),

    /// The payload was well formed but reported zero matching records.
    #[error("the output for the provided query parameters is empty")]
    EmptyResult,

    /// The configured cache directory does not exist.
    #[error("cache directory does not exist: {}", .0.display())]
    CacheDirectory(PathBuf),

    /// A configuration file could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}
