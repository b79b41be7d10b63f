//! Error types for the scan engine.

use thiserror::Error;

use dtv_si::SiError;

/// Errors produced while scanning a transponder.
///
/// A timeout on one table is not fatal to the scan; a tune failure is.
#[derive(Debug, Error)]
pub enum ScanError {
    /// No section arrived within the allotted time.
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    /// The frontend could not lock on the transponder.
    #[error("tuning failed: {0}")]
    TuneFailure(String),

    /// The abort flag was raised mid scan.
    #[error("scan aborted")]
    Aborted,

    /// A section filter could not be opened.
    #[error("section filter: {0}")]
    Filter(String),

    /// A table failed to decode.
    #[error(transparent)]
    Si(#[from] SiError),

    #[error("config: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("config parse: {0}")]
    Toml(#[from] toml::de::Error),
}
