//! Error types for tender-sweep
//!
//! This module provides the error hierarchy used across the harvester:
//! - [`Error`], the crate-wide error returned by fallible operations
//! - [`CaptureError`], failures while downloading an attachment or rendering a snapshot
//! - [`ExtractionError`], failures of the table extraction strategies
//!
//! Miss and storage-full conditions are not errors. They are reported through
//! [`IdOutcome`](crate::types::IdOutcome) so the sweep controller can drive its
//! state machine without inspecting error values.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tender-sweep operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tender-sweep
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_bytes")
        key: Option<String>,
    },

    /// A configured regular expression failed to compile
    #[error("invalid pattern for {key}: {reason}")]
    InvalidPattern {
        /// The configuration key holding the pattern
        key: String,
        /// Compiler error message
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// URL could not be parsed or joined
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Capture error (attachment download or page rendering)
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),

    /// Table extraction error
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Archive could not be written
    #[error("failed to archive {path}: {reason}")]
    Archive {
        /// The artifact that was being archived
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },
}

impl Error {
    /// Shorthand for a [`Error::Config`] bound to a configuration key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

/// Capture errors (attachment download, snapshot rendering)
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Attachment download failed
    #[error("download of {url} failed: {reason}")]
    DownloadFailed {
        /// The attachment URL
        url: String,
        /// The reason the download failed
        reason: String,
    },

    /// Renderer was available but rendering the page failed
    #[error("rendering {url} failed: {reason}")]
    RenderFailed {
        /// The page URL
        url: String,
        /// The reason rendering failed
        reason: String,
    },

    /// No rendering capability is installed
    #[error("renderer unavailable: {0}")]
    RendererUnavailable(String),
}

/// Table extraction errors
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// A single strategy failed to run or to parse its engine's output
    #[error("{strategy} extraction failed: {reason}")]
    StrategyFailed {
        /// Strategy name (e.g. "tabula-lattice")
        strategy: &'static str,
        /// The reason the strategy failed
        reason: String,
    },

    /// A strategy ran but found no tables
    #[error("no tables found in {pdf}")]
    NoTables {
        /// The document that was searched
        pdf: PathBuf,
    },

    /// Extraction was requested for a snapshot capture
    #[error("{path} is not an attachment capture")]
    NotAnAttachment {
        /// The snapshot path
        path: PathBuf,
    },

    /// Every strategy in the chain failed or came back empty
    #[error("all extraction strategies failed for {pdf}")]
    Exhausted {
        /// The document that was searched
        pdf: PathBuf,
    },
}
