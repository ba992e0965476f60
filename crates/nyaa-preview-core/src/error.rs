//! Error types for the hover preview engine
//!
//! This module defines all error types used throughout the library.
//! PreviewError implements Serialize for Tauri compatibility.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Reason a remote fetch did not produce a usable response.
///
/// Each reason is distinct so callers can tell an intentional abort
/// apart from a real failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// Server answered with a non-2xx status
    #[error("request failed with status: {0}")]
    Status(u16),

    /// Connection, TLS or body decoding failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The transport gave up waiting for the server
    #[error("request timed out")]
    Timeout,

    /// The fetch was aborted through its handle
    #[error("request aborted")]
    Cancelled,
}

impl FetchFailure {
    /// Map a reqwest error onto a failure reason.
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchFailure::Timeout
        } else {
            FetchFailure::Transport(error.to_string())
        }
    }
}

/// A failed catalog fetch, with enough context to diagnose it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason} (video id: {video_id}, url: {url})")]
pub struct FetchError {
    /// Why the fetch failed
    pub reason: FetchFailure,
    /// Catalog URL that was requested
    pub url: String,
    /// Normalized identifier the fetch was issued for
    pub video_id: String,
}

impl FetchError {
    /// Whether this failure came from an explicit abort.
    pub fn is_cancelled(&self) -> bool {
        self.reason == FetchFailure::Cancelled
    }
}

/// An accessor was used before the data it derives from was loaded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// A record exists but has not been fulfilled yet
    #[error("load data before reading video id {0}")]
    NotLoaded(String),

    /// No record was ever created for this identifier
    #[error("no cached record for video id {0}")]
    NoRecord(String),
}

/// Error type for hover preview operations
#[derive(Error, Debug)]
pub enum PreviewError {
    /// Catalog fetch failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Accessor called before data was loaded
    #[error(transparent)]
    State(#[from] StateError),

    /// The text does not carry an identifier this source understands
    #[error("no recognizable video id in: {0}")]
    UnrecognizedId(String),

    /// Required HTML element was not found in the catalog page
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// A configured identifier pattern failed to compile
    #[error("Invalid pattern {name}: {reason}")]
    InvalidPattern { name: String, reason: String },

    /// Configuration could not be read
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Serialize PreviewError as a string for Tauri compatibility
impl Serialize for PreviewError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for hover preview operations
pub type Result<T> = std::result::Result<T, PreviewError>;
