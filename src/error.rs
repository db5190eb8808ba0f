use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Ways a single tile fetch can end without producing a file.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The file server answered with a non-success status.
    #[error("HTTP Error {}: {}", .status.as_u16(), .status.canonical_reason().unwrap_or("Unknown"))]
    Status { url: String, status: StatusCode },

    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The connection dropped while the body was being read.
    #[error("connection lost while fetching {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// Local write failure; not tied to the remote and aborts the run.
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("interrupted by user")]
    Cancelled,
}

impl FetchError {
    /// Remote failures are reported inline and the loop moves on; everything else stops the run.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            FetchError::Status { .. } | FetchError::Network { .. } | FetchError::Body { .. }
        )
    }
}
