//! Error types for btscan core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core error type for shared operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Replay(#[from] ReplayError),
}

/// Errors a discovery session can report.
///
/// A scan that finishes without seeing any device is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Bluetooth adapter unavailable: {0}")]
    AdapterUnavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Hard failure reported by the platform scan primitive.
    #[error("Scan failed: {0}")]
    Timeout(String),
}

/// Discriminant of [`DiscoveryError`], used in diagnostics and scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidArgument,
    AdapterUnavailable,
    PermissionDenied,
    Timeout,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::AdapterUnavailable => "AdapterUnavailable",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::Timeout => "Timeout",
        }
    }

    /// Build an error of this kind carrying `message`.
    pub fn into_error(self, message: impl Into<String>) -> DiscoveryError {
        let message = message.into();
        match self {
            ErrorKind::InvalidArgument => DiscoveryError::InvalidArgument(message),
            ErrorKind::AdapterUnavailable => DiscoveryError::AdapterUnavailable(message),
            ErrorKind::PermissionDenied => DiscoveryError::PermissionDenied(message),
            ErrorKind::Timeout => DiscoveryError::Timeout(message),
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DiscoveryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiscoveryError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            DiscoveryError::AdapterUnavailable(_) => ErrorKind::AdapterUnavailable,
            DiscoveryError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            DiscoveryError::Timeout(_) => ErrorKind::Timeout,
        }
    }
}

/// Errors loading an observation script from disk.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to read replay file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid replay file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, DiscoveryError>;
