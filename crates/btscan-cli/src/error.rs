//! Error types for the btscan CLI.
//!
//! CliError wraps the core errors and adds CLI-specific variants.

use btscan_core::error::{CoreError, DiscoveryError, ErrorKind, ReplayError};
use thiserror::Error;

/// Exit codes for the CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const ADAPTER_UNAVAILABLE: i32 = 2;
    pub const PERMISSION_DENIED: i32 = 3;
    pub const INVALID_ARGS: i32 = 4;
    pub const SCAN_FAILED: i32 = 5;
}

/// Main error type for the CLI
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl CliError {
    /// Short name of the error kind for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            CliError::Core(CoreError::Discovery(e)) => e.kind().as_str(),
            CliError::Core(CoreError::Replay(_)) => "ReplayError",
            CliError::InvalidArgument(_) => ErrorKind::InvalidArgument.as_str(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Core(CoreError::Discovery(e)) => match e.kind() {
                ErrorKind::InvalidArgument => exit_codes::INVALID_ARGS,
                ErrorKind::AdapterUnavailable => exit_codes::ADAPTER_UNAVAILABLE,
                ErrorKind::PermissionDenied => exit_codes::PERMISSION_DENIED,
                ErrorKind::Timeout => exit_codes::SCAN_FAILED,
            },
            CliError::Core(CoreError::Replay(ReplayError::Read { .. })) => exit_codes::GENERAL_ERROR,
            CliError::Core(CoreError::Replay(ReplayError::Parse { .. })) => exit_codes::INVALID_ARGS,
            CliError::InvalidArgument(_) => exit_codes::INVALID_ARGS,
        }
    }
}

// Conversions from core error subtypes to CliError
impl From<DiscoveryError> for CliError {
    fn from(e: DiscoveryError) -> Self {
        CliError::Core(CoreError::Discovery(e))
    }
}

impl From<ReplayError> for CliError {
    fn from(e: ReplayError) -> Self {
        CliError::Core(CoreError::Replay(e))
    }
}
