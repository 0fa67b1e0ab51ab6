//! CLI-specific error types and exit code mapping

use acuctl_auto::WorkflowError;
use acuctl_core::error::AcuctlError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// A scanner API call failed.
    #[error("api error: {0}")]
    Api(#[from] WorkflowError),

    /// The auto workflow stopped before completing.
    #[error("{0}")]
    WorkflowFailed(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from acuctl-core.
    #[error("{0}")]
    Core(#[from] AcuctlError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                              |
    /// |------|--------------------------------------|
    /// | 0    | Success                              |
    /// | 1    | General / command / API error        |
    /// | 2    | Configuration error                  |
    /// | 5    | Auto workflow failed                 |
    /// | 10   | IO error                             |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(AcuctlError::Config(_)) => 2,
            Self::WorkflowFailed(_) => 5,
            Self::Io(_) | Self::Core(AcuctlError::Io(_)) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Api(_) => 1,
        }
    }
}
