//! Error types for the tl-app service layer.

use std::path::PathBuf;
use tl_core::ProfileId;
use tl_profiles::ProfileError;
use tl_runner::RunnerError;

/// Application error type shared by the CLI and GUI.
///
/// Variants follow how a frontend reacts: `NotFound` means refresh and
/// notify, `Launch` re-enables the generate action, `MalformedData` is shown
/// in place of the viewer content, `Io` aborts the operation.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Profile not found: {0}")]
    NotFound(ProfileId),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Malformed data: {0}")]
    MalformedData(String),

    #[error("Could not launch simulation: {0}")]
    Launch(String),

    #[error("Simulation runner error: {0}")]
    Runner(String),

    #[error("Failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for tl-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

impl From<ProfileError> for AppError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::NotFound { id } => AppError::NotFound(id),
            ProfileError::MalformedSettings { .. } | ProfileError::MalformedOutput { .. } => {
                AppError::MalformedData(err.to_string())
            }
            ProfileError::InvalidSettings(message) => AppError::InvalidInput(message),
            ProfileError::Io { .. } | ProfileError::IdsExhausted { .. } => {
                AppError::Io(err.to_string())
            }
        }
    }
}

impl From<RunnerError> for AppError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::Launch { .. } => AppError::Launch(err.to_string()),
            other => AppError::Runner(other.to_string()),
        }
    }
}
