//! tl-profiles: profile directories and the settings documents stored in them.

pub mod settings;
pub mod store;

pub use settings::{SetOutcome, SettingsDocument};
pub use store::{Profile, ProfileStore};

use std::path::PathBuf;
use tl_core::ProfileId;

pub type ProfileResult<T> = Result<T, ProfileError>;

#[derive(thiserror::Error, Debug)]
pub enum ProfileError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Profile not found: {id}")]
    NotFound { id: ProfileId },

    #[error("Malformed settings in {path}: {message}")]
    MalformedSettings { path: PathBuf, message: String },

    #[error("Malformed output in {path}: {message}")]
    MalformedOutput { path: PathBuf, message: String },

    #[error("Invalid settings document: {0}")]
    InvalidSettings(String),

    #[error("Profile ids exhausted under {root}")]
    IdsExhausted { root: PathBuf },
}

impl ProfileError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProfileError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors the caller should treat as "refresh and notify".
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProfileError::NotFound { .. })
    }
}
