use thiserror::Error;

pub type TlResult<T> = Result<T, TlError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TlError {
    #[error("Not a profile directory name: {name}")]
    NotProfileDir { name: String },

    #[error("Invalid profile id: {text}")]
    InvalidId { text: String },
}
