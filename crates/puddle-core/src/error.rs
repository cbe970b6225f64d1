//! Unified Error Model
use spml::SpmlError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PuddleError {
    #[error("PARSE/{0}")]
    MalformedInput(String),

    #[error("SERIALIZE/{0}")]
    Serialization(String),

    #[error("ARGUMENT/{0}")]
    InvalidArgument(String),

    #[error("STORE/{0}")]
    Store(String),
}

impl From<SpmlError> for PuddleError {
    fn from(err: SpmlError) -> Self {
        match err {
            SpmlError::Malformed(msg) => PuddleError::MalformedInput(msg),
            SpmlError::Serialization(msg) => PuddleError::Serialization(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, PuddleError>;
