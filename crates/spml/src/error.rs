use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpmlError {
    /// Input is not well-formed XML or has no usable `spml` root.
    #[error("malformed SPML: {0}")]
    Malformed(String),
    /// Document cannot be written out (e.g. no `type` set).
    #[error("cannot serialize SPML: {0}")]
    Serialization(String),
}
