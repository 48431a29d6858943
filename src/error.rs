//! Errors raised by the generator helpers

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    /// The text to encode is empty after trimming
    #[error("no text to encode")]
    EmptyText,

    /// A required form field is missing or blank
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("invalid error correction level '{0}' (expected L, M, Q or H)")]
    InvalidErrorCorrection(String),
}

pub type GeneratorResult<T> = Result<T, GeneratorError>;
