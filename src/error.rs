//! Error types shared by all parse functions.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The agent output does not have the expected layout: a missing marker row, a short row
    /// or a malformed number.
    #[error("format error: {0}")]
    Format(String),

    /// An embedded JSON document could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A configured regular expression does not compile.
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl Error {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }
}
