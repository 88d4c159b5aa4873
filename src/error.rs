//! Error taxonomy for the query layer.
//!
//! Three classes, matching where the failure originates:
//!
//! - [`Error::Validation`] — malformed predicate or payload arguments
//!   (missing `between` bounds, empty or positional update payloads).
//!   Raised synchronously at the call that triggered them.
//! - [`Error::Logic`] — an upstream store fault, wrapped with its status
//!   code and message. The "not found" response class is never surfaced
//!   this way; each terminal operation absorbs it into an empty/false/
//!   absent result instead.
//! - [`Error::Config`] — missing or empty connection configuration,
//!   raised at client-factory construction. Fatal, never retried.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed predicate or payload arguments.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// An upstream client- or server-side fault, carrying the store's
    /// status code and message. Code 0 means the request never produced
    /// a response (transport failure).
    #[error("search backend error (status {code}): {message}")]
    Logic { code: u16, message: String },

    /// Missing or empty connection configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn logic(code: u16, message: impl Into<String>) -> Self {
        Self::Logic {
            code,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
