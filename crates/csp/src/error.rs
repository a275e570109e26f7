//! Error types for the Rampart CSP engine.
//!
//! Malformed policy text is never an error: bad tokens are dropped and
//! surfaced as [`Diagnostic`](crate::report::Diagnostic)s so the rest of the
//! policy still takes effect. The variants here cover inputs the caller hands
//! us outside of header parsing.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum CspError {
    /// A directive name that is not part of the CSP vocabulary.
    #[error("unrecognized CSP directive: {0}")]
    UnknownDirective(String),

    /// A candidate or document URL that could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub type CspResult<T> = Result<T, CspError>;
