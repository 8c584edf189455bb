//! Client-level error types.
//!
//! The parsing layers keep compact code enums (`ScanError`,
//! `EnvelopeError`); this module folds them into the one error the client
//! surface returns.

use thiserror::Error;

use crate::envelope::EnvelopeError;
use crate::scan::ScanError;

/// Transport failure, as reported by a [`crate::client::Transport`]
/// implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection failed")]
    Connect,
    /// The peer presented an unexpected certificate. The client forces a
    /// disconnect before surfacing this.
    #[error("unexpected server certificate")]
    Certificate,
    #[error("i/o failure")]
    Io,
    #[error("timed out waiting for response")]
    Timeout,
}

/// Any failure a bot operation can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response lacked the expected framing or envelope markers.
    #[error("malformed response envelope")]
    MalformedResponse,

    /// The server answered with `"ok"` not equal to `true`.
    #[error("request rejected by server")]
    Rejected,

    /// The response payload did not tokenize.
    #[error("json scan failed: {}", .0.message())]
    Scan(ScanError),

    /// A composed request did not fit the shared buffer.
    #[error("request exceeds buffer capacity")]
    Capacity,
}

impl From<EnvelopeError> for Error {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Malformed => Error::MalformedResponse,
            EnvelopeError::Rejected => Error::Rejected,
        }
    }
}

impl From<ScanError> for Error {
    fn from(err: ScanError) -> Self {
        Error::Scan(err)
    }
}
