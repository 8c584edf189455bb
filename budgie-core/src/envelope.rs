//! Response envelope unwrapping.
//!
//! Every server reply arrives as transport framing plus a body of the shape
//! `{"ok":<bool>,"result":<value>}`. Unwrapping runs once per response,
//! in place, inside the same shared buffer that carried the request: the
//! payload is compacted down to offset 0 so it can be tokenized directly,
//! with no second allocation.
//!
//! Compatibility assumption: the `"ok"` member textually precedes
//! `"result"` in the body, as the Bot API emits it. Scans run forward from
//! the header separator.

use tracing::warn;

use crate::buffer::{find_after, FixedBuf};

/// Why a response failed to unwrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EnvelopeError {
    /// Header separator or an expected body marker is missing.
    Malformed = 0,
    /// The body carries `"ok"` but its value is not the literal `true`.
    Rejected,
}

impl EnvelopeError {
    /// Get a human-readable message for this error code.
    pub fn message(self) -> &'static str {
        match self {
            Self::Malformed => "malformed response envelope",
            Self::Rejected => "request rejected by server",
        }
    }
}

/// Strip framing and envelope from `buf`, leaving only the `result` payload.
///
/// Steps, mirroring the wire contract:
/// 1. Drop the final framing byte.
/// 2. Locate the header/body separator.
/// 3. Locate `"ok":` and require the literal `true` right after it.
/// 4. Locate `"result":` and compact everything after it to offset 0.
///
/// On any failure the buffer is cleared; a [`EnvelopeError::Rejected`]
/// leaves the caller expected to tear the connection down.
pub fn unwrap_response(buf: &mut FixedBuf) -> Result<(), EnvelopeError> {
    buf.drop_last();

    let body = match find_after(buf.as_bytes(), b"\r\n\r\n") {
        Some(at) => at,
        None => return Err(fail(buf, EnvelopeError::Malformed)),
    };

    let ok_at = match find_after(&buf.as_bytes()[body..], b"\"ok\":") {
        Some(at) => body + at,
        None => return Err(fail(buf, EnvelopeError::Malformed)),
    };

    if !buf.as_bytes()[ok_at..].starts_with(b"true") {
        return Err(fail(buf, EnvelopeError::Rejected));
    }

    let payload = match find_after(&buf.as_bytes()[ok_at..], b"\"result\":") {
        Some(at) => ok_at + at,
        None => return Err(fail(buf, EnvelopeError::Malformed)),
    };

    // Overlapping in-place shift of the payload down to offset 0
    buf.compact_to_start(payload);
    Ok(())
}

fn fail(buf: &mut FixedBuf, err: EnvelopeError) -> EnvelopeError {
    warn!(error = err.message(), "discarding response");
    buf.clear();
    err
}
