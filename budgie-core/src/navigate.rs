//! Key lookup and value extraction over a tokenized document.
//!
//! The token array produced by [`crate::scan`] is flat: nesting shows up
//! only in the spans. Lookup here is therefore a document-order scan over
//! string tokens at every depth, which is exactly what the flat wire format
//! needs - a key is found whether it sits at the top level or inside a
//! nested object, and the first match wins.

use crate::buffer::{Appended, ByteSink};
use crate::relax;
use crate::scan::{self, ScanError, Token, TokenKind};

/// Tokenize `text` and require an object at the root.
///
/// Returns the token count. Anything else the root could be (array, scalar,
/// nothing at all) is reported as a syntax error.
pub fn parse_object(text: &[u8], tokens: &mut [Token]) -> Result<usize, ScanError> {
    let count = scan::tokenize(text, tokens)?;
    if count == 0 || tokens[0].kind != TokenKind::Object {
        return Err(ScanError::Syntax);
    }
    Ok(count)
}

/// Index of the first string token whose bytes equal `key`, in document
/// order.
///
/// Length is compared before bytes. Index 0 is the root object, so a hit is
/// always >= 1; the value token follows at the returned index plus one.
pub fn find_key(text: &[u8], tokens: &[Token], key: &[u8]) -> Option<usize> {
    for (i, tok) in tokens.iter().enumerate() {
        if tok.kind != TokenKind::String {
            continue;
        }
        if tok.len() != key.len() {
            continue;
        }
        if tok.bytes(text) == key {
            return Some(i);
        }
        relax();
    }
    None
}

/// Copy a token's byte range into `out`, bounded by the sink's capacity.
///
/// The sink is reset first. Truncation to the longest fitting prefix is
/// deterministic and reported in the return value.
pub fn materialize<S: ByteSink>(text: &[u8], token: Token, out: &mut S) -> Appended {
    out.reset();
    out.put(token.bytes(text))
}

/// Look up `key` and materialize its value into `out`.
///
/// Returns `None` when the key is absent or has no following value token,
/// in which case `out` is left untouched (callers pre-clear defaults before
/// extraction). Otherwise returns the copy outcome.
pub fn value_of<S: ByteSink>(
    text: &[u8],
    tokens: &[Token],
    key: &[u8],
    out: &mut S,
) -> Option<Appended> {
    let at = find_key(text, tokens, key)?;
    let value = tokens.get(at + 1)?;
    Some(materialize(text, *value, out))
}
