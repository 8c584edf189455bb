//! Fixed-capacity JSON tokenizer.
//!
//! Single pass over the input, writing byte-range spans into a caller-owned
//! token slice. No recursion, no allocation, no substring materialization;
//! navigation and extraction happen later over the spans (see
//! [`crate::navigate`]).
//!
//! String tokens span the content between the quotes. Container tokens span
//! the braces/brackets inclusive, so a nested object's span can be re-fed to
//! the tokenizer as an independent document.

use crate::relax;

/// Sentinel end offset for a container that has not been closed yet.
const OPEN: u32 = u32::MAX;

/// Syntactic class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum TokenKind {
    Object = 0,
    Array,
    String,
    #[default]
    Primitive,
}

/// A tagged byte range `[start, end)` within the scanned text.
///
/// Object keys are immediately followed by their value token in the output
/// array, which is what key lookup relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Token {
    pub kind: TokenKind,
    pub start: u32,
    pub end: u32,
}

impl Token {
    /// Length of the span in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    /// Check if the span is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The token's bytes within `text`, or `&[]` if the span does not lie
    /// inside `text`.
    #[inline]
    pub fn bytes<'a>(&self, text: &'a [u8]) -> &'a [u8] {
        text.get(self.start as usize..self.end as usize).unwrap_or(b"")
    }
}

/// Tokenizer failure.
///
/// Compact code enum; `message()` gives the human-readable form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ScanError {
    /// Input byte that fits no JSON production.
    Syntax = 0,
    /// More tokens needed than the provided slice holds.
    TokensExhausted,
    /// Input ended inside an unclosed string or container.
    Partial,
}

impl ScanError {
    /// Get a human-readable message for this error code.
    pub fn message(self) -> &'static str {
        match self {
            Self::Syntax => "invalid syntax",
            Self::TokensExhausted => "token capacity exhausted",
            Self::Partial => "unexpected end of input",
        }
    }
}

/// Tokenize `text` into `tokens`, returning the number of tokens produced.
///
/// Errors on a syntax error, on input ending mid-construct, or when the
/// input needs more tokens than `tokens` holds. Separator characters (`:`
/// and `,`) are structural no-ops; container balance is enforced.
pub fn tokenize(text: &[u8], tokens: &mut [Token]) -> Result<usize, ScanError> {
    let mut next = 0usize;
    let mut pos = 0usize;

    while pos < text.len() {
        let c = text[pos];
        match c {
            b'{' | b'[' => {
                if next >= tokens.len() {
                    return Err(ScanError::TokensExhausted);
                }
                let kind = if c == b'{' { TokenKind::Object } else { TokenKind::Array };
                tokens[next] = Token { kind, start: pos as u32, end: OPEN };
                next += 1;
            }
            b'}' | b']' => {
                let kind = if c == b'}' { TokenKind::Object } else { TokenKind::Array };
                close_container(tokens, next, kind, pos)?;
            }
            b'"' => {
                if next >= tokens.len() {
                    return Err(ScanError::TokensExhausted);
                }
                let (start, end) = scan_string(text, pos)?;
                tokens[next] = Token { kind: TokenKind::String, start, end };
                next += 1;
                // Continue from the closing quote
                pos = end as usize;
            }
            b' ' | b'\t' | b'\r' | b'\n' | b':' | b',' => {}
            b'-' | b'0'..=b'9' | b't' | b'f' | b'n' => {
                if next >= tokens.len() {
                    return Err(ScanError::TokensExhausted);
                }
                let end = scan_primitive(text, pos)?;
                tokens[next] = Token {
                    kind: TokenKind::Primitive,
                    start: pos as u32,
                    end: end as u32,
                };
                next += 1;
                pos = end - 1;
            }
            _ => return Err(ScanError::Syntax),
        }
        pos += 1;
        relax();
    }

    // Any container still open means the input was cut short
    if tokens[..next].iter().any(|t| t.end == OPEN) {
        return Err(ScanError::Partial);
    }

    Ok(next)
}

/// Close the innermost open container of the matching kind at `pos`.
fn close_container(
    tokens: &mut [Token],
    produced: usize,
    kind: TokenKind,
    pos: usize,
) -> Result<(), ScanError> {
    for tok in tokens[..produced].iter_mut().rev() {
        if tok.end == OPEN {
            if tok.kind != kind {
                return Err(ScanError::Syntax);
            }
            tok.end = pos as u32 + 1;
            return Ok(());
        }
    }
    // Closer with nothing open
    Err(ScanError::Syntax)
}

/// Scan a string literal starting at the opening quote `pos`.
///
/// Returns the content span, quotes excluded. Escape sequences are validated
/// but left in place; unescaping is not this layer's job.
fn scan_string(text: &[u8], pos: usize) -> Result<(u32, u32), ScanError> {
    let start = pos + 1;
    let mut at = start;
    while at < text.len() {
        match text[at] {
            b'"' => return Ok((start as u32, at as u32)),
            b'\\' => {
                at += 1;
                match text.get(at) {
                    Some(b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't') => {}
                    Some(b'u') => {
                        for _ in 0..4 {
                            at += 1;
                            match text.get(at) {
                                Some(b) if b.is_ascii_hexdigit() => {}
                                Some(_) => return Err(ScanError::Syntax),
                                None => return Err(ScanError::Partial),
                            }
                        }
                    }
                    Some(_) => return Err(ScanError::Syntax),
                    None => return Err(ScanError::Partial),
                }
            }
            0x00..=0x1F => return Err(ScanError::Syntax),
            _ => {}
        }
        at += 1;
    }
    Err(ScanError::Partial)
}

/// Scan a primitive (number, `true`, `false`, `null`) starting at `pos`.
///
/// Returns the exclusive end offset. The primitive runs until a structural
/// delimiter or end of input; its internal shape is not validated beyond
/// the leading byte the caller already matched.
fn scan_primitive(text: &[u8], pos: usize) -> Result<usize, ScanError> {
    let mut at = pos;
    while at < text.len() {
        match text[at] {
            b',' | b']' | b'}' | b':' | b' ' | b'\t' | b'\r' | b'\n' => break,
            0x00..=0x1F => return Err(ScanError::Syntax),
            _ => at += 1,
        }
    }
    Ok(at)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(text: &[u8]) -> Result<Vec<Token>, ScanError> {
        let mut tokens = [Token::default(); 32];
        let count = tokenize(text, &mut tokens)?;
        Ok(tokens[..count].to_vec())
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(scan(b"").unwrap(), vec![]);
        assert_eq!(scan(b"  \r\n").unwrap(), vec![]);
    }

    #[test]
    fn test_flat_object() {
        let text = b"{\"id\":7,\"name\":\"ana\"}";
        let tokens = scan(text).unwrap();
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[0].kind, TokenKind::Object);
        assert_eq!(tokens[0].bytes(text), text);
        assert_eq!(tokens[1].bytes(text), b"id");
        assert_eq!(tokens[2].kind, TokenKind::Primitive);
        assert_eq!(tokens[2].bytes(text), b"7");
        assert_eq!(tokens[3].bytes(text), b"name");
        assert_eq!(tokens[4].kind, TokenKind::String);
        assert_eq!(tokens[4].bytes(text), b"ana");
    }

    #[test]
    fn test_nested_object_span_includes_braces() {
        let text = b"{\"from\":{\"id\":\"7\",\"is_bot\":false}}";
        let tokens = scan(text).unwrap();
        let nested = tokens
            .iter()
            .skip(1)
            .find(|t| t.kind == TokenKind::Object)
            .unwrap();
        assert_eq!(nested.bytes(text), b"{\"id\":\"7\",\"is_bot\":false}");
        // The nested span re-tokenizes as its own document
        let sub = scan(nested.bytes(text)).unwrap();
        assert_eq!(sub[0].kind, TokenKind::Object);
        assert_eq!(sub.len(), 5);
    }

    #[test]
    fn test_array_and_primitives() {
        let text = b"[1, true, null, -2]";
        let tokens = scan(text).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Array);
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[2].bytes(text), b"true");
        assert_eq!(tokens[3].bytes(text), b"null");
        assert_eq!(tokens[4].bytes(text), b"-2");
    }

    #[test]
    fn test_string_escapes() {
        let text = br#"{"text":"a \"quoted\" line\n"}"#;
        let tokens = scan(text).unwrap();
        assert_eq!(tokens[2].bytes(text), br#"a \"quoted\" line\n"#);

        let text = "{\"u\":\"é\"}".as_bytes();
        let tokens = scan(text).unwrap();
        assert_eq!(tokens[2].bytes(text), "é".as_bytes());
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(scan(b"<html>"), Err(ScanError::Syntax));
        assert_eq!(scan(b"{\"a\":1]"), Err(ScanError::Syntax));
        assert_eq!(scan(b"}"), Err(ScanError::Syntax));
        assert_eq!(scan(br#"{"bad":"\q"}"#), Err(ScanError::Syntax));
    }

    #[test]
    fn test_partial_input() {
        assert_eq!(scan(b"{\"a\":1"), Err(ScanError::Partial));
        assert_eq!(scan(b"{\"a\":\"unterminated"), Err(ScanError::Partial));
        assert_eq!(scan(br#"{"a":"\"#), Err(ScanError::Partial));
    }

    #[test]
    fn test_tokens_exhausted() {
        let mut tokens = [Token::default(); 3];
        let r = tokenize(b"{\"a\":1,\"b\":2}", &mut tokens);
        assert_eq!(r, Err(ScanError::TokensExhausted));
    }

    #[test]
    fn test_primitive_at_end_of_input() {
        let text = b"42";
        let tokens = scan(text).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].bytes(text), b"42");
    }

    #[test]
    fn test_key_value_adjacency() {
        // Each key token is immediately followed by its value token
        let text = b"{\"a\":{\"x\":1},\"b\":[2],\"c\":\"s\"}";
        let tokens = scan(text).unwrap();
        let keys: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| matches!(t.bytes(text), b"a" | b"b" | b"c"))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(keys.len(), 3);
        assert_eq!(tokens[keys[0] + 1].kind, TokenKind::Object);
        assert_eq!(tokens[keys[1] + 1].kind, TokenKind::Array);
        assert_eq!(tokens[keys[2] + 1].kind, TokenKind::String);
    }
}
