//! Building a flat [`Message`] from one update object.
//!
//! The wire nests twice: the update wraps a `message`, which wraps `from`
//! and `chat`. Token spans are flat, so top-level scalars come straight out
//! of the primary token array; each nested object is materialized into a
//! scratch buffer and tokenized again with a smaller secondary array. A
//! sub-object that fails to tokenize keeps its defaults without discarding
//! the rest of the record.

use tracing::debug;

use crate::buffer::{ByteSink, FixedBuf, FixedStr};
use crate::limits::{SUBOBJECT_TOKENS, UPDATE_TOKENS, VALUE_SCRATCH_CAP};
use crate::navigate::{find_key, materialize, parse_object, value_of};
use crate::record::Message;
use crate::scan::{ScanError, Token};

/// Owned working memory for update parsing.
///
/// Allocated once and reused every poll cycle: the primary and secondary
/// token arrays plus the scratch buffer that carries a nested object's raw
/// text between the two tokenization passes.
#[derive(Debug)]
pub struct ParseArena {
    tokens: Box<[Token]>,
    sub_tokens: Box<[Token]>,
    scratch: FixedBuf,
}

impl ParseArena {
    /// Allocate an arena with the configured capacities.
    pub fn new() -> Self {
        Self {
            tokens: vec![Token::default(); UPDATE_TOKENS].into_boxed_slice(),
            sub_tokens: vec![Token::default(); SUBOBJECT_TOKENS].into_boxed_slice(),
            scratch: FixedBuf::new(VALUE_SCRATCH_CAP),
        }
    }
}

impl Default for ParseArena {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse one update object into `msg`, returning its update id if present.
///
/// The record is cleared first, so on return every field holds either a
/// parsed value or its default. A tokenization failure of the update itself
/// is an error and leaves only defaults; the caller still advances its poll
/// cursor by one so an unparsable update cannot stall the cycle forever.
pub fn build_message(
    payload: &[u8],
    arena: &mut ParseArena,
    msg: &mut Message,
) -> Result<Option<u64>, ScanError> {
    let ParseArena { tokens, sub_tokens, scratch } = arena;

    msg.clear();
    let count = parse_object(payload, tokens)?;
    let tokens = &tokens[..count];

    let update_id = u64_of(payload, tokens, b"update_id");
    if let Some(id) = i64_of(payload, tokens, b"message_id") {
        msg.message_id = id;
    }
    if let Some(date) = u32_of(payload, tokens, b"date") {
        msg.date = date;
    }
    str_of(payload, tokens, b"text", &mut msg.text);

    if let Some(raw) = object_value(payload, tokens, b"from") {
        materialize(payload, raw, scratch);
        match parse_object(scratch.as_bytes(), sub_tokens) {
            Ok(n) => {
                let text = scratch.as_bytes();
                let sub = &sub_tokens[..n];
                str_of(text, sub, b"id", &mut msg.from.id);
                msg.from.is_bot = bool_of(text, sub, b"is_bot");
                str_of(text, sub, b"first_name", &mut msg.from.first_name);
                str_of(text, sub, b"last_name", &mut msg.from.last_name);
                str_of(text, sub, b"username", &mut msg.from.username);
                str_of(text, sub, b"language_code", &mut msg.from.language_code);
            }
            Err(err) => debug!(error = err.message(), "skipping sender object"),
        }
    }

    if let Some(raw) = object_value(payload, tokens, b"chat") {
        materialize(payload, raw, scratch);
        match parse_object(scratch.as_bytes(), sub_tokens) {
            Ok(n) => {
                let text = scratch.as_bytes();
                let sub = &sub_tokens[..n];
                str_of(text, sub, b"id", &mut msg.chat.id);
                str_of(text, sub, b"type", &mut msg.chat.kind);
                str_of(text, sub, b"title", &mut msg.chat.title);
                str_of(text, sub, b"username", &mut msg.chat.username);
                str_of(text, sub, b"first_name", &mut msg.chat.first_name);
                str_of(text, sub, b"last_name", &mut msg.chat.last_name);
                msg.chat.all_members_are_administrators =
                    bool_of(text, sub, b"all_members_are_administrators");
            }
            Err(err) => debug!(error = err.message(), "skipping chat object"),
        }
    }

    Ok(update_id)
}

/// Materialize `key`'s value into a record string field.
///
/// Absence and truncation both degrade silently here: the field keeps its
/// default or the longest fitting prefix.
fn str_of<S: ByteSink>(text: &[u8], tokens: &[Token], key: &[u8], out: &mut S) {
    let _ = value_of(text, tokens, key, out);
}

/// The token following `key`, for feeding a nested object onward.
fn object_value(text: &[u8], tokens: &[Token], key: &[u8]) -> Option<Token> {
    let at = find_key(text, tokens, key)?;
    tokens.get(at + 1).copied()
}

/// True only on an exact `true` literal; absence and anything else is false.
fn bool_of(text: &[u8], tokens: &[Token], key: &[u8]) -> bool {
    let mut lit: FixedStr<8> = FixedStr::new();
    value_of(text, tokens, key, &mut lit).is_some() && lit.as_bytes() == b"true"
}

fn u64_of(text: &[u8], tokens: &[Token], key: &[u8]) -> Option<u64> {
    let mut lit: FixedStr<24> = FixedStr::new();
    value_of(text, tokens, key, &mut lit)?;
    parse_u64(lit.as_bytes())
}

fn i64_of(text: &[u8], tokens: &[Token], key: &[u8]) -> Option<i64> {
    let mut lit: FixedStr<24> = FixedStr::new();
    value_of(text, tokens, key, &mut lit)?;
    let bytes = lit.as_bytes();
    if let Some(rest) = bytes.strip_prefix(b"-") {
        let magnitude = parse_u64(rest)?;
        i64::try_from(magnitude).ok().map(|v| -v)
    } else {
        parse_u64(bytes).and_then(|v| i64::try_from(v).ok())
    }
}

fn u32_of(text: &[u8], tokens: &[Token], key: &[u8]) -> Option<u32> {
    u64_of(text, tokens, key).and_then(|v| u32::try_from(v).ok())
}

/// Decimal digits to `u64` with overflow checking; `None` on anything else.
fn parse_u64(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    let mut result: u64 = 0;
    for &b in bytes {
        match b {
            b'0'..=b'9' => {
                result = result.checked_mul(10)?.checked_add((b - b'0') as u64)?;
            }
            _ => return None,
        }
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(payload: &[u8]) -> (Result<Option<u64>, ScanError>, Message) {
        let mut arena = ParseArena::new();
        let mut msg = Message::default();
        let r = build_message(payload, &mut arena, &mut msg);
        (r, msg)
    }

    #[test]
    fn test_full_update() {
        let payload = br#"{"update_id":5,"message":{"message_id":9,"date":100,"text":"hi","from":{"id":"7","is_bot":false},"chat":{"id":"7","type":"private"}}}"#;
        let (r, msg) = build(payload);
        assert_eq!(r, Ok(Some(5)));
        assert_eq!(msg.message_id, 9);
        assert_eq!(msg.date, 100);
        assert_eq!(msg.text.as_bytes(), b"hi");
        assert_eq!(msg.from.id.as_bytes(), b"7");
        assert!(!msg.from.is_bot);
        assert_eq!(msg.chat.id.as_bytes(), b"7");
        assert_eq!(msg.chat.kind.as_bytes(), b"private");
        // Fields the wire never mentioned keep defaults
        assert!(msg.chat.title.is_empty());
        assert!(msg.from.username.is_empty());
        assert!(!msg.chat.all_members_are_administrators);
    }

    #[test]
    fn test_absent_keys_keep_defaults() {
        let (r, msg) = build(br#"{"update_id":12,"message":{"message_id":3}}"#);
        assert_eq!(r, Ok(Some(12)));
        assert_eq!(msg.message_id, 3);
        assert_eq!(msg.date, 0);
        assert!(msg.text.is_empty());
        assert!(msg.from.id.is_empty());
        assert!(msg.chat.id.is_empty());
    }

    #[test]
    fn test_missing_update_id() {
        let (r, msg) = build(br#"{"message":{"message_id":3}}"#);
        assert_eq!(r, Ok(None));
        assert_eq!(msg.message_id, 3);
    }

    #[test]
    fn test_unparsable_update_is_an_error() {
        let (r, msg) = build(b"not json at all");
        assert!(r.is_err());
        assert_eq!(msg, Message::default());
    }

    #[test]
    fn test_bool_requires_exact_literal() {
        let payload = br#"{"update_id":1,"message":{"from":{"id":"1","is_bot":true},"chat":{"id":"2","all_members_are_administrators":"yes"}}}"#;
        let (_, msg) = build(payload);
        assert!(msg.from.is_bot);
        assert!(!msg.chat.all_members_are_administrators);
    }

    #[test]
    fn test_numeric_sender_ids_extract_as_strings() {
        let payload =
            br#"{"update_id":2,"message":{"from":{"id":123456789},"chat":{"id":-1001234567890}}}"#;
        let (_, msg) = build(payload);
        assert_eq!(msg.from.id.as_bytes(), b"123456789");
        assert_eq!(msg.chat.id.as_bytes(), b"-1001234567890");
    }

    #[test]
    fn test_negative_message_id() {
        let (_, msg) = build(br#"{"update_id":2,"message":{"message_id":-4}}"#);
        assert_eq!(msg.message_id, -4);
    }

    #[test]
    fn test_bad_sub_object_keeps_rest_of_record() {
        // "from" holds a scalar, so its second-pass tokenize fails; the
        // chat object must still populate
        let payload =
            br#"{"update_id":8,"message":{"message_id":1,"text":"ok","from":12,"chat":{"id":"5","type":"group","title":"club"}}}"#;
        let (r, msg) = build(payload);
        assert_eq!(r, Ok(Some(8)));
        assert_eq!(msg.text.as_bytes(), b"ok");
        assert!(msg.from.id.is_empty());
        assert_eq!(msg.chat.id.as_bytes(), b"5");
        assert_eq!(msg.chat.kind.as_bytes(), b"group");
        assert_eq!(msg.chat.title.as_bytes(), b"club");
    }

    #[test]
    fn test_overlong_text_truncates_to_field_capacity() {
        let long = "a".repeat(300);
        let payload = format!(
            r#"{{"update_id":3,"message":{{"message_id":1,"text":"{}"}}}}"#,
            long
        );
        let mut arena = ParseArena::new();
        let mut msg = Message::default();
        build_message(payload.as_bytes(), &mut arena, &mut msg).unwrap();
        assert_eq!(msg.text.len(), msg.text.capacity());
        assert_eq!(msg.text.as_bytes(), &long.as_bytes()[..msg.text.capacity()]);
    }

    #[test]
    fn test_record_overwritten_between_builds() {
        let mut arena = ParseArena::new();
        let mut msg = Message::default();
        build_message(
            br#"{"update_id":1,"message":{"message_id":1,"text":"first","chat":{"title":"t"}}}"#,
            &mut arena,
            &mut msg,
        )
        .unwrap();
        assert_eq!(msg.text.as_bytes(), b"first");

        build_message(
            br#"{"update_id":2,"message":{"message_id":2}}"#,
            &mut arena,
            &mut msg,
        )
        .unwrap();
        // Nothing from the first cycle leaks into the second
        assert!(msg.text.is_empty());
        assert!(msg.chat.title.is_empty());
        assert_eq!(msg.message_id, 2);
    }

    #[test]
    fn test_parse_u64_rejects_junk() {
        assert_eq!(parse_u64(b"123"), Some(123));
        assert_eq!(parse_u64(b""), None);
        assert_eq!(parse_u64(b"12a"), None);
        assert_eq!(parse_u64(b"99999999999999999999999"), None);
    }
}
