//! Capacity limits.
//!
//! Every buffer, token array and record field in the crate is sized by one
//! of these constants. Exceeding a limit truncates or rejects; it never
//! overflows. Tune them to the target's memory budget and rebuild.

/// Shared request/response buffer. One per bot; the largest allocation.
pub const EXCHANGE_BUF_CAP: usize = 3072;

/// Bot API token (currently 46 characters on the wire).
pub const TOKEN_CAP: usize = 48;

/// API path prefix: `/bot` plus the token.
pub const API_PATH_CAP: usize = TOKEN_CAP + 8;

/// Full request path: prefix plus a method name.
pub const URI_CAP: usize = API_PATH_CAP + 24;

/// Token array for a whole update object.
pub const UPDATE_TOKENS: usize = 64;

/// Token array for one nested sub-object (`from` or `chat`).
pub const SUBOBJECT_TOKENS: usize = 32;

/// Scratch for one materialized top-level value, nested objects included.
pub const VALUE_SCRATCH_CAP: usize = 512;

/// Message text field.
pub const TEXT_CAP: usize = 256;

/// Sender and chat ids (kept as strings, the wire can exceed `i64`).
pub const ID_CAP: usize = 24;

/// First and last names.
pub const NAME_CAP: usize = 32;

/// Usernames.
pub const USERNAME_CAP: usize = 32;

/// IETF language tag.
pub const LANGUAGE_CAP: usize = 8;

/// Chat type discriminator (`private`, `group`, ...).
pub const CHAT_TYPE_CAP: usize = 16;

/// Group or channel title.
pub const CHAT_TITLE_CAP: usize = 64;

/// Composed reply-keyboard markup JSON.
pub const KEYBOARD_CAP: usize = 512;
