//! Flat message record types.
//!
//! One record per poll cycle: cleared to defaults before each parse,
//! overwritten by the next successful parse, never persisted. String fields
//! carry the longest fitting prefix of whatever the wire held; a field the
//! wire did not mention keeps its default.

use crate::buffer::FixedStr;
use crate::limits::{
    CHAT_TITLE_CAP, CHAT_TYPE_CAP, ID_CAP, LANGUAGE_CAP, NAME_CAP, TEXT_CAP, USERNAME_CAP,
};

/// The account a message came from (wire object `from`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sender {
    pub id: FixedStr<ID_CAP>,
    pub is_bot: bool,
    pub first_name: FixedStr<NAME_CAP>,
    pub last_name: FixedStr<NAME_CAP>,
    pub username: FixedStr<USERNAME_CAP>,
    pub language_code: FixedStr<LANGUAGE_CAP>,
}

/// The conversation a message belongs to (wire object `chat`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chat {
    pub id: FixedStr<ID_CAP>,
    /// Wire key `type`: `private`, `group`, `supergroup` or `channel`.
    pub kind: FixedStr<CHAT_TYPE_CAP>,
    pub title: FixedStr<CHAT_TITLE_CAP>,
    pub username: FixedStr<USERNAME_CAP>,
    pub first_name: FixedStr<NAME_CAP>,
    pub last_name: FixedStr<NAME_CAP>,
    pub all_members_are_administrators: bool,
}

/// One received message, flattened from the nested wire shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub message_id: i64,
    /// Unix timestamp of the message.
    pub date: u32,
    pub text: FixedStr<TEXT_CAP>,
    pub from: Sender,
    pub chat: Chat,
}

impl Message {
    /// Reset every field to its default.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
