//! The bot client: request composition, polling, connection lifecycle.
//!
//! A [`Bot`] owns one shared [`FixedBuf`] that serves as both outbound
//! request body and inbound response scratch, one [`ParseArena`], and one
//! [`Message`] record. Everything is allocated at construction; a poll
//! cycle runs without further allocation.
//!
//! The transport is caller-supplied through the [`Transport`] trait, so the
//! same client runs over any TLS stack that can move bytes.

use core::fmt::Write as _;
use core::time::Duration;

use tracing::{debug, warn};

use crate::buffer::{FixedBuf, FixedStr};
use crate::envelope;
use crate::error::{Error, TransportError};
use crate::limits::{API_PATH_CAP, EXCHANGE_BUF_CAP, KEYBOARD_CAP, TOKEN_CAP, URI_CAP};
use crate::record::Message;
use crate::update::{build_message, ParseArena};

/// Bot API host.
pub const API_HOST: &str = "api.telegram.org";
/// TLS port for the API host.
pub const API_PORT: u16 = 443;

/// Grace added on top of the long-poll window before a read times out.
const RESPONSE_GRACE: Duration = Duration::from_secs(3);
/// Long-poll window used until the caller overrides it.
const DEFAULT_LONG_POLL_SECS: u32 = 10;

const CMD_GET_ME: &str = "getMe";
const CMD_SEND_MESSAGE: &str = "sendMessage";
const CMD_GET_UPDATES: &str = "getUpdates";

/// Blocking byte transport to the API host.
///
/// Implementations own the socket and TLS session. Both request calls write
/// the full response (status line, headers, body) into `buf`, replacing its
/// content; a non-`Ok` return means nothing usable arrived within
/// `timeout`.
pub trait Transport {
    /// Open the connection.
    fn connect(&mut self, host: &str, port: u16) -> Result<(), TransportError>;

    /// Close the connection. No effect if already closed.
    fn disconnect(&mut self);

    /// Check the connection state.
    fn is_connected(&self) -> bool;

    /// Issue a GET for `path`; the response replaces `buf`.
    fn get(
        &mut self,
        path: &[u8],
        host: &str,
        buf: &mut FixedBuf,
        timeout: Duration,
    ) -> Result<(), TransportError>;

    /// Issue a POST with `buf` as the body; the response replaces `buf`.
    fn post(
        &mut self,
        path: &[u8],
        host: &str,
        buf: &mut FixedBuf,
        timeout: Duration,
    ) -> Result<(), TransportError>;
}

/// Text formatting mode for outgoing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Markdown,
    Html,
}

impl ParseMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Markdown => "Markdown",
            Self::Html => "HTML",
        }
    }
}

/// Optional fields of an outgoing message.
#[derive(Debug, Clone, Copy, Default)]
pub struct SendOptions<'a> {
    pub parse_mode: Option<ParseMode>,
    pub disable_web_page_preview: bool,
    pub disable_notification: bool,
    pub reply_to_message_id: Option<u64>,
    /// Raw reply-markup JSON, spliced into the body verbatim.
    pub reply_markup: Option<&'a str>,
}

/// A polling bot client over a caller-supplied transport.
pub struct Bot<T: Transport> {
    transport: T,
    token: FixedStr<TOKEN_CAP>,
    api_path: FixedStr<API_PATH_CAP>,
    buf: FixedBuf,
    arena: ParseArena,
    message: Message,
    poll_offset: u64,
    long_poll_secs: u32,
    keep_connection: bool,
}

impl<T: Transport> Bot<T> {
    /// Create a client for `token`. Allocates every buffer the client will
    /// ever use.
    pub fn new(transport: T, token: &str) -> Self {
        let mut bot = Self {
            transport,
            token: FixedStr::new(),
            api_path: FixedStr::new(),
            buf: FixedBuf::new(EXCHANGE_BUF_CAP),
            arena: ParseArena::new(),
            message: Message::default(),
            // Sentinel: the first poll asks the server for the latest
            // pending update instead of a specific offset
            poll_offset: u64::MAX,
            long_poll_secs: DEFAULT_LONG_POLL_SECS,
            keep_connection: true,
        };
        bot.set_token(token);
        bot
    }

    /// Drop the connection after every command instead of keeping it open.
    pub fn close_after_commands(mut self) -> Self {
        self.keep_connection = false;
        self
    }

    /// Replace the API token.
    pub fn set_token(&mut self, token: &str) {
        self.token.assign(token.as_bytes());
        self.api_path.clear();
        let _ = write!(self.api_path, "/bot{}", self.token.as_str());
        debug!("token changed");
    }

    /// The configured API token.
    pub fn token(&self) -> &str {
        self.token.as_str()
    }

    /// The long-poll window in seconds.
    pub fn polling_timeout(&self) -> u32 {
        self.long_poll_secs
    }

    /// Change the long-poll window.
    pub fn set_polling_timeout(&mut self, seconds: u32) {
        self.long_poll_secs = seconds;
        debug!(seconds, "long poll window changed");
    }

    /// The last received message. Valid until the next successful poll
    /// overwrites it.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Offset the next `get_updates` call will request.
    pub fn poll_offset(&self) -> u64 {
        self.poll_offset
    }

    /// Check the transport's connection state.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Connect to the API host if not already connected.
    ///
    /// An unexpected-certificate failure forces a disconnect before
    /// surfacing, so a half-open session never lingers.
    pub fn connect(&mut self) -> Result<(), Error> {
        if self.transport.is_connected() {
            return Ok(());
        }
        debug!(host = API_HOST, "connecting");
        match self.transport.connect(API_HOST, API_PORT) {
            Ok(()) => Ok(()),
            Err(TransportError::Certificate) => {
                self.transport.disconnect();
                Err(TransportError::Certificate.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Disconnect from the API host.
    pub fn disconnect(&mut self) {
        if self.transport.is_connected() {
            debug!("disconnecting");
            self.transport.disconnect();
        }
    }

    /// Request the bot's own identity. Returns the `result` payload bytes,
    /// valid until the next request reuses the buffer.
    pub fn get_me(&mut self) -> Result<&[u8], Error> {
        self.connect()?;
        if let Err(err) = self.api_get(CMD_GET_ME) {
            self.disconnect();
            return Err(err);
        }
        self.settle_connection();
        Ok(self.buf.as_bytes())
    }

    /// Send a text message to `chat_id`.
    pub fn send_message(
        &mut self,
        chat_id: &str,
        text: &str,
        opts: &SendOptions<'_>,
    ) -> Result<(), Error> {
        self.connect()?;

        self.buf.clear();
        if compose_send_body(&mut self.buf, chat_id, text, opts).is_err() {
            warn!("outgoing message does not fit the exchange buffer");
            self.disconnect();
            return Err(Error::Capacity);
        }

        if let Err(err) = self.api_post(CMD_SEND_MESSAGE, RESPONSE_GRACE) {
            self.disconnect();
            return Err(err);
        }
        self.settle_connection();
        Ok(())
    }

    /// Send a text message together with a reply keyboard.
    ///
    /// `keyboard` is the bare keyboard array JSON; it is wrapped into the
    /// markup object here.
    pub fn send_reply_keyboard(
        &mut self,
        chat_id: &str,
        text: &str,
        keyboard: &str,
    ) -> Result<(), Error> {
        let mut markup: FixedStr<KEYBOARD_CAP> = FixedStr::new();
        if write!(markup, "{{\"keyboard\":{}}}", keyboard).is_err() {
            return Err(Error::Capacity);
        }
        let opts = SendOptions { reply_markup: Some(markup.as_str()), ..SendOptions::default() };
        self.send_message(chat_id, text, &opts)
    }

    /// Long-poll for the next pending update.
    ///
    /// Returns `Ok(true)` when a message was parsed into [`Bot::message`],
    /// `Ok(false)` when the window elapsed without one (or the single
    /// pending update was unparsable and got skipped). The poll offset
    /// advances to `update_id + 1` before the record is handed out, so a
    /// crash mid-cycle loses that update rather than redelivering it.
    pub fn get_updates(&mut self) -> Result<bool, Error> {
        self.connect()?;

        // One update per cycle, text messages only
        self.buf.clear();
        if write!(
            self.buf,
            "{{\"offset\":{}, \"limit\":1, \"timeout\":{}, \"allowed_updates\":[\"message\"]}}",
            self.poll_offset, self.long_poll_secs
        )
        .is_err()
        {
            self.buf.clear();
            return Err(Error::Capacity);
        }

        let wait = Duration::from_secs(u64::from(self.long_poll_secs)) + RESPONSE_GRACE;
        if let Err(err) = self.api_post(CMD_GET_UPDATES, wait) {
            self.disconnect();
            return Err(err);
        }

        self.buf.strip_char(b'\r');
        self.buf.strip_char(b'\n');
        strip_array_brackets(&mut self.buf);

        if self.buf.is_empty() {
            debug!("no pending update");
            self.settle_connection();
            return Ok(false);
        }

        let got = match build_message(self.buf.as_bytes(), &mut self.arena, &mut self.message) {
            Ok(Some(update_id)) => {
                self.poll_offset = update_id.wrapping_add(1);
                true
            }
            Ok(None) => true,
            Err(err) => {
                // Skip past the unreadable update instead of stalling on it
                warn!(error = err.message(), "unparsable update, skipping");
                self.poll_offset = self.poll_offset.wrapping_add(1);
                false
            }
        };

        self.settle_connection();
        Ok(got)
    }

    /// GET `command` and unwrap the response envelope in place.
    fn api_get(&mut self, command: &str) -> Result<(), Error> {
        let path = self.request_path(command)?;
        self.transport
            .get(path.as_bytes(), API_HOST, &mut self.buf, RESPONSE_GRACE)?;
        envelope::unwrap_response(&mut self.buf)?;
        Ok(())
    }

    /// POST the body already in the buffer and unwrap the response.
    fn api_post(&mut self, command: &str, timeout: Duration) -> Result<(), Error> {
        let path = self.request_path(command)?;
        self.transport
            .post(path.as_bytes(), API_HOST, &mut self.buf, timeout)?;
        envelope::unwrap_response(&mut self.buf)?;
        Ok(())
    }

    fn request_path(&self, command: &str) -> Result<FixedStr<URI_CAP>, Error> {
        let mut path: FixedStr<URI_CAP> = FixedStr::new();
        if write!(path, "{}/{}", self.api_path.as_str(), command).is_err() {
            return Err(Error::Capacity);
        }
        Ok(path)
    }

    /// Apply the keep-connection policy after a completed command.
    fn settle_connection(&mut self) {
        if !self.keep_connection {
            self.disconnect();
        }
    }
}

/// Compose a `sendMessage` body into `buf`.
///
/// The base object is written closed; each optional field reopens it by
/// dropping the trailing brace and appending itself plus a new closer, so
/// the body is valid JSON after every step.
fn compose_send_body(
    buf: &mut FixedBuf,
    chat_id: &str,
    text: &str,
    opts: &SendOptions<'_>,
) -> core::fmt::Result {
    write!(buf, "{{\"chat_id\":{}, \"text\":\"{}\"}}", chat_id, text)?;
    if let Some(mode) = opts.parse_mode {
        reopen(buf);
        write!(buf, ",\"parse_mode\":\"{}\"}}", mode.as_str())?;
    }
    if opts.disable_web_page_preview {
        reopen(buf);
        write!(buf, ",\"disable_web_page_preview\":true}}")?;
    }
    if opts.disable_notification {
        reopen(buf);
        write!(buf, ",\"disable_notification\":true}}")?;
    }
    if let Some(id) = opts.reply_to_message_id {
        reopen(buf);
        write!(buf, ",\"reply_to_message_id\":{}}}", id)?;
    }
    if let Some(markup) = opts.reply_markup {
        reopen(buf);
        write!(buf, ",\"reply_markup\":{}}}", markup)?;
    }
    Ok(())
}

/// Drop the closing brace so another member can be appended.
fn reopen(buf: &mut FixedBuf) {
    let _ = buf.drop_last();
}

/// Remove the update-array brackets, leaving the bare update object.
fn strip_array_brackets(buf: &mut FixedBuf) {
    if buf.len() < 2 {
        return;
    }
    if buf.as_bytes().last() == Some(&b']') {
        buf.truncate(buf.len() - 1);
    }
    if buf.as_bytes().first() == Some(&b'[') {
        buf.compact_to_start(1);
    }
}
