//! Budgie Core
//!
//! Fixed-capacity Telegram bot client core for memory-constrained targets.
//! Every buffer, token array and record field has a capacity declared up
//! front; operations truncate or reject rather than grow, and a full poll
//! cycle runs without allocating.
//!
//! # Architecture
//!
//! - **buffer.rs** - fixed-capacity byte carriers and bounded copies
//! - **scan.rs** - JSON tokenizer writing byte-range spans into a
//!   caller-owned token slice
//! - **navigate.rs** - key lookup and value extraction over token spans
//! - **envelope.rs** - in-place `{"ok":..,"result":..}` envelope unwrapping
//! - **record.rs** - the flat message record
//! - **update.rs** - building a record from one nested update object
//! - **client.rs** - the bot client over a caller-supplied transport

pub mod buffer;
pub mod client;
pub mod envelope;
pub mod error;
pub mod limits;
pub mod navigate;
pub mod record;
pub mod scan;
pub mod update;

pub use buffer::{find_after, Appended, ByteSink, FixedBuf, FixedStr};
pub use client::{Bot, ParseMode, SendOptions, Transport};
pub use envelope::{unwrap_response, EnvelopeError};
pub use error::{Error, TransportError};
pub use record::{Chat, Message, Sender};
pub use scan::{tokenize, ScanError, Token, TokenKind};
pub use update::{build_message, ParseArena};

/// Cooperative-scheduler hint for long linear scans.
///
/// Inert on preemptive and single-task targets; kept at the points where a
/// cooperative runtime would want a chance to run.
#[inline(always)]
pub(crate) fn relax() {}
