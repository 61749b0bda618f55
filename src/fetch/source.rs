//-
// Copyright (c) 2026, the Mailsift developers
//
// This file is part of Mailsift.
//
// Mailsift is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Mailsift is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along
// with Mailsift. If not, see <http://www.gnu.org/licenses/>.

//! The boundary between the aggregator and whatever protocol session feeds
//! it.
//!
//! Implementations of `FetchSource` own the session; the aggregator owns
//! nothing but one subscription per batch. The events a subscription yields
//! mirror how mail servers actually deliver fetch responses: a message is
//! announced, its literal body streams in chunks, its metadata arrives as a
//! separate untagged response in whatever order the server felt like, and a
//! final per-message event closes it out.

use std::fmt;
use std::io;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use futures::stream::Stream;

use crate::support::error::Error;

/// The metadata a fetch source reports for one message.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageAttributes {
    pub uid: u32,
    pub flags: Vec<String>,
    /// The message's internal date.
    pub date: DateTime<Utc>,
    /// Size of the raw message in bytes, as reported by the source.
    pub size: u32,
}

/// Incrementally-arriving content of one body section. The stream's own
/// termination is the only end-of-data signal.
pub type BodyChunks =
    Pin<Box<dyn Stream<Item = io::Result<Vec<u8>>> + Send>>;

/// The flattened event sequence of one fetch subscription. Termination of
/// the stream is the end of the batch.
pub type EventStream =
    Pin<Box<dyn Stream<Item = Result<FetchEvent, Error>> + Send>>;

/// One event delivered by a fetch subscription.
///
/// All events for a batch arrive on a single logical sequence. Each message
/// is announced by `Message` carrying the source-assigned sequence number;
/// its body, attributes, and end all refer back to that number. `Body` and
/// `Attributes` may arrive in either order relative to each other.
pub enum FetchEvent {
    /// A message has started arriving.
    Message { seq: u32 },
    /// The content of one requested body section.
    Body {
        seq: u32,
        /// Which section this is. The aggregator always requests the whole
        /// message, which sources report as the empty section.
        section: String,
        chunks: BodyChunks,
    },
    /// The message's metadata.
    Attributes { seq: u32, attributes: MessageAttributes },
    /// No further events will arrive for this message.
    MessageEnd { seq: u32 },
}

impl fmt::Debug for FetchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            FetchEvent::Message { seq } => {
                f.debug_struct("Message").field("seq", &seq).finish()
            },
            FetchEvent::Body { seq, ref section, .. } => f
                .debug_struct("Body")
                .field("seq", &seq)
                .field("section", section)
                .field("chunks", &"<stream>")
                .finish(),
            FetchEvent::Attributes { seq, ref attributes } => f
                .debug_struct("Attributes")
                .field("seq", &seq)
                .field("attributes", attributes)
                .finish(),
            FetchEvent::MessageEnd { seq } => {
                f.debug_struct("MessageEnd").field("seq", &seq).finish()
            },
        }
    }
}

/// A protocol session, as the aggregator sees it.
pub trait FetchSource {
    /// Open one fetch subscription covering every message in `uids`.
    ///
    /// The whole batch goes through a single call; the protocol batches
    /// fetches server-side, so implementations must not be driven once per
    /// message.
    fn fetch(&mut self, uids: &[u32]) -> Result<EventStream, Error>;
}
