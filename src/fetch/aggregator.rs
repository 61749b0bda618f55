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

//! The fetch aggregator: drives one subscription per batch and reconciles
//! each message's body stream with its out-of-band metadata.
//!
//! Sources deliver a message's body and its attributes as independent
//! events in no guaranteed order, so each in-flight message is tracked with
//! two completion conditions (body stream drained, attributes received).
//! A message is parsed only once its per-message end event confirms both;
//! an end event arriving before both conditions hold means the source lost
//! data, which fails the entire batch.
//!
//! Body chunk streams are drained the moment they arrive. Chunk boundaries
//! carry no meaning, so everything is appended to one per-message buffer
//! and no parsing happens until the source has said the message is done.

use std::collections::HashMap;

use futures::StreamExt;

use super::source::{FetchEvent, FetchSource, MessageAttributes};
use crate::mime::walk;
use crate::model::{FetchOptions, MessageRecord};
use crate::support::error::Error;

/// Fetches batches of messages from a `FetchSource` and turns each into a
/// `MessageRecord`.
pub struct MessageFetcher<S> {
    source: S,
}

/// The outcome of one batch.
#[derive(Debug, Default)]
pub struct FetchResponse {
    /// Completed records, in the order the source announced their messages
    /// (which need not be the order of the requested UIDs).
    pub messages: Vec<MessageRecord>,
    /// Messages whose raw bytes could not be structurally decomposed. These
    /// are excluded from `messages`; the batch itself still succeeds.
    pub failures: Vec<MessageFailure>,
}

/// One message that arrived intact but failed MIME decomposition.
#[derive(Debug)]
pub struct MessageFailure {
    /// The source-assigned sequence number.
    pub seq: u32,
    /// The UID from the message's attributes.
    pub uid: u32,
    pub error: Error,
}

/// A message that has been announced but not yet closed out. Completion is
/// two separate conditions; neither implies the other.
#[derive(Debug, Default)]
struct PendingMessage {
    buffer: Vec<u8>,
    attributes: Option<MessageAttributes>,
    body_complete: bool,
}

impl<S: FetchSource> MessageFetcher<S> {
    pub fn new(source: S) -> Self {
        MessageFetcher { source }
    }

    /// Fetch the given messages in one batch.
    ///
    /// On success, the response holds one record per message that parsed,
    /// plus a failure entry for each message whose MIME structure could not
    /// be decomposed. A misbehaving source (events for unknown messages,
    /// the batch ending with a message still incomplete) fails the whole
    /// batch instead, as does an error event on the subscription itself.
    pub async fn fetch_messages(
        &mut self,
        uids: &[u32],
        options: &FetchOptions,
    ) -> Result<FetchResponse, Error> {
        let mut events = self.source.fetch(uids)?;
        log::debug!("fetching {} messages", uids.len());

        // Announcement order, for the final response ordering
        let mut arrival: Vec<u32> = Vec::with_capacity(uids.len());
        let mut pending: HashMap<u32, PendingMessage> = HashMap::new();
        let mut finished: HashMap<u32, Result<MessageRecord, MessageFailure>> =
            HashMap::new();

        while let Some(event) = events.next().await {
            match event? {
                FetchEvent::Message { seq } => {
                    arrival.push(seq);
                    pending.insert(seq, PendingMessage::default());
                },

                FetchEvent::Body { seq, mut chunks, .. } => {
                    let msg =
                        pending.get_mut(&seq).ok_or(Error::UnknownMessage)?;
                    // Drain promptly and in full; parsing waits for the
                    // stream's end, not for any particular chunk shape.
                    while let Some(chunk) = chunks.next().await {
                        msg.buffer.extend_from_slice(&chunk?);
                    }
                    msg.body_complete = true;
                },

                FetchEvent::Attributes { seq, attributes } => {
                    let msg =
                        pending.get_mut(&seq).ok_or(Error::UnknownMessage)?;
                    msg.attributes = Some(attributes);
                },

                FetchEvent::MessageEnd { seq } => {
                    let msg =
                        pending.remove(&seq).ok_or(Error::UnknownMessage)?;
                    finished.insert(seq, finish_message(seq, msg, options)?);
                },
            }
        }

        if !pending.is_empty() {
            // The subscription ended with messages still in flight
            return Err(Error::TruncatedFetch);
        }

        let mut response = FetchResponse::default();
        for seq in arrival {
            match finished.remove(&seq) {
                Some(Ok(record)) => response.messages.push(record),
                Some(Err(failure)) => {
                    log::warn!(
                        "message {} (uid {}) skipped, \
                         could not be decomposed: {}",
                        failure.seq,
                        failure.uid,
                        failure.error
                    );
                    response.failures.push(failure);
                },
                // Announced, but no end event ever referred back to it
                None => return Err(Error::TruncatedFetch),
            }
        }

        log::debug!(
            "fetched {} messages, {} skipped",
            response.messages.len(),
            response.failures.len()
        );
        Ok(response)
    }
}

/// Close out one message whose end event has arrived. The source declaring
/// a message done before both its body and attributes are in means data was
/// lost in transport, which is fatal to the batch; a MIME-level failure is
/// contained to the one message.
fn finish_message(
    seq: u32,
    msg: PendingMessage,
    options: &FetchOptions,
) -> Result<Result<MessageRecord, MessageFailure>, Error> {
    let attributes = match msg.attributes {
        Some(attributes) if msg.body_complete => attributes,
        _ => return Err(Error::TruncatedFetch),
    };

    Ok(match walk::parse(&msg.buffer, options) {
        Ok(parsed) => Ok(MessageRecord {
            uid: attributes.uid,
            flags: attributes.flags,
            date: attributes.date,
            size: attributes.size,
            body_text: parsed.body_text,
            attachments: parsed.attachments,
        }),
        Err(error) => Err(MessageFailure { seq, uid: attributes.uid, error }),
    })
}
