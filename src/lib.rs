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

//! Mailsift fetches messages from a remote mailbox through a caller-supplied
//! event source and turns each raw message into a structured record,
//! extracting file attachments from multipart bodies along the way.
//!
//! The crate deliberately knows nothing about opening or authenticating the
//! protocol session. The session layer hands over a [`fetch::source::FetchSource`];
//! the aggregator in [`fetch::aggregator`] drives one subscription per batch,
//! reconciles each message's byte stream with its out-of-band metadata
//! events, and runs every completed buffer through the MIME walker in
//! [`mime::walk`].

pub mod fetch;
pub mod mime;
pub mod model;
pub mod support;

pub use crate::fetch::aggregator::{
    FetchResponse, MessageFailure, MessageFetcher,
};
pub use crate::fetch::source::{
    BodyChunks, EventStream, FetchEvent, FetchSource, MessageAttributes,
};
pub use crate::model::{AttachmentDescriptor, FetchOptions, MessageRecord};
pub use crate::support::error::Error;
