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

//! The public data model: what callers pass in and what a fetch hands back.
//!
//! `MessageRecord` and `AttachmentDescriptor` serialize to camelCase JSON.
//! `contentBase64` is omitted entirely (not `null`) when content was not
//! requested, so consumers can distinguish "not asked for" from "empty".

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Options controlling how much attachment data a fetch returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Whether to include the decoded, re-base64ed attachment content in
    /// each descriptor. Off by default; metadata is always produced.
    pub include_attachment_content: bool,
    /// Cap on the decoded bytes included per attachment. `None` means
    /// unlimited. Only meaningful when `include_attachment_content` is set;
    /// never affects `size_bytes`.
    pub attachment_max_bytes: Option<usize>,
}

/// One attachment extracted from a message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentDescriptor {
    /// Filename from the part's headers, or a fixed placeholder when the
    /// part declares none.
    pub filename: String,
    /// Base64 encoding of the (possibly truncated) decoded content. Present
    /// only when content was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_base64: Option<String>,
    /// Whether `content_base64` was cut off at the configured cap.
    pub content_truncated: bool,
    /// Full decoded size in bytes, regardless of truncation or whether
    /// content was requested at all.
    pub size_bytes: usize,
}

/// One fully fetched and decomposed message.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    /// The message's UID, as reported by the fetch source.
    pub uid: u32,
    pub flags: Vec<String>,
    /// The message's internal date.
    pub date: DateTime<Utc>,
    /// Size of the raw message in bytes, as reported by the fetch source
    /// (i.e. before any decoding).
    pub size: u32,
    /// The plain-text portion of the body. Empty if the message has none.
    pub body_text: String,
    /// Attachments in the order their parts appear in the raw message.
    pub attachments: Vec<AttachmentDescriptor>,
}
