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

//! Turning one leaf part into an `AttachmentDescriptor`.

use crate::mime::content_encoding::transfer_decode;
use crate::mime::header;
use crate::mime::walk::MimePart;
use crate::model::{AttachmentDescriptor, FetchOptions};

/// The filename reported when a part provides no usable name of its own.
pub const UNNAMED_ATTACHMENT: &str = "unnamed";

/// Decode one leaf part into an attachment descriptor.
///
/// This never fails. A part whose declared transfer encoding cannot be
/// reversed degrades to a metadata-only descriptor whose size is the raw
/// (still encoded) byte length and whose content is omitted even when
/// content was requested.
///
/// Truncation via `FetchOptions::attachment_max_bytes` applies to the
/// decoded bytes, before re-encoding, and never affects `size_bytes`.
pub fn decode(
    part: &MimePart<'_>,
    options: &FetchOptions,
) -> AttachmentDescriptor {
    let filename =
        filename_of(part).unwrap_or_else(|| UNNAMED_ATTACHMENT.to_owned());

    let cte = header::content_transfer_encoding(&part.headers);
    let decoded = match transfer_decode(cte, part.content) {
        Ok(decoded) => decoded,
        Err(e) => {
            log::warn!(
                "attachment '{}' failed transfer decoding, \
                 omitting content: {}",
                filename,
                e
            );
            return AttachmentDescriptor {
                filename,
                content_base64: None,
                content_truncated: false,
                size_bytes: part.content.len(),
            };
        },
    };

    let size_bytes = decoded.len();
    let (content_base64, content_truncated) =
        if !options.include_attachment_content {
            (None, false)
        } else {
            match options.attachment_max_bytes {
                Some(max) if size_bytes > max => {
                    (Some(base64::encode(&decoded[..max])), true)
                },
                _ => (Some(base64::encode(&decoded[..])), false),
            }
        };

    AttachmentDescriptor {
        filename,
        content_base64,
        content_truncated,
        size_bytes,
    }
}

/// The part's filename: the disposition's `filename` parameter if present,
/// the content type's legacy `name` parameter otherwise.
fn filename_of(part: &MimePart<'_>) -> Option<String> {
    part.headers
        .get("content-disposition")
        .and_then(|v| header::parse_content_disposition(v))
        .and_then(|cd| {
            cd.parm("filename")
                .map(|f| String::from_utf8_lossy(f).into_owned())
        })
        .or_else(|| {
            part.content_type().and_then(|ct| {
                ct.parm("name")
                    .map(|f| String::from_utf8_lossy(f).into_owned())
            })
        })
}
