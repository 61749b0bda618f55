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

//! The multipart walker: recursive decomposition of a complete raw message
//! into its plain-text body and its attachments.
//!
//! The walk operates on byte slices of the already-complete message buffer;
//! parts are never copied, only sliced, until a leaf is actually decoded.
//! Multipart bodies are split on their boundary delimiter lines and the
//! resulting parts either recurse (nested multipart) or are classified as
//! body text or attachment. Preamble before the first delimiter and epilogue
//! after the closing delimiter are discarded, as RFC 2046 prescribes.
//!
//! Structural failures (no boundary parameter, no closing delimiter, a
//! header block that never terminates) fail the one message being walked;
//! the aggregator decides what that means for the batch.

use std::borrow::Cow;

use crate::mime::attachment;
use crate::mime::content_encoding::{decode_charset, transfer_decode};
use crate::mime::header::{self, ContentType, HeaderMap};
use crate::model::{AttachmentDescriptor, FetchOptions};
use crate::support::error::Error;

/// The maximum depth of nested multiparts the walker will descend into.
/// Parts nested deeper are treated as opaque leaves.
const MAX_RECURSION: u32 = 20;
/// The maximum number of parts considered in one message.
const MAX_PARTS: u32 = 1000;

/// What one raw message decomposes into.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedBody {
    /// The plain-text portion of the body. Empty if none was found.
    pub body_text: String,
    /// Attachments, ordered by where their parts occur in the raw message.
    pub attachments: Vec<AttachmentDescriptor>,
}

/// One part of a message: its headers plus its raw, still transfer-encoded
/// content.
#[derive(Clone, Debug)]
pub struct MimePart<'a> {
    pub headers: HeaderMap,
    pub content: &'a [u8],
}

impl<'a> MimePart<'a> {
    /// Split a raw message or part into its headers and content.
    pub fn new(raw: &'a [u8]) -> Result<Self, Error> {
        let (headers, content) = header::split_message(raw)?;
        Ok(MimePart { headers, content })
    }

    pub fn content_type(&self) -> Option<ContentType<'_>> {
        self.headers
            .get("content-type")
            .and_then(|v| header::parse_content_type(v))
    }

    /// Whether this part is multipart. A missing or unparseable content
    /// type defaults to text/plain and so is never multipart.
    fn is_multipart(&self) -> bool {
        self.content_type()
            .map(|ct| ct.is_type("multipart"))
            .unwrap_or(false)
    }

    fn is_text(&self) -> bool {
        self.content_type()
            .map(|ct| ct.is_type("text"))
            .unwrap_or(true)
    }
}

#[derive(Default)]
struct WalkState {
    body_text: Option<String>,
    attachments: Vec<AttachmentDescriptor>,
    part_count: u32,
}

/// Decompose the raw bytes of one complete message.
///
/// A multipart message is split recursively: the first non-attachment text
/// part becomes `body_text` and every attachment part becomes a descriptor
/// honouring `options`. A non-multipart message contributes its entire
/// decoded body as `body_text`, whatever its declared type.
pub fn parse(raw: &[u8], options: &FetchOptions) -> Result<ParsedBody, Error> {
    let part = MimePart::new(raw)?;
    let mut state = WalkState::default();

    if part.is_multipart() {
        walk_multipart(&part, options, &mut state, 0)?;
    } else {
        state.body_text = Some(decode_text(&part));
    }

    Ok(ParsedBody {
        body_text: state.body_text.unwrap_or_default(),
        attachments: state.attachments,
    })
}

fn walk_multipart(
    part: &MimePart<'_>,
    options: &FetchOptions,
    state: &mut WalkState,
    depth: u32,
) -> Result<(), Error> {
    let boundary = match part.content_type() {
        Some(ct) => {
            ct.parm("boundary").map(|b| b.to_vec()).filter(|b| !b.is_empty())
        },
        None => None,
    }
    .ok_or(Error::MissingBoundary)?;

    for piece in split_parts(part.content, &boundary)? {
        if piece.is_empty() {
            // Adjacent delimiter lines leave a zero-length part behind;
            // there is nothing in it to classify.
            continue;
        }

        state.part_count += 1;
        if state.part_count > MAX_PARTS {
            log::warn!(
                "message has more than {} parts, ignoring the rest",
                MAX_PARTS
            );
            break;
        }

        let child = MimePart::new(piece)?;
        if child.is_multipart() && depth < MAX_RECURSION {
            walk_multipart(&child, options, state, depth + 1)?;
        } else {
            classify_leaf(&child, options, state);
        }
    }

    Ok(())
}

/// Decide what a leaf part is: an attachment if its disposition says so, if
/// it carries a filename under any spelling, or if it is not text at all;
/// otherwise a candidate for the body text slot, which only the first such
/// part gets to fill.
fn classify_leaf(
    part: &MimePart<'_>,
    options: &FetchOptions,
    state: &mut WalkState,
) {
    let disposition = part
        .headers
        .get("content-disposition")
        .and_then(|v| header::parse_content_disposition(v));

    let explicit_attachment = disposition
        .as_ref()
        .map(|cd| cd.is("attachment"))
        .unwrap_or(false);
    let has_filename = disposition
        .as_ref()
        .and_then(|cd| cd.parm("filename"))
        .is_some()
        || part
            .content_type()
            .as_ref()
            .and_then(|ct| ct.parm("name"))
            .is_some();

    if explicit_attachment || has_filename || !part.is_text() {
        state.attachments.push(attachment::decode(part, options));
    } else if state.body_text.is_none() {
        state.body_text = Some(decode_text(part));
    }
}

/// Decode a text part to a UTF-8 string: reverse its transfer encoding,
/// then convert from its declared charset.
fn decode_text(part: &MimePart<'_>) -> String {
    let cte = header::content_transfer_encoding(&part.headers);
    let bytes = match transfer_decode(cte, part.content) {
        Ok(bytes) => bytes,
        Err(e) => {
            // Degrade to the raw bytes rather than losing the body
            log::warn!("body part failed transfer decoding: {}", e);
            Cow::Borrowed(part.content)
        },
    };

    let charset = part
        .content_type()
        .and_then(|ct| ct.parm("charset").map(|c| c.to_vec()));
    decode_charset(charset.as_deref(), &bytes)
}

/// Split multipart content on its boundary, returning the slice of each
/// part (headers and content, without any delimiter lines).
///
/// Delimiters are only recognized at the start of a line, and the line
/// ending immediately before a delimiter belongs to the delimiter, not to
/// the content before it. Anything before the first delimiter or after the
/// closing one is dropped.
///
/// Fails if the closing delimiter never occurs, since that means the
/// document was cut off at an unknowable point.
fn split_parts<'a>(
    content: &'a [u8],
    boundary: &[u8],
) -> Result<Vec<&'a [u8]>, Error> {
    let mut delim = Vec::with_capacity(2 + boundary.len());
    delim.extend_from_slice(b"--");
    delim.extend_from_slice(boundary);

    let mut parts = Vec::new();
    let mut part_start: Option<usize> = None;
    let mut line_start = 0;

    while line_start < content.len() {
        let line_end = memchr::memchr(b'\n', &content[line_start..])
            .map(|ix| line_start + ix + 1)
            .unwrap_or(content.len());
        let line = &content[line_start..line_end];

        if line.starts_with(&delim) {
            if let Some(start) = part_start.take() {
                // The .max() accounts for adjacent delimiter lines, whose
                // separating line ending already belongs to the first one.
                let end = cut_before_eol(content, line_start).max(start);
                parts.push(&content[start..end]);
            }

            if line[delim.len()..].starts_with(b"--") {
                return Ok(parts);
            }
            part_start = Some(line_end);
        }

        line_start = line_end;
    }

    Err(Error::UnterminatedMultipart)
}

/// The end of the part whose delimiter line starts at `delim_line_start`:
/// just before the line ending that precedes the delimiter, if any.
fn cut_before_eol(content: &[u8], delim_line_start: usize) -> usize {
    if delim_line_start >= 2
        && content[delim_line_start - 2..delim_line_start].starts_with(b"\r\n")
    {
        delim_line_start - 2
    } else if delim_line_start >= 1 && b'\n' == content[delim_line_start - 1] {
        delim_line_start - 1
    } else {
        delim_line_start
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // The running example: a mixed message with a text body and one base64
    // attachment ("Hello world", 11 bytes decoded).
    const SAMPLE_MIXED: &[u8] = b"From: Alice <alice@example.com>\r\n\
        To: Bob <bob@example.com>\r\n\
        Subject: Attachment test\r\n\
        MIME-Version: 1.0\r\n\
        Content-Type: multipart/mixed; boundary=\"mixed-1\"\r\n\
        \r\n\
        --mixed-1\r\n\
        Content-Type: text/plain; charset=\"utf-8\"\r\n\
        \r\n\
        Body text\r\n\
        --mixed-1\r\n\
        Content-Type: text/plain; name=\"hello.txt\"\r\n\
        Content-Transfer-Encoding: base64\r\n\
        Content-Disposition: attachment; filename=\"hello.txt\"\r\n\
        \r\n\
        SGVsbG8gd29ybGQ=\r\n\
        --mixed-1--\r\n";

    fn with_content() -> FetchOptions {
        FetchOptions {
            include_attachment_content: true,
            attachment_max_bytes: None,
        }
    }

    #[test]
    fn simple_message_is_all_body() {
        let parsed = parse(
            b"Content-Type: text/plain\r\n\r\nhello there",
            &FetchOptions::default(),
        )
        .unwrap();
        assert_eq!("hello there", parsed.body_text);
        assert!(parsed.attachments.is_empty());
    }

    #[test]
    fn missing_content_type_defaults_to_text() {
        let parsed =
            parse(b"Subject: x\r\n\r\nhi", &FetchOptions::default()).unwrap();
        assert_eq!("hi", parsed.body_text);
    }

    #[test]
    fn non_multipart_binary_message_is_still_body() {
        // A non-multipart message contributes its whole decoded body as
        // body text no matter what type it declares.
        let parsed = parse(
            b"Content-Type: application/json\r\n\r\n{\"a\":1}",
            &FetchOptions::default(),
        )
        .unwrap();
        assert_eq!("{\"a\":1}", parsed.body_text);
        assert!(parsed.attachments.is_empty());
    }

    #[test]
    fn mixed_message_metadata_only() {
        let parsed = parse(SAMPLE_MIXED, &FetchOptions::default()).unwrap();
        assert_eq!("Body text", parsed.body_text);
        assert_eq!(1, parsed.attachments.len());

        let att = &parsed.attachments[0];
        assert_eq!("hello.txt", att.filename);
        assert_eq!(None, att.content_base64);
        assert!(!att.content_truncated);
        assert_eq!(11, att.size_bytes);
    }

    #[test]
    fn mixed_message_with_content() {
        let parsed = parse(SAMPLE_MIXED, &with_content()).unwrap();
        let att = &parsed.attachments[0];
        assert_eq!(
            Some("SGVsbG8gd29ybGQ=".to_owned()),
            att.content_base64
        );
        assert!(!att.content_truncated);
        assert_eq!(11, att.size_bytes);
    }

    #[test]
    fn truncation_applies_to_decoded_bytes() {
        let options = FetchOptions {
            include_attachment_content: true,
            attachment_max_bytes: Some(2),
        };
        let parsed = parse(SAMPLE_MIXED, &options).unwrap();
        let att = &parsed.attachments[0];

        // First two bytes of the decoded content, re-encoded
        let content = att.content_base64.as_ref().unwrap();
        assert_eq!(b"He".to_vec(), base64::decode(content).unwrap());
        assert!(att.content_truncated);
        // Size still reflects the full decoded length
        assert_eq!(11, att.size_bytes);
    }

    #[test]
    fn size_is_invariant_under_options() {
        let a = parse(SAMPLE_MIXED, &FetchOptions::default()).unwrap();
        let b = parse(SAMPLE_MIXED, &with_content()).unwrap();
        let c = parse(
            SAMPLE_MIXED,
            &FetchOptions {
                include_attachment_content: true,
                attachment_max_bytes: Some(2),
            },
        )
        .unwrap();
        assert_eq!(a.attachments[0].size_bytes, b.attachments[0].size_bytes);
        assert_eq!(a.attachments[0].size_bytes, c.attachments[0].size_bytes);
    }

    #[test]
    fn cap_equal_to_size_does_not_truncate() {
        let options = FetchOptions {
            include_attachment_content: true,
            attachment_max_bytes: Some(11),
        };
        let parsed = parse(SAMPLE_MIXED, &options).unwrap();
        let att = &parsed.attachments[0];
        assert_eq!(Some("SGVsbG8gd29ybGQ=".to_owned()), att.content_base64);
        assert!(!att.content_truncated);
    }

    #[test]
    fn nested_multipart_is_walked() {
        let raw: &[u8] = b"Content-Type: multipart/mixed; boundary=outer\r\n\
            \r\n\
            --outer\r\n\
            Content-Type: multipart/alternative; boundary=inner\r\n\
            \r\n\
            --inner\r\n\
            Content-Type: text/plain\r\n\
            \r\n\
            plain body\r\n\
            --inner\r\n\
            Content-Type: text/html\r\n\
            \r\n\
            <p>html body</p>\r\n\
            --inner--\r\n\
            --outer\r\n\
            Content-Type: application/pdf; name=\"report.pdf\"\r\n\
            Content-Transfer-Encoding: base64\r\n\
            \r\n\
            JVBERg==\r\n\
            --outer--\r\n";

        let parsed = parse(raw, &FetchOptions::default()).unwrap();
        assert_eq!("plain body", parsed.body_text);
        assert_eq!(1, parsed.attachments.len());
        assert_eq!("report.pdf", parsed.attachments[0].filename);
        assert_eq!(4, parsed.attachments[0].size_bytes);
    }

    #[test]
    fn only_first_text_part_becomes_body() {
        let raw: &[u8] = b"Content-Type: multipart/mixed; boundary=b\r\n\
            \r\n\
            --b\r\n\
            Content-Type: text/plain\r\n\
            \r\n\
            first\r\n\
            --b\r\n\
            Content-Type: text/plain\r\n\
            \r\n\
            second\r\n\
            --b--\r\n";

        let parsed = parse(raw, &FetchOptions::default()).unwrap();
        assert_eq!("first", parsed.body_text);
        assert!(parsed.attachments.is_empty());
    }

    #[test]
    fn non_text_leaf_without_disposition_is_an_attachment() {
        let raw: &[u8] = b"Content-Type: multipart/mixed; boundary=b\r\n\
            \r\n\
            --b\r\n\
            Content-Type: application/octet-stream\r\n\
            \r\n\
            \x00\x01\x02\r\n\
            --b--\r\n";

        let parsed = parse(raw, &with_content()).unwrap();
        assert_eq!("", parsed.body_text);
        assert_eq!(1, parsed.attachments.len());
        assert_eq!("unnamed", parsed.attachments[0].filename);
        assert_eq!(3, parsed.attachments[0].size_bytes);
    }

    #[test]
    fn text_part_with_name_parm_is_an_attachment() {
        let raw: &[u8] = b"Content-Type: multipart/mixed; boundary=b\r\n\
            \r\n\
            --b\r\n\
            Content-Type: text/plain; name=\"notes.txt\"\r\n\
            \r\n\
            notes\r\n\
            --b--\r\n";

        let parsed = parse(raw, &FetchOptions::default()).unwrap();
        assert_eq!("", parsed.body_text);
        assert_eq!(1, parsed.attachments.len());
        assert_eq!("notes.txt", parsed.attachments[0].filename);
    }

    #[test]
    fn qp_body_with_charset_is_decoded() {
        let raw: &[u8] = b"Content-Type: text/plain; charset=iso-8859-1\r\n\
            Content-Transfer-Encoding: quoted-printable\r\n\
            \r\n\
            Nu=E4nce";
        let parsed = parse(raw, &FetchOptions::default()).unwrap();
        assert_eq!("Nuänce", parsed.body_text);
    }

    #[test]
    fn empty_part_between_adjacent_delimiters_is_skipped() {
        let raw: &[u8] = b"Content-Type: multipart/mixed; boundary=b\r\n\
            \r\n\
            --b\r\n\
            --b\r\n\
            Content-Type: text/plain\r\n\
            \r\n\
            body\r\n\
            --b--\r\n";

        let parsed = parse(raw, &FetchOptions::default()).unwrap();
        assert_eq!("body", parsed.body_text);
        assert!(parsed.attachments.is_empty());
    }

    #[test]
    fn unknown_transfer_encoding_is_identity() {
        let raw: &[u8] = b"Content-Type: text/plain\r\n\
            Content-Transfer-Encoding: x-uuencode\r\n\
            \r\n\
            passed through untouched";
        let parsed = parse(raw, &FetchOptions::default()).unwrap();
        assert_eq!("passed through untouched", parsed.body_text);
    }

    #[test]
    fn preamble_and_epilogue_are_discarded() {
        let raw: &[u8] = b"Content-Type: multipart/mixed; boundary=b\r\n\
            \r\n\
            This is the preamble.\r\n\
            --b\r\n\
            Content-Type: text/plain\r\n\
            \r\n\
            body\r\n\
            --b--\r\n\
            This is the epilogue.\r\n";

        let parsed = parse(raw, &FetchOptions::default()).unwrap();
        assert_eq!("body", parsed.body_text);
        assert!(parsed.attachments.is_empty());
    }

    #[test]
    fn lf_only_multipart_works() {
        let raw: &[u8] = b"Content-Type: multipart/mixed; boundary=b\n\
            \n\
            --b\n\
            Content-Type: text/plain\n\
            \n\
            body\n\
            --b--\n";

        let parsed = parse(raw, &FetchOptions::default()).unwrap();
        assert_eq!("body", parsed.body_text);
    }

    #[test]
    fn multipart_without_boundary_fails() {
        assert!(matches!(
            parse(
                b"Content-Type: multipart/mixed\r\n\r\nwhatever\r\n",
                &FetchOptions::default(),
            ),
            Err(Error::MissingBoundary)
        ));
    }

    #[test]
    fn unterminated_multipart_fails() {
        let raw: &[u8] = b"Content-Type: multipart/mixed; boundary=b\r\n\
            \r\n\
            --b\r\n\
            Content-Type: text/plain\r\n\
            \r\n\
            body with no closing delimiter\r\n";

        assert!(matches!(
            parse(raw, &FetchOptions::default()),
            Err(Error::UnterminatedMultipart)
        ));
    }

    #[test]
    fn truncated_headers_fail() {
        assert!(matches!(
            parse(b"Content-Type: text/plain\r\n", &FetchOptions::default()),
            Err(Error::TruncatedHeaders)
        ));
    }

    #[test]
    fn undecodable_attachment_degrades() {
        let raw: &[u8] = b"Content-Type: multipart/mixed; boundary=b\r\n\
            \r\n\
            --b\r\n\
            Content-Type: application/octet-stream; name=\"bad.bin\"\r\n\
            Content-Transfer-Encoding: base64\r\n\
            \r\n\
            this is not base64 at all!\r\n\
            --b--\r\n";

        let parsed = parse(raw, &with_content()).unwrap();
        assert_eq!(1, parsed.attachments.len());

        let att = &parsed.attachments[0];
        assert_eq!("bad.bin", att.filename);
        // Content is omitted even though it was requested, and the size
        // falls back to the raw (undecoded) length.
        assert_eq!(None, att.content_base64);
        assert!(!att.content_truncated);
        assert_eq!(b"this is not base64 at all!".len(), att.size_bytes);
    }
}
