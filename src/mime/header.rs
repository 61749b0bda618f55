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

//! Splitting raw header blocks and parsing the few structured header values
//! the walker cares about: `Content-Type`, `Content-Disposition`, and
//! `Content-Transfer-Encoding`.
//!
//! The value grammars are RFC 2045's, with the usual leniency mail software
//! needs in practice: unparseable values are reported as absent rather than
//! failing the message, and trailing garbage after a parameter list is
//! ignored.
//!
//! All the parsing here operates on raw byte strings. RFC 2045 officially
//! allows only 7-bit ASCII in these headers, but 8-bit data does occur in
//! the wild and is passed through untouched.

use std::borrow::Cow;
use std::collections::HashMap;
use std::str;

use nom::branch::alt;
use nom::bytes::complete::{is_a, is_not, take, take_while1};
use nom::character::complete::char;
use nom::combinator::{map, opt};
use nom::multi::{fold_many0, many0};
use nom::sequence::{delimited, pair, preceded, separated_pair, tuple};
use nom::IResult;

use crate::support::error::Error;

/// A message or part header block, with names lower-cased and values
/// unfolded. A header occurring more than once collapses to its last value.
pub type HeaderMap = HashMap<String, Vec<u8>>;

/// A `name=value` parameter attached to a structured header value.
pub type Parm<'a> = (Cow<'a, [u8]>, Cow<'a, [u8]>);

/// A parsed `Content-Type` header value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentType<'a> {
    pub typ: Cow<'a, [u8]>,
    pub subtype: Cow<'a, [u8]>,
    pub parms: Vec<Parm<'a>>,
}

impl<'a> ContentType<'a> {
    pub fn is_type(&self, typ: &str) -> bool {
        self.typ.eq_ignore_ascii_case(typ.as_bytes())
    }

    pub fn is_subtype(&self, subtype: &str) -> bool {
        self.subtype.eq_ignore_ascii_case(subtype.as_bytes())
    }

    /// Return the value of the parameter with the given name, if present.
    pub fn parm(&self, name: &str) -> Option<&[u8]> {
        parm_by_name(&self.parms, name)
    }
}

/// A parsed `Content-Disposition` header value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentDisposition<'a> {
    pub disposition: Cow<'a, [u8]>,
    pub parms: Vec<Parm<'a>>,
}

impl<'a> ContentDisposition<'a> {
    pub fn is(&self, disposition: &str) -> bool {
        self.disposition.eq_ignore_ascii_case(disposition.as_bytes())
    }

    pub fn parm(&self, name: &str) -> Option<&[u8]> {
        parm_by_name(&self.parms, name)
    }
}

fn parm_by_name<'a, 'b>(
    parms: &'a [Parm<'b>],
    name: &str,
) -> Option<&'a [u8]> {
    parms
        .iter()
        .find(|&&(ref n, _)| n.eq_ignore_ascii_case(name.as_bytes()))
        .map(|&(_, ref v)| &**v)
}

/// A `Content-Transfer-Encoding` value.
///
/// The first three are all identity encodings as far as decoding goes; they
/// only differ in what the sender promised about the content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentTransferEncoding {
    SevenBit,
    EightBit,
    Binary,
    Base64,
    QuotedPrintable,
}

impl Default for ContentTransferEncoding {
    fn default() -> Self {
        ContentTransferEncoding::SevenBit
    }
}

/// Parse a `Content-Transfer-Encoding` header value.
///
/// Returns `None` for unrecognized encodings. Callers fall back to the
/// default (7bit, i.e. identity) in that case, which passes unknown content
/// through untouched rather than dropping it.
pub fn parse_content_transfer_encoding(
    value: &[u8],
) -> Option<ContentTransferEncoding> {
    let value = trim_wsp(value);
    if value.eq_ignore_ascii_case(b"7bit") {
        Some(ContentTransferEncoding::SevenBit)
    } else if value.eq_ignore_ascii_case(b"8bit") {
        Some(ContentTransferEncoding::EightBit)
    } else if value.eq_ignore_ascii_case(b"binary") {
        Some(ContentTransferEncoding::Binary)
    } else if value.eq_ignore_ascii_case(b"base64") {
        Some(ContentTransferEncoding::Base64)
    } else if value.eq_ignore_ascii_case(b"quoted-printable") {
        Some(ContentTransferEncoding::QuotedPrintable)
    } else {
        None
    }
}

/// Look the `Content-Transfer-Encoding` of a part up in its header map,
/// defaulting to 7bit when absent or unrecognized.
pub fn content_transfer_encoding(
    headers: &HeaderMap,
) -> ContentTransferEncoding {
    headers
        .get("content-transfer-encoding")
        .and_then(|v| parse_content_transfer_encoding(v))
        .unwrap_or_default()
}

/// Parse the value of a `Content-Type` header.
pub fn parse_content_type(value: &[u8]) -> Option<ContentType<'_>> {
    content_type_value(value).ok().map(|(_, ct)| ct)
}

/// Parse the value of a `Content-Disposition` header.
pub fn parse_content_disposition(
    value: &[u8],
) -> Option<ContentDisposition<'_>> {
    content_disposition_value(value).ok().map(|(_, cd)| cd)
}

/// Split `raw` into its header block and the content that follows.
///
/// The header block runs up to the first blank line; headers are unfolded,
/// their names lower-cased, and duplicates collapsed to the last value.
/// Lines that are not valid headers (no colon, or an empty name) are passed
/// over silently, the same treatment broken headers get from most mail
/// agents. Both DOS and UNIX line endings are accepted.
///
/// Fails with `Error::TruncatedHeaders` if `raw` ends before the blank line.
pub fn split_message(raw: &[u8]) -> Result<(HeaderMap, &[u8]), Error> {
    let mut headers = HeaderMap::new();
    // The name of the header whose value is being accumulated, so that
    // continuation lines know where to append.
    let mut current: Option<String> = None;

    let mut pos = 0;
    while pos < raw.len() {
        let line_end = match memchr::memchr(b'\n', &raw[pos..]) {
            Some(ix) => pos + ix + 1,
            None => break,
        };
        let line = &raw[pos..line_end];
        pos = line_end;

        let content = strip_eol(line);
        if content.is_empty() {
            return Ok((headers, &raw[pos..]));
        }

        if b' ' == line[0] || b'\t' == line[0] {
            if let Some(value) =
                current.as_ref().and_then(|n| headers.get_mut(n))
            {
                value.extend_from_slice(content);
            }
        } else {
            match split_header_line(content) {
                Some((name, value)) => {
                    headers.insert(name.clone(), value.to_vec());
                    current = Some(name);
                },
                None => current = None,
            }
        }
    }

    Err(Error::TruncatedHeaders)
}

fn strip_eol(line: &[u8]) -> &[u8] {
    if line.ends_with(b"\r\n") {
        &line[..line.len() - 2]
    } else if line.ends_with(b"\n") {
        &line[..line.len() - 1]
    } else {
        line
    }
}

fn split_header_line(line: &[u8]) -> Option<(String, &[u8])> {
    let colon = memchr::memchr(b':', line)?;
    let name = str::from_utf8(&line[..colon]).ok()?.trim();
    if name.is_empty() {
        return None;
    }

    let mut value = &line[colon + 1..];
    while let Some((&ch, rest)) = value.split_first() {
        if b' ' == ch || b'\t' == ch {
            value = rest;
        } else {
            break;
        }
    }

    Some((name.to_ascii_lowercase(), value))
}

fn trim_wsp(mut value: &[u8]) -> &[u8] {
    while let Some((&ch, rest)) = value.split_first() {
        if ch.is_ascii_whitespace() {
            value = rest;
        } else {
            break;
        }
    }
    while let Some((&ch, rest)) = value.split_last() {
        if ch.is_ascii_whitespace() {
            value = rest;
        } else {
            break;
        }
    }
    value
}

// RFC 2045 5.1 "token": any CHAR except SPACE, CTLs, and tspecials. As with
// the quoted-string contents, we let 8-bit bytes through as well.
fn is_token_char(ch: u8) -> bool {
    match ch {
        b'(' | b')' | b'<' | b'>' | b'@' | b',' | b';' | b':' | b'\\'
        | b'"' | b'/' | b'[' | b']' | b'?' | b'=' => false,
        ch => ch > b' ' && 0x7F != ch,
    }
}

// Surviving whitespace in an unfolded header value is semantically
// insignificant between tokens.
fn owsp(i: &[u8]) -> IResult<&[u8], Option<&[u8]>> {
    opt(is_a(" \t"))(i)
}

fn token(i: &[u8]) -> IResult<&[u8], &[u8]> {
    take_while1(is_token_char)(i)
}

fn qtext(i: &[u8]) -> IResult<&[u8], &[u8]> {
    is_not("\\\"")(i)
}

fn quoted_pair(i: &[u8]) -> IResult<&[u8], &[u8]> {
    preceded(char('\\'), take(1usize))(i)
}

fn quoted_string(i: &[u8]) -> IResult<&[u8], Cow<'_, [u8]>> {
    delimited(
        char('"'),
        fold_many0(
            alt((qtext, quoted_pair)),
            Cow::Borrowed(&[] as &[u8]),
            |mut acc: Cow<[u8]>, item| {
                if acc.is_empty() {
                    acc = Cow::Borrowed(item);
                } else {
                    acc.to_mut().extend_from_slice(item);
                }
                acc
            },
        ),
        char('"'),
    )(i)
}

fn parm_value(i: &[u8]) -> IResult<&[u8], Cow<'_, [u8]>> {
    alt((map(token, Cow::Borrowed), quoted_string))(i)
}

fn parm(i: &[u8]) -> IResult<&[u8], Parm<'_>> {
    map(
        separated_pair(token, tuple((owsp, char('='), owsp)), parm_value),
        |(name, value)| (Cow::Borrowed(name), value),
    )(i)
}

fn parms(i: &[u8]) -> IResult<&[u8], Vec<Parm<'_>>> {
    many0(preceded(tuple((owsp, char(';'), owsp)), parm))(i)
}

fn content_type_value(i: &[u8]) -> IResult<&[u8], ContentType<'_>> {
    map(
        tuple((
            preceded(owsp, token),
            preceded(tuple((owsp, char('/'), owsp)), token),
            parms,
        )),
        |(typ, subtype, parms)| ContentType {
            typ: Cow::Borrowed(typ),
            subtype: Cow::Borrowed(subtype),
            parms,
        },
    )(i)
}

fn content_disposition_value(
    i: &[u8],
) -> IResult<&[u8], ContentDisposition<'_>> {
    map(pair(preceded(owsp, token), parms), |(disposition, parms)| {
        ContentDisposition {
            disposition: Cow::Borrowed(disposition),
            parms,
        }
    })(i)
}
