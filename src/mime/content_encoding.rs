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

//! Reversal of content transfer encodings and charset conversion to UTF-8.

use std::borrow::Cow;

use crate::mime::header::ContentTransferEncoding;
use crate::mime::quoted_printable::qp_decode;
use crate::support::error::Error;

/// Reverse the given transfer encoding applied to `data`.
///
/// The identity encodings (7bit, 8bit, binary) borrow the input unchanged.
/// Base64 is decoded after the line structure (any ASCII whitespace) is
/// stripped; invalid characters or an impossible length are rejected, though
/// missing trailing padding is tolerated. Undecodable base64 is the one way
/// this can fail, and callers are expected to degrade on it rather than fail
/// the message. Quoted-printable never fails.
pub fn transfer_decode(
    cte: ContentTransferEncoding,
    data: &[u8],
) -> Result<Cow<[u8]>, Error> {
    match cte {
        ContentTransferEncoding::SevenBit
        | ContentTransferEncoding::EightBit
        | ContentTransferEncoding::Binary => Ok(Cow::Borrowed(data)),

        ContentTransferEncoding::Base64 => {
            let mut compact = Vec::with_capacity(data.len());
            compact.extend(
                data.iter().copied().filter(|ch| !ch.is_ascii_whitespace()),
            );
            Ok(Cow::Owned(base64::decode(&compact)?))
        },

        ContentTransferEncoding::QuotedPrintable => Ok(qp_decode(data)),
    }
}

/// Convert `data` to UTF-8 text using the charset a part declared.
///
/// An absent or unrecognized charset label falls back to UTF-8. Byte
/// sequences invalid in the chosen encoding are replaced, never rejected, so
/// this cannot fail.
pub fn decode_charset(charset: Option<&[u8]>, data: &[u8]) -> String {
    let encoding = charset
        .and_then(encoding_rs::Encoding::for_label)
        .unwrap_or(encoding_rs::UTF_8);
    let (text, _, _) = encoding.decode(data);
    text.into_owned()
}
