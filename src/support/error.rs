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

use std::io;

use thiserror::Error;

/// Error type used throughout the crate.
///
/// The first three variants describe a message whose raw bytes cannot be
/// structurally decomposed; the aggregator excludes that one message from
/// the batch and reports it. `TruncatedFetch` and `UnknownMessage` indicate
/// the event source itself misbehaved and fail the whole batch.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Multipart content type has no usable boundary parameter")]
    MissingBoundary,
    #[error("Multipart body never reaches its closing boundary delimiter")]
    UnterminatedMultipart,
    #[error("Content ended before the header block was terminated")]
    TruncatedHeaders,
    #[error("Fetch source ended before every started message completed")]
    TruncatedFetch,
    #[error("Fetch source delivered an event for a message it never started")]
    UnknownMessage,
    #[error(transparent)]
    BadBase64(#[from] base64::DecodeError),
    #[error(transparent)]
    Io(#[from] io::Error),
}
