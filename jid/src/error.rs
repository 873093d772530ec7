// Copyright (c) 2017-2019 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use core::fmt;

/// An error produced when parsing or constructing a JID fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The domain part is missing; every JID requires one.
    DomainEmpty,
    /// A `@` was present with nothing before it.
    NodeEmpty,
    /// A `/` was present with nothing after it.
    ResourceEmpty,
    /// A resource was present where a bare JID was required.
    ResourceNotEmpty,
    /// A NUL byte, or another character forbidden in a JID, was found.
    InvalidCharacter,
    /// A part exceeded its RFC 6122 length bound (1023 bytes) once
    /// normalized.
    TooLong,
    /// stringprep (NODEPREP/NAMEPREP/RESOURCEPREP) rejected the input.
    StringPrep,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Error::DomainEmpty => "domain part is empty",
            Error::NodeEmpty => "node part is empty",
            Error::ResourceEmpty => "resource part is empty",
            Error::ResourceNotEmpty => "resource part is present but must be absent",
            Error::InvalidCharacter => "invalid character in JID",
            Error::TooLong => "JID part exceeds 1023 bytes after normalization",
            Error::StringPrep => "stringprep normalization failed",
        })
    }
}

impl core::error::Error for Error {}
