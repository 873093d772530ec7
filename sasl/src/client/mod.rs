// Copyright (c) 2017-2019 lumi <lumi@pew.im>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Client-side SASL mechanism drivers.

pub mod mechanisms;

use core::fmt;

/// Error produced while driving a mechanism's challenge/response loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The mechanism requires a password and none was supplied.
    MissingPassword,
    /// A challenge could not be decoded (malformed SCRAM message, wrong
    /// nonce echoed back, etc.).
    InvalidChallenge(String),
    /// A response was requested from a mechanism which doesn't expect one
    /// (e.g. a second challenge sent to PLAIN).
    UnexpectedChallenge,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingPassword => f.write_str("mechanism requires a password"),
            Error::InvalidChallenge(msg) => write!(f, "invalid SASL challenge: {}", msg),
            Error::UnexpectedChallenge => f.write_str("unexpected SASL challenge"),
        }
    }
}

impl core::error::Error for Error {}

/// A client-side SASL mechanism.
///
/// Implementors drive one authentication attempt: [`initial`][Self::initial]
/// produces the initial response sent alongside the mechanism selection (or
/// deferred to the first challenge for mechanisms that need one), and
/// [`response`][Self::response] is called once per server challenge.
pub trait Mechanism {
    /// The mechanism name as registered with IANA (e.g. `"SCRAM-SHA-1"`).
    fn name(&self) -> &str;

    /// The initial response, sent with the `<auth/>` element.
    fn initial(&mut self) -> Vec<u8>;

    /// Respond to a server challenge.
    fn response(&mut self, challenge: &[u8]) -> Result<Vec<u8>, Error>;
}
