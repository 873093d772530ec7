// Copyright (c) 2017-2019 lumi <lumi@pew.im>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Hash-specific primitives for SCRAM (RFC 5802), factored out so the state
//! machine in [`crate::client::mechanisms::Scram`] is hash-agnostic.

use core::fmt;

use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;

/// Error produced when deriving a salted password fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeriveError;

impl fmt::Display for DeriveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("failed to derive SCRAM salted password")
    }
}

impl core::error::Error for DeriveError {}

/// A hash algorithm usable as the SCRAM mechanism's digest.
pub trait ScramProvider {
    /// The mechanism name advertised on the wire, without a `-PLUS` suffix
    /// (the caller appends that when channel binding is used).
    const NAME: &'static str;

    /// The channel-binding variant of [`Self::NAME`], with the `-PLUS`
    /// suffix, used when the connector supplies [`ChannelBinding`][crate::common::ChannelBinding] data.
    const NAME_PLUS: &'static str;

    /// Output size of the underlying hash, in bytes.
    const SIZE: usize;

    /// `HMAC(key, data)`.
    fn hmac(key: &[u8], data: &[u8]) -> Vec<u8>;

    /// `H(data)`, the plain hash.
    fn hash(data: &[u8]) -> Vec<u8>;

    /// `PBKDF2(HMAC, password, salt, iterations)`, producing `SIZE` bytes.
    fn derive(password: &str, salt: &[u8], iterations: u32) -> Result<Vec<u8>, DeriveError>;
}

/// SCRAM over SHA-1.
pub struct Sha1;

/// SCRAM over SHA-256.
pub struct Sha256;

impl ScramProvider for Sha1 {
    const NAME: &'static str = "SCRAM-SHA-1";
    const NAME_PLUS: &'static str = "SCRAM-SHA-1-PLUS";
    const SIZE: usize = 20;

    fn hmac(key: &[u8], data: &[u8]) -> Vec<u8> {
        let mut mac =
            Hmac::<sha1::Sha1>::new_from_slice(key).expect("HMAC accepts keys of any length");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }

    fn hash(data: &[u8]) -> Vec<u8> {
        use sha1::Digest;
        sha1::Sha1::digest(data).to_vec()
    }

    fn derive(password: &str, salt: &[u8], iterations: u32) -> Result<Vec<u8>, DeriveError> {
        let mut out = [0u8; 20];
        pbkdf2_hmac::<sha1::Sha1>(password.as_bytes(), salt, iterations, &mut out);
        Ok(out.to_vec())
    }
}

impl ScramProvider for Sha256 {
    const NAME: &'static str = "SCRAM-SHA-256";
    const NAME_PLUS: &'static str = "SCRAM-SHA-256-PLUS";
    const SIZE: usize = 32;

    fn hmac(key: &[u8], data: &[u8]) -> Vec<u8> {
        let mut mac =
            Hmac::<sha2::Sha256>::new_from_slice(key).expect("HMAC accepts keys of any length");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }

    fn hash(data: &[u8]) -> Vec<u8> {
        use sha2::Digest;
        sha2::Sha256::digest(data).to_vec()
    }

    fn derive(password: &str, salt: &[u8], iterations: u32) -> Result<Vec<u8>, DeriveError> {
        let mut out = [0u8; 32];
        pbkdf2_hmac::<sha2::Sha256>(password.as_bytes(), salt, iterations, &mut out);
        Ok(out.to_vec())
    }
}

/// XOR two equal-length byte strings in place, returning the result.
pub(crate) fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b.iter()).map(|(x, y)| x ^ y).collect()
}
