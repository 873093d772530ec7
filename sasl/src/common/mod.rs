// Copyright (c) 2017-2019 lumi <lumi@pew.im>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Types shared between the client (and, historically, server) side of SASL
//! negotiation.

#[cfg(feature = "scram")]
pub mod scram;

/// A plaintext or pre-hashed password, as supplied by the application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Password {
    /// The plaintext password.
    Plain(String),
}

impl Password {
    /// Borrow the plaintext bytes, for mechanisms that need to hash it
    /// themselves (e.g. SCRAM).
    pub fn plain(&self) -> &str {
        match self {
            Password::Plain(s) => s,
        }
    }
}

/// TLS channel binding data obtained from the connector, used by the `-PLUS`
/// SCRAM variants.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ChannelBinding {
    /// No channel binding data is available; the mechanism falls back to
    /// `n,,` (advertise-not-supported) or `y,,` (supported by us, not used
    /// because the server doesn't support it either).
    #[default]
    None,
    /// `tls-server-end-point` channel binding data: the certificate's hash,
    /// per [RFC 5929](https://www.rfc-editor.org/rfc/rfc5929).
    TlsServerEndPoint(Vec<u8>),
    /// `tls-unique` channel binding data: the first TLS Finished message.
    TlsUnique(Vec<u8>),
}

impl ChannelBinding {
    /// The GS2 channel binding name used in the SCRAM `gs2-cbind-flag`.
    pub fn name(&self) -> &'static str {
        match self {
            ChannelBinding::None => "",
            ChannelBinding::TlsServerEndPoint(_) => "tls-server-end-point",
            ChannelBinding::TlsUnique(_) => "tls-unique",
        }
    }

    /// The raw binding data to embed base64-encoded in the GS2 header.
    pub fn data(&self) -> &[u8] {
        match self {
            ChannelBinding::None => &[],
            ChannelBinding::TlsServerEndPoint(d) | ChannelBinding::TlsUnique(d) => d,
        }
    }

    /// True if we actually have binding data to offer.
    pub fn is_present(&self) -> bool {
        !matches!(self, ChannelBinding::None)
    }
}

/// Credentials supplied to a client-side [`Mechanism`][`crate::client::Mechanism`].
#[derive(Clone, Debug, Default)]
pub struct Credentials {
    /// The authentication identity (`username` in PLAIN/SCRAM terms).
    pub username: String,
    /// The authorization identity, if distinct from `username`.
    pub authid: Option<String>,
    /// The password, if any (absent for ANONYMOUS/EXTERNAL).
    pub password: Option<Password>,
    /// Channel binding data from the transport, if any.
    pub channel_binding: ChannelBinding,
}

impl Credentials {
    /// Set the username.
    pub fn with_username<S: Into<String>>(mut self, username: S) -> Self {
        self.username = username.into();
        self
    }

    /// Set the password from a plaintext string.
    pub fn with_password<S: Into<String>>(mut self, password: S) -> Self {
        self.password = Some(Password::Plain(password.into()));
        self
    }

    /// Set the channel binding data.
    pub fn with_channel_binding(mut self, channel_binding: ChannelBinding) -> Self {
        self.channel_binding = channel_binding;
        self
    }
}
