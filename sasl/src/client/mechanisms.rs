// Copyright (c) 2017-2019 lumi <lumi@pew.im>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Concrete [`Mechanism`] implementations: `PLAIN`, `ANONYMOUS`, `EXTERNAL`
//! and `SCRAM-*`.

use core::marker::PhantomData;

use base64::engine::{general_purpose::STANDARD as Base64, Engine as _};
use getrandom::getrandom;

use crate::client::{Error, Mechanism};
use crate::common::{scram::ScramProvider, ChannelBinding, Credentials};

/// `PLAIN` ([RFC 4616](https://www.rfc-editor.org/rfc/rfc4616)): sends the
/// password in the clear. Only sensible over an already-encrypted channel.
pub struct Plain {
    authzid: String,
    authcid: String,
    password: String,
}

impl Plain {
    /// Build from credentials; fails if no password was supplied.
    pub fn from_credentials(creds: Credentials) -> Result<Plain, Error> {
        let password = match creds.password {
            Some(p) => p.plain().to_owned(),
            None => return Err(Error::MissingPassword),
        };
        Ok(Plain {
            authzid: creds.authid.unwrap_or_default(),
            authcid: creds.username,
            password,
        })
    }
}

impl Mechanism for Plain {
    fn name(&self) -> &str {
        "PLAIN"
    }

    fn initial(&mut self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(self.authzid.as_bytes());
        buf.push(0);
        buf.extend_from_slice(self.authcid.as_bytes());
        buf.push(0);
        buf.extend_from_slice(self.password.as_bytes());
        buf
    }

    fn response(&mut self, _challenge: &[u8]) -> Result<Vec<u8>, Error> {
        Err(Error::UnexpectedChallenge)
    }
}

/// `ANONYMOUS` ([RFC 4505](https://www.rfc-editor.org/rfc/rfc4505)).
pub struct Anonymous;

impl Anonymous {
    /// Build a new `ANONYMOUS` mechanism instance.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Anonymous {
        Anonymous
    }
}

impl Mechanism for Anonymous {
    fn name(&self) -> &str {
        "ANONYMOUS"
    }

    fn initial(&mut self) -> Vec<u8> {
        Vec::new()
    }

    fn response(&mut self, _challenge: &[u8]) -> Result<Vec<u8>, Error> {
        Err(Error::UnexpectedChallenge)
    }
}

/// `EXTERNAL` ([RFC 4422 appendix A](https://www.rfc-editor.org/rfc/rfc4422)):
/// authenticates using a credential established outside SASL, i.e. a TLS
/// client certificate.
pub struct External {
    authzid: String,
}

impl External {
    /// Build a new `EXTERNAL` mechanism, optionally requesting a specific
    /// authorization identity (empty string lets the server derive it from
    /// the certificate).
    pub fn new(authzid: Option<String>) -> External {
        External {
            authzid: authzid.unwrap_or_default(),
        }
    }

    /// Build from credentials; EXTERNAL never needs a password.
    pub fn from_credentials(creds: Credentials) -> Result<External, Error> {
        Ok(External::new(creds.authid))
    }
}

impl Mechanism for External {
    fn name(&self) -> &str {
        "EXTERNAL"
    }

    fn initial(&mut self) -> Vec<u8> {
        self.authzid.as_bytes().to_vec()
    }

    fn response(&mut self, _challenge: &[u8]) -> Result<Vec<u8>, Error> {
        Err(Error::UnexpectedChallenge)
    }
}

enum ScramState {
    Initial,
    WaitingServerFirst {
        gs2_header: Vec<u8>,
        client_first_bare: Vec<u8>,
        client_nonce: Vec<u8>,
    },
    Done,
}

/// `SCRAM-SHA-1`/`SCRAM-SHA-256` and their `-PLUS` (channel-binding)
/// variants, selected automatically from the [`ChannelBinding`] passed in
/// via [`Credentials`] ([RFC 5802](https://www.rfc-editor.org/rfc/rfc5802)).
pub struct Scram<P> {
    creds: Credentials,
    state: ScramState,
    name: &'static str,
    _provider: PhantomData<P>,
}

impl<P: ScramProvider> Scram<P> {
    /// Build from credentials; fails if no password was supplied.
    pub fn from_credentials(creds: Credentials) -> Result<Scram<P>, Error> {
        if creds.password.is_none() {
            return Err(Error::MissingPassword);
        }
        let name = if creds.channel_binding.is_present() {
            P::NAME_PLUS
        } else {
            P::NAME
        };
        Ok(Scram {
            creds,
            state: ScramState::Initial,
            name,
            _provider: PhantomData,
        })
    }

    fn gs2_header(&self) -> Vec<u8> {
        let mut h = Vec::new();
        if self.creds.channel_binding.is_present() {
            h.extend_from_slice(format!("p={}", self.creds.channel_binding.name()).as_bytes());
        } else {
            // We support channel binding in principle but the server didn't
            // offer a `-PLUS` mechanism, or none is available for this
            // transport.
            h.extend_from_slice(b"y");
        }
        h.push(b',');
        if let Some(authzid) = self.creds.authid.as_ref() {
            h.extend_from_slice(format!("a={}", authzid).as_bytes());
        }
        h.push(b',');
        h
    }

    fn nonce() -> Vec<u8> {
        let mut raw = [0u8; 18];
        getrandom(&mut raw).expect("system RNG must be available");
        Base64.encode(raw).into_bytes()
    }
}

fn escape_name(s: &str) -> String {
    s.replace('=', "=3D").replace(',', "=2C")
}

impl<P: ScramProvider> Mechanism for Scram<P> {
    fn name(&self) -> &str {
        self.name
    }

    fn initial(&mut self) -> Vec<u8> {
        let gs2_header = self.gs2_header();
        let nonce = Self::nonce();
        let mut client_first_bare = Vec::new();
        client_first_bare.extend_from_slice(format!("n={}", escape_name(&self.creds.username)).as_bytes());
        client_first_bare.extend_from_slice(b",r=");
        client_first_bare.extend_from_slice(&nonce);

        let mut msg = gs2_header.clone();
        msg.extend_from_slice(&client_first_bare);

        self.state = ScramState::WaitingServerFirst {
            gs2_header,
            client_first_bare,
            client_nonce: nonce,
        };
        msg
    }

    fn response(&mut self, challenge: &[u8]) -> Result<Vec<u8>, Error> {
        let (gs2_header, client_first_bare, client_nonce) = match &self.state {
            ScramState::WaitingServerFirst {
                gs2_header,
                client_first_bare,
                client_nonce,
            } => (gs2_header.clone(), client_first_bare.clone(), client_nonce.clone()),
            _ => return Err(Error::UnexpectedChallenge),
        };

        let server_first = challenge;
        let parsed = parse_scram_fields(server_first)
            .ok_or_else(|| Error::InvalidChallenge("malformed server-first-message".into()))?;
        let server_nonce = parsed
            .get("r")
            .ok_or_else(|| Error::InvalidChallenge("missing nonce".into()))?;
        if !server_nonce.as_bytes().starts_with(&client_nonce) {
            return Err(Error::InvalidChallenge(
                "server nonce does not extend client nonce".into(),
            ));
        }
        let salt = parsed
            .get("s")
            .ok_or_else(|| Error::InvalidChallenge("missing salt".into()))
            .and_then(|s| {
                Base64
                    .decode(s.as_bytes())
                    .map_err(|_| Error::InvalidChallenge("invalid salt encoding".into()))
            })?;
        let iterations: u32 = parsed
            .get("i")
            .ok_or_else(|| Error::InvalidChallenge("missing iteration count".into()))?
            .parse()
            .map_err(|_| Error::InvalidChallenge("invalid iteration count".into()))?;

        let password = self
            .creds
            .password
            .as_ref()
            .ok_or(Error::MissingPassword)?
            .plain();
        let salted_password = P::derive(password, &salt, iterations)
            .map_err(|_| Error::InvalidChallenge("password derivation failed".into()))?;

        let channel_binding_b64 = {
            let mut cb = gs2_header.clone();
            cb.extend_from_slice(self.creds.channel_binding.data());
            Base64.encode(cb)
        };

        let mut client_final_without_proof = Vec::new();
        client_final_without_proof.extend_from_slice(format!("c={}", channel_binding_b64).as_bytes());
        client_final_without_proof.extend_from_slice(b",r=");
        client_final_without_proof.extend_from_slice(server_nonce.as_bytes());

        let mut auth_message = client_first_bare;
        auth_message.push(b',');
        auth_message.extend_from_slice(server_first);
        auth_message.push(b',');
        auth_message.extend_from_slice(&client_final_without_proof);

        let client_key = P::hmac(&salted_password, b"Client Key");
        let stored_key = P::hash(&client_key);
        let client_signature = P::hmac(&stored_key, &auth_message);
        let client_proof = crate::common::scram::xor(&client_key, &client_signature);

        let mut msg = client_final_without_proof;
        msg.extend_from_slice(b",p=");
        msg.extend_from_slice(Base64.encode(client_proof).as_bytes());

        self.state = ScramState::Done;
        Ok(msg)
    }
}

fn parse_scram_fields(msg: &[u8]) -> Option<std::collections::HashMap<String, String>> {
    let msg = std::str::from_utf8(msg).ok()?;
    let mut fields = std::collections::HashMap::new();
    for part in msg.split(',') {
        let mut it = part.splitn(2, '=');
        let key = it.next()?;
        let value = it.next().unwrap_or("");
        fields.insert(key.to_owned(), value.to_owned());
    }
    Some(fields)
}
