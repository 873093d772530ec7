// Copyright (c) 2023 xmpp-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
#[cfg(any(feature = "starttls-rust", feature = "starttls-native"))]
use tokio_xmpp::connect::{DnsConfig, StartTlsServerConnector};
#[cfg(feature = "starttls-rust")]
use tokio_xmpp::connect::pinning::{PinKind, PinStore, PinStoreError, PinnedKey};
use tokio_xmpp::{
    connect::ServerConnector,
    jid::{BareJid, Jid},
    parsers::{
        disco::{DiscoInfoResult, Feature, Identity},
        ns,
    },
    xmlstream::Timeouts,
    Client as TokioXmppClient,
};

use crate::{registry::ServiceRegistry, Agent, ClientFeature};

#[derive(Debug)]
pub enum ClientType {
    Bot,
    Pc,
}

impl Default for ClientType {
    fn default() -> Self {
        ClientType::Bot
    }
}

impl ToString for ClientType {
    fn to_string(&self) -> String {
        String::from(match self {
            ClientType::Bot => "bot",
            ClientType::Pc => "pc",
        })
    }
}

/// Where the account password comes from: a fixed string, or a callback
/// invoked fresh before every connection attempt (e.g. to hand out a
/// short-lived token).
enum Credential<'a> {
    Literal(&'a str),
    Provider(Arc<dyn Fn() -> String + Send + Sync>),
}

pub struct ClientBuilder<'a, C: ServerConnector> {
    jid: BareJid,
    password: Credential<'a>,
    server_connector: C,
    website: String,
    default_nick: String,
    lang: Vec<String>,
    disco: (ClientType, String),
    features: Vec<ClientFeature>,
    resource: Option<String>,
    timeouts: Timeouts,
    /// Which hash [`PinKind`] `add_pin` produces pins of, when no explicit
    /// kind is given.
    #[cfg(feature = "starttls-rust")]
    pin_type: PinKind,
    max_initial_attempts: Option<u32>,
}

#[cfg(any(feature = "starttls-rust", feature = "starttls-native"))]
impl ClientBuilder<'_, StartTlsServerConnector> {
    pub fn new<'a>(jid: BareJid, password: &'a str) -> ClientBuilder<'a, StartTlsServerConnector> {
        Self::new_with_connector(
            jid.clone(),
            password,
            StartTlsServerConnector::from(DnsConfig::srv_default_client(jid.domain())),
        )
    }

    /// Bypass SRV/A/AAAA discovery and dial `host:port` directly, as if it
    /// were the server's sole, highest-priority address.
    pub fn set_override_peer(mut self, host: &str, port: u16) -> Self {
        self.server_connector.dns_config = DnsConfig::override_peer(host, port);
        self
    }

    /// Attaches a certificate pin store, consulted ahead of the usual PKI
    /// check for any host it has pins for.
    #[cfg(feature = "starttls-rust")]
    pub fn set_pin_store(mut self, pin_store: PinStore) -> Self {
        self.server_connector = self.server_connector.with_pin_store(pin_store);
        self
    }

    /// Loads a pin store from `path` (see [`PinStore::load_from_file`]) and
    /// attaches it.
    #[cfg(feature = "starttls-rust")]
    pub fn load_pin_store(self, path: &Path) -> Result<Self, PinStoreError> {
        let pin_store = PinStore::load_from_file(path)?;
        Ok(self.set_pin_store(pin_store))
    }

    /// Sets the [`PinKind`] used by [`Self::add_pin`] when pinning a host.
    #[cfg(feature = "starttls-rust")]
    pub fn set_pin_type(mut self, pin_type: PinKind) -> Self {
        self.pin_type = pin_type;
        self
    }

    /// Pins `value` (a SHA-256 digest) for `host`, using the current
    /// [`Self::set_pin_type`] kind.
    #[cfg(feature = "starttls-rust")]
    pub fn add_pin(mut self, host: &str, value: Vec<u8>) -> Self {
        let pin_store = Arc::make_mut(&mut self.server_connector.pin_store);
        pin_store.add_pin(
            host,
            PinnedKey {
                kind: self.pin_type,
                value,
            },
        );
        self
    }
}

impl<C: ServerConnector> ClientBuilder<'_, C> {
    pub fn new_with_connector<'a>(
        jid: BareJid,
        password: &'a str,
        server_connector: C,
    ) -> ClientBuilder<'a, C> {
        ClientBuilder {
            jid,
            password: Credential::Literal(password),
            server_connector,
            website: String::from("https://gitlab.com/xmpp-rs/tokio-xmpp"),
            default_nick: String::from("xmpp-rs"),
            lang: vec![String::from("en")],
            disco: (ClientType::default(), String::from("tokio-xmpp")),
            features: vec![],
            resource: None,
            timeouts: Timeouts::default(),
            #[cfg(feature = "starttls-rust")]
            pin_type: PinKind::PublicKey,
            max_initial_attempts: None,
        }
    }

    /// Fetches the password fresh from `provider` before every connection
    /// attempt, instead of using a fixed password. Useful for credentials
    /// that can be refreshed between reconnects (e.g. rotating tokens).
    pub fn set_password_provider(
        mut self,
        provider: impl Fn() -> String + Send + Sync + 'static,
    ) -> Self {
        self.password = Credential::Provider(Arc::new(provider));
        self
    }

    /// Gives up (ending the client's event stream) after `max_attempts`
    /// failed connections if the stream has never been established yet.
    /// Once connected once, reconnects are retried indefinitely regardless
    /// of this setting.
    pub fn set_max_initial_attempts(mut self, max_attempts: u32) -> Self {
        self.max_initial_attempts = Some(max_attempts);
        self
    }

    /// How long a dropped Stream Management session may go unresumed before
    /// it is considered lost. Maps onto [`Timeouts::read_timeout`], which
    /// governs how long the stream may stay silent before that's treated as
    /// a sign the connection needs replacing.
    pub fn set_resumption_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeouts.read_timeout = timeout;
        self
    }

    /// How long stream feature negotiation (STARTTLS, SASL, resource
    /// binding) may take before it's considered stuck. Maps onto
    /// [`Timeouts::response_timeout`], the hard deadline after a soft
    /// timeout during the handshake.
    pub fn set_negotiation_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeouts.response_timeout = timeout;
        self
    }

    /// Optionally set a resource associated to this device on the client
    pub fn set_resource(mut self, resource: &str) -> Self {
        self.resource = Some(resource.to_string());
        self
    }

    pub fn set_client(mut self, type_: ClientType, name: &str) -> Self {
        self.disco = (type_, String::from(name));
        self
    }

    pub fn set_website(mut self, url: &str) -> Self {
        self.website = String::from(url);
        self
    }

    pub fn set_default_nick(mut self, nick: &str) -> Self {
        self.default_nick = String::from(nick);
        self
    }

    pub fn set_lang(mut self, lang: Vec<String>) -> Self {
        self.lang = lang;
        self
    }

    /// Configure the timeouts used.
    ///
    /// See [`Timeouts`] for more information on the semantics and the
    /// defaults (which are used unless you call this method).
    pub fn set_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn enable_feature(mut self, feature: ClientFeature) -> Self {
        self.features.push(feature);
        self
    }

    fn make_disco(&self) -> DiscoInfoResult {
        let identities = vec![Identity::new(
            "client",
            self.disco.0.to_string(),
            "en",
            self.disco.1.to_string(),
        )];
        let mut features = vec![Feature::new(ns::DISCO_INFO)];
        if self.features.contains(&ClientFeature::JoinRooms) {
            features.push(Feature::new(ns::MUC));
        }
        DiscoInfoResult {
            node: None,
            identities,
            features,
            extensions: vec![],
        }
    }

    pub fn build(self) -> Agent {
        let jid: Jid = if let Some(resource) = &self.resource {
            self.jid.with_resource_str(resource).unwrap().into()
        } else {
            self.jid.clone().into()
        };

        let client = match &self.password {
            Credential::Literal(password) => TokioXmppClient::new_with_connector_and_limit(
                jid,
                *password,
                self.server_connector.clone(),
                self.timeouts,
                self.max_initial_attempts,
            ),
            Credential::Provider(provider) => TokioXmppClient::new_with_password_provider(
                jid,
                provider.clone(),
                self.server_connector.clone(),
                self.timeouts,
                self.max_initial_attempts,
            ),
        };
        self.build_impl(client)
    }

    // This function is meant to be used for testing build
    pub(crate) fn build_impl(self, client: TokioXmppClient) -> Agent {
        let disco = self.make_disco();
        let node = self.website;

        Agent {
            client,
            default_nick: Arc::new(RwLock::new(self.default_nick)),
            lang: Arc::new(self.lang),
            disco,
            node,
            rooms_joined: HashMap::new(),
            rooms_joining: HashMap::new(),
            rooms_leaving: HashMap::new(),
            registry: ServiceRegistry::new(),
        }
    }
}
