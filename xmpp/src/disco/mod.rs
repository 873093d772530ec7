// Copyright (c) 2023 xmpp-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tokio_xmpp::{jid::Jid, parsers::disco::DiscoInfoResult};

use crate::{
    registry::{Service, ServiceRegistry},
    Agent, Error,
};

/// Caches disco#info results received from remote entities, so other
/// services can check feature support without re-querying.
#[derive(Default)]
pub struct DiscoService {
    cache: RwLock<HashMap<Jid, DiscoInfoResult>>,
}

impl DiscoService {
    /// Records `info` as the last known disco#info result for `from`.
    pub async fn record(&self, from: Jid, info: DiscoInfoResult) {
        self.cache.write().await.insert(from, info);
    }

    /// Returns the last known disco#info result for `from`, if any.
    pub async fn get(&self, from: &Jid) -> Option<DiscoInfoResult> {
        self.cache.read().await.get(from).cloned()
    }

    /// Whether `from`'s last known disco#info result advertises `feature`.
    /// `None` if we have no cached result for `from` yet.
    pub async fn supports(&self, from: &Jid, feature: &str) -> Option<bool> {
        self.cache
            .read()
            .await
            .get(from)
            .map(|info| info.features.iter().any(|f| f.var == feature))
    }
}

impl Service for DiscoService {
    fn new(_registry: &mut ServiceRegistry) -> Result<Self, Error> {
        Ok(DiscoService::default())
    }
}

/// Handles a `<query xmlns='http://jabber.org/protocol/disco#info'/>` IQ
/// result, as received in response to our own disco queries.
pub async fn handle_disco_info_result(agent: &mut Agent, disco: DiscoInfoResult, from: Jid) {
    trace!("Received disco#info from {}: {:?}", from, disco.features);
    if let Ok(service) = agent.registry.summon::<DiscoService>() {
        service.record(from, disco).await;
    }
}
