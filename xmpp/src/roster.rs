// Copyright (c) 2023 xmpp-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contact list cache, backed by the roster pushes and the initial roster
//! fetch result.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::{
    jid::BareJid,
    parsers::roster::{Item, Subscription},
    registry::{Service, ServiceRegistry},
    Error,
};

/// Caches the account's contact list, as populated by the initial roster
/// fetch and kept current by subsequent roster pushes.
#[derive(Default)]
pub struct RosterService {
    items: RwLock<HashMap<BareJid, Item>>,
}

impl RosterService {
    /// Replaces the whole cached roster, as received in the initial
    /// post-login roster fetch result.
    pub async fn replace_all(&self, items: Vec<Item>) {
        let mut cache = self.items.write().await;
        cache.clear();
        for item in items {
            cache.insert(item.jid.clone(), item);
        }
    }

    /// Applies a single roster push: a `subscription='remove'` item drops
    /// the contact, anything else inserts or replaces it.
    pub async fn apply_push(&self, item: Item) {
        let mut cache = self.items.write().await;
        if item.subscription == Subscription::Remove {
            cache.remove(&item.jid);
        } else {
            cache.insert(item.jid.clone(), item);
        }
    }

    /// Returns the cached contact, if any.
    pub async fn get(&self, jid: &BareJid) -> Option<Item> {
        self.items.read().await.get(jid).cloned()
    }

    /// Returns every cached contact.
    pub async fn all(&self) -> Vec<Item> {
        self.items.read().await.values().cloned().collect()
    }
}

impl Service for RosterService {
    fn new(_registry: &mut ServiceRegistry) -> Result<Self, Error> {
        Ok(RosterService::default())
    }
}
