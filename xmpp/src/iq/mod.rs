// Copyright (c) 2023 xmpp-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use tokio_xmpp::parsers::iq::{Iq, IqType};

use crate::{Agent, Event};

pub mod get;
pub mod result;
pub mod set;

/// Dispatches an incoming [`Iq`] stanza to the handler matching its `@type`.
///
/// A stanza received on a bound stream with no `from` is implicitly from our
/// own account (RFC 6120 §8.1.3.1), not an absent sender.
pub async fn handle_iq(agent: &mut Agent, iq: Iq) -> Vec<Event> {
    let mut events = Vec::new();
    let from = iq
        .from
        .clone()
        .unwrap_or_else(|| agent.bound_jid().unwrap().to_bare().into());

    match iq.payload {
        IqType::Set(payload) => {
            set::handle_iq_set(agent, &mut events, from, iq.to, iq.id, payload).await;
        }
        IqType::Result(Some(payload)) => {
            result::handle_iq_result(agent, &mut events, from, iq.to, iq.id, payload).await;
        }
        IqType::Result(None) => {}
        IqType::Get(payload) => {
            get::handle_iq_get(agent, &mut events, from, iq.to, iq.id, payload).await;
        }
        IqType::Error(_) => {
            // TODO: report errors somewhere useful instead of dropping them.
        }
    }

    events
}
