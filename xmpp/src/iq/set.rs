// Copyright (c) 2023 xmpp-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use tokio_xmpp::{
    jid::Jid,
    minidom::Element,
    parsers::{
        iq::Iq,
        ns,
        roster::{Roster, Subscription},
        stanza_error::{DefinedCondition, ErrorType, StanzaError},
    },
};

use crate::{roster::RosterService, Agent, Event};

pub async fn handle_iq_set(
    agent: &mut Agent,
    events: &mut Vec<Event>,
    from: Jid,
    _to: Option<Jid>,
    id: String,
    payload: Element,
) {
    // Roster pushes (RFC 6121 §2.1.6) are sent by the server with no `from`,
    // or from our own bare JID.
    let from_ourselves = agent
        .bound_jid()
        .map(|jid| from == jid.to_bare())
        .unwrap_or(false);
    if payload.is("query", ns::ROSTER) && from_ourselves {
        match Roster::try_from(payload) {
            Ok(roster) => {
                if let Some(item) = roster.items.into_iter().next() {
                    if let Ok(service) = agent.registry.summon::<RosterService>() {
                        service.apply_push(item.clone()).await;
                    }
                    events.push(if item.subscription == Subscription::Remove {
                        Event::ContactRemoved(item)
                    } else {
                        Event::ContactChanged(item)
                    });
                }
                let iq = Iq::empty_result(id).with_to(from).into();
                let _ = agent.client.send_stanza(iq).await;
            }
            Err(e) => {
                error!("Malformed roster push from {}: {}", from, e);
            }
        }
        return;
    }

    // We MUST answer unhandled set iqs with a service-unavailable error.
    let error = StanzaError::new(
        ErrorType::Cancel,
        DefinedCondition::ServiceUnavailable,
        "en",
        "No handler defined for this kind of iq.",
    );
    let iq = Iq::from_error(id, error).with_to(from).into();
    let _ = agent.client.send_stanza(iq).await;
}
