// Copyright (c) 2019 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{
    jid::Jid,
    minidom::Element,
    parsers::pubsub::{event, PubSub, PubSubPayload},
    Agent, Event,
};

/// Handles an incoming `<event xmlns='http://jabber.org/protocol/pubsub#event'/>`
/// message payload (XEP-0060 §4.3 notifications).
pub(crate) async fn handle_event(from: &Jid, elem: Element, _agent: &mut Agent) -> Vec<Event> {
    let events = Vec::new();

    match event::Event::try_from(elem) {
        Ok(event::Event {
            payload: event::EventPayload::Items(items),
        }) => {
            trace!(
                "PubSub items event on node {} from {}: {} published, {} retracted",
                items.node,
                from,
                items.published.len(),
                items.retracted.len()
            );
        }
        Ok(event::Event {
            payload: event::EventPayload::Purge(purge),
        }) => {
            trace!("PubSub node {} purged by {}", purge.node, from);
        }
        Err(e) => {
            error!("Error parsing PubSub event: {}", e);
        }
    }

    events
}

/// Handles a `<pubsub xmlns='http://jabber.org/protocol/pubsub'/>` IQ result.
pub(crate) async fn handle_iq_result(
    from: &Jid,
    elem: Element,
    _agent: &mut Agent,
) -> impl IntoIterator<Item = Event> {
    let events = Vec::new();

    match PubSub::try_from(elem) {
        Ok(PubSub {
            payload: PubSubPayload::Items(items),
        }) => {
            trace!(
                "PubSub items result on node {} from {}: {} items",
                items.node,
                from,
                items.items.len()
            );
        }
        Ok(pubsub) => {
            trace!("PubSub result from {}: {:?}", from, pubsub);
        }
        Err(e) => {
            error!("Error parsing PubSub result: {}", e);
        }
    }

    events
}
