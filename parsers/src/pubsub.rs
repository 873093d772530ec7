// Copyright (c) 2017 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! XEP-0060: Publish-Subscribe

use xso::{AsXml, FromXml};

use minidom::Element;

use crate::iq::{IqGetPayload, IqResultPayload, IqSetPayload};
use crate::ns;

generate_elem_id!(
    /// The name of a pubsub node.
    NodeName,
    "node",
    PUBSUB
);

generate_elem_id!(
    /// The identifier of a single item published to a node.
    ItemId,
    "id",
    PUBSUB
);

/// A single published item, with its identifier and an opaque payload.
///
/// The payload is left as a raw [`Element`] since its shape is defined by
/// whatever application is using the node (e.g. a XEP-specific schema).
#[derive(FromXml, AsXml, PartialEq, Debug, Clone)]
#[xml(namespace = ns::PUBSUB, name = "item")]
pub struct Item {
    /// Identifier of this item within its node.
    #[xml(attribute(default))]
    pub id: Option<String>,

    /// The single payload element carried by this item, if any.
    #[xml(element(n = ..))]
    pub payload: Option<Element>,
}

/// Request for, or result containing, the items published to a node.
#[derive(FromXml, AsXml, PartialEq, Debug, Clone)]
#[xml(namespace = ns::PUBSUB, name = "items")]
pub struct Items {
    /// Node on which to operate.
    #[xml(attribute)]
    pub node: String,

    /// Restrict the number of items returned to this many, most recent
    /// first.
    #[xml(attribute(default))]
    pub max_items: Option<u32>,

    /// The items themselves; empty when this is only a request.
    #[xml(child(n = ..))]
    pub items: Vec<Item>,
}

impl Items {
    /// Requests the items of the given node, without limit.
    pub fn new(node: impl Into<String>) -> Items {
        Items {
            node: node.into(),
            max_items: None,
            items: Vec::new(),
        }
    }
}

/// Request to publish one or more items to a node.
#[derive(FromXml, AsXml, PartialEq, Debug, Clone)]
#[xml(namespace = ns::PUBSUB, name = "publish")]
pub struct Publish {
    /// Node to publish to.
    #[xml(attribute)]
    pub node: String,

    /// Items to publish.
    #[xml(child(n = ..))]
    pub items: Vec<Item>,
}

/// Request to subscribe the requester's bare JID to a node.
#[derive(FromXml, AsXml, PartialEq, Debug, Clone)]
#[xml(namespace = ns::PUBSUB, name = "subscribe")]
pub struct Subscribe {
    /// Node to subscribe to.
    #[xml(attribute)]
    pub node: String,

    /// JID to register as subscriber.
    #[xml(attribute)]
    pub jid: jid::Jid,
}

generate_attribute!(
    /// The state of a subscription, as returned in a subscribe response.
    SubscriptionState, "subscription", {
        /// Subscription request is pending approval.
        Pending => "pending",

        /// Fully subscribed.
        Subscribed => "subscribed",

        /// Subscription ended, or never existed.
        None => "none",

        /// Subscription has been configured, but requires further setup.
        Unconfigured => "unconfigured",
    }, Default = None
);

/// Result of a subscription request.
#[derive(FromXml, AsXml, PartialEq, Debug, Clone)]
#[xml(namespace = ns::PUBSUB, name = "subscription")]
pub struct Subscription {
    /// Node the subscription applies to.
    #[xml(attribute)]
    pub node: String,

    /// Subscriber JID.
    #[xml(attribute)]
    pub jid: jid::Jid,

    /// Current state of the subscription.
    #[xml(attribute(default))]
    pub subscription: SubscriptionState,
}

/// The single operation carried inside a `<pubsub/>` IQ payload.
#[derive(FromXml, AsXml, PartialEq, Debug, Clone)]
#[xml()]
pub enum PubSubPayload {
    /// Retrieving or receiving a node's items.
    #[xml(transparent)]
    Items(Items),

    /// Publishing items to a node.
    #[xml(transparent)]
    Publish(Publish),

    /// Subscribing to a node.
    #[xml(transparent)]
    Subscribe(Subscribe),

    /// The result of a subscription request.
    #[xml(transparent)]
    Subscription(Subscription),
}

/// The `<pubsub xmlns='http://jabber.org/protocol/pubsub'/>` IQ payload,
/// used both for requests (get items, subscribe, publish) and results.
#[derive(FromXml, AsXml, PartialEq, Debug, Clone)]
#[xml(namespace = ns::PUBSUB, name = "pubsub")]
pub struct PubSub {
    /// The operation this payload requests or reports.
    #[xml(child)]
    pub payload: PubSubPayload,
}

impl IqGetPayload for PubSub {}
impl IqSetPayload for PubSub {}
impl IqResultPayload for PubSub {}

/// `<event xmlns='http://jabber.org/protocol/pubsub#event'/>` notifications,
/// delivered as message payloads.
pub mod event {
    use super::*;
    use crate::message::MessagePayload;

    /// Items were published to, or retracted from, a node.
    #[derive(FromXml, AsXml, PartialEq, Debug, Clone)]
    #[xml(namespace = ns::PUBSUB_EVENT, name = "items")]
    pub struct EventItems {
        /// Node these items belong to.
        #[xml(attribute)]
        pub node: String,

        /// Items that were published.
        #[xml(child(n = ..))]
        pub published: Vec<Item>,

        /// Identifiers of items that were retracted.
        #[xml(extract(n = .., name = "retract", fields(attribute(name = "id", type_ = String))))]
        pub retracted: Vec<String>,
    }

    /// A node's entire item set was purged.
    #[derive(FromXml, AsXml, PartialEq, Debug, Clone)]
    #[xml(namespace = ns::PUBSUB_EVENT, name = "purge")]
    pub struct Purge {
        /// The purged node.
        #[xml(attribute)]
        pub node: String,
    }

    /// The single change described by an event notification.
    #[derive(FromXml, AsXml, PartialEq, Debug, Clone)]
    #[xml()]
    pub enum EventPayload {
        /// Items published or retracted.
        #[xml(transparent)]
        Items(EventItems),

        /// Node purged.
        #[xml(transparent)]
        Purge(Purge),
    }

    /// `<event xmlns='http://jabber.org/protocol/pubsub#event'/>`
    /// notification, delivered as a message payload.
    #[derive(FromXml, AsXml, PartialEq, Debug, Clone)]
    #[xml(namespace = ns::PUBSUB_EVENT, name = "event")]
    pub struct Event {
        /// The change being reported.
        #[xml(child)]
        pub payload: EventPayload,
    }

    impl MessagePayload for Event {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_request() {
        let elem: Element = "<pubsub xmlns='http://jabber.org/protocol/pubsub'>
            <items node='urn:xmpp:avatar:data'/>
        </pubsub>"
            .parse()
            .unwrap();
        let pubsub = PubSub::try_from(elem).unwrap();
        match pubsub.payload {
            PubSubPayload::Items(items) => {
                assert_eq!(items.node, "urn:xmpp:avatar:data");
                assert!(items.items.is_empty());
            }
            _ => panic!("wrong PubSub variant"),
        }
    }

    #[test]
    fn test_publish() {
        let elem: Element = "<pubsub xmlns='http://jabber.org/protocol/pubsub'>
            <publish node='urn:xmpp:avatar:data'>
                <item id='1'/>
            </publish>
        </pubsub>"
            .parse()
            .unwrap();
        let pubsub = PubSub::try_from(elem).unwrap();
        match pubsub.payload {
            PubSubPayload::Publish(publish) => {
                assert_eq!(publish.node, "urn:xmpp:avatar:data");
                assert_eq!(publish.items.len(), 1);
                assert_eq!(publish.items[0].id.as_deref(), Some("1"));
            }
            _ => panic!("wrong PubSub variant"),
        }
    }

    #[test]
    fn test_event_items() {
        let elem: Element = "<event xmlns='http://jabber.org/protocol/pubsub#event'>
            <items node='urn:xmpp:avatar:metadata'>
                <item id='abc'/>
            </items>
        </event>"
            .parse()
            .unwrap();
        let event = event::Event::try_from(elem).unwrap();
        match event.payload {
            event::EventPayload::Items(items) => {
                assert_eq!(items.node, "urn:xmpp:avatar:metadata");
                assert_eq!(items.published.len(), 1);
            }
            _ => panic!("wrong Event variant"),
        }
    }
}
