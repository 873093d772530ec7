// Copyright (c) 2017 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! XML namespace constants used across the stanza and nonza definitions in
//! this crate.

/// Default namespace for client-to-server stanzas (RFC 6120).
pub const DEFAULT_NS: &str = "jabber:client";

/// `http://etherx.jabber.org/streams`
pub const STREAM: &str = "http://etherx.jabber.org/streams";

/// `urn:ietf:params:xml:ns:xmpp-streams`
pub const XMPP_STREAMS: &str = "urn:ietf:params:xml:ns:xmpp-streams";

/// `urn:ietf:params:xml:ns:xmpp-tls`
pub const TLS: &str = "urn:ietf:params:xml:ns:xmpp-tls";

/// `urn:ietf:params:xml:ns:xmpp-sasl`
pub const SASL: &str = "urn:ietf:params:xml:ns:xmpp-sasl";

/// `urn:ietf:params:xml:ns:xmpp-stanzas`
pub const XMPP_STANZAS: &str = "urn:ietf:params:xml:ns:xmpp-stanzas";

/// `urn:ietf:params:xml:ns:xmpp-bind`
pub const BIND: &str = "urn:ietf:params:xml:ns:xmpp-bind";

/// `urn:xmpp:sm:3` ([XEP-0198](https://xmpp.org/extensions/xep-0198.html))
pub const SM: &str = "urn:xmpp:sm:3";

/// `jabber:iq:roster` ([RFC 6121](https://tools.ietf.org/html/rfc6121))
pub const ROSTER: &str = "jabber:iq:roster";

/// `urn:xmpp:ping` ([XEP-0199](https://xmpp.org/extensions/xep-0199.html))
pub const PING: &str = "urn:xmpp:ping";

/// `http://jabber.org/protocol/disco#info`
/// ([XEP-0030](https://xmpp.org/extensions/xep-0030.html))
pub const DISCO_INFO: &str = "http://jabber.org/protocol/disco#info";

/// `http://jabber.org/protocol/disco#items`
/// ([XEP-0030](https://xmpp.org/extensions/xep-0030.html))
pub const DISCO_ITEMS: &str = "http://jabber.org/protocol/disco#items";

/// `jabber:x:data` ([XEP-0004](https://xmpp.org/extensions/xep-0004.html))
pub const DATA_FORMS: &str = "jabber:x:data";

/// `urn:xmpp:media-element`
/// ([XEP-0221](https://xmpp.org/extensions/xep-0221.html))
pub const MEDIA_ELEMENT: &str = "urn:xmpp:media-element";

/// `http://jabber.org/protocol/rsm`
/// ([XEP-0059](https://xmpp.org/extensions/xep-0059.html))
pub const RSM: &str = "http://jabber.org/protocol/rsm";

/// `http://jabber.org/protocol/muc`
/// ([XEP-0045](https://xmpp.org/extensions/xep-0045.html))
pub const MUC: &str = "http://jabber.org/protocol/muc";

/// `http://jabber.org/protocol/muc#user`
pub const MUC_USER: &str = "http://jabber.org/protocol/muc#user";

/// `http://jabber.org/protocol/muc#owner`
pub const MUC_OWNER: &str = "http://jabber.org/protocol/muc#owner";

/// `http://jabber.org/protocol/muc#admin`
pub const MUC_ADMIN: &str = "http://jabber.org/protocol/muc#admin";

/// `http://jabber.org/protocol/pubsub`
/// ([XEP-0060](https://xmpp.org/extensions/xep-0060.html))
pub const PUBSUB: &str = "http://jabber.org/protocol/pubsub";

/// `http://jabber.org/protocol/pubsub#event`
pub const PUBSUB_EVENT: &str = "http://jabber.org/protocol/pubsub#event";

/// `http://jabber.org/protocol/pubsub#owner`
pub const PUBSUB_OWNER: &str = "http://jabber.org/protocol/pubsub#owner";

/// `http://jabber.org/protocol/pubsub#errors`
pub const PUBSUB_ERRORS: &str = "http://jabber.org/protocol/pubsub#errors";

/// `http://jabber.org/protocol/commands`
/// ([XEP-0050](https://xmpp.org/extensions/xep-0050.html))
pub const COMMANDS: &str = "http://jabber.org/protocol/commands";

/// `urn:xmpp:delay` ([XEP-0203](https://xmpp.org/extensions/xep-0203.html))
pub const DELAY: &str = "urn:xmpp:delay";

/// `urn:xmpp:message-correct:0`
/// ([XEP-0308](https://xmpp.org/extensions/xep-0308.html))
pub const MESSAGE_CORRECT: &str = "urn:xmpp:message-correct:0";
