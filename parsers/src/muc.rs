// Copyright (c) 2017 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! XEP-0045: Multi-User Chat

use xso::{AsXml, FromXml};

use jid::Jid;

use crate::message::MessagePayload;
use crate::ns;
use crate::presence::PresencePayload;

/// Optional direct child of the `<x/>` element used when joining a room,
/// requesting the server to send the given amount of history upon entry.
#[derive(FromXml, AsXml, PartialEq, Debug, Clone, Default)]
#[xml(namespace = ns::MUC, name = "history")]
pub struct History {
    /// Limit the total number of characters in the history to "X"
    /// (where the character count is the characters of the complete XML
    /// stanzas, not only their textual representation).
    #[xml(attribute(default))]
    pub maxchars: Option<u32>,

    /// Limit the total number of messages in the history to "X".
    #[xml(attribute(default))]
    pub maxstanzas: Option<u32>,

    /// Send only the messages received in the last "X" seconds.
    #[xml(attribute(default))]
    pub seconds: Option<u32>,

    /// Send only the messages received since the given timestamp.
    #[xml(attribute(default))]
    pub since: Option<String>,
}

/// Presence payload used to join a room, or sent back by the room together
/// with the full list of occupants.
///
/// See <https://xmpp.org/extensions/xep-0045.html#enter-muc>
#[derive(FromXml, AsXml, PartialEq, Debug, Clone, Default)]
#[xml(namespace = ns::MUC, name = "x")]
pub struct Muc {
    /// Password to use when entering a password-protected room.
    #[xml(extract(default, fields(text(type_ = String))))]
    pub password: Option<String>,

    /// Request for the amount of discussion history to be sent, if any.
    #[xml(child(default))]
    pub history: Option<History>,
}

impl Muc {
    /// Creates an empty `Muc` element, for joining a room without history
    /// replay nor password.
    pub fn new() -> Muc {
        Muc::default()
    }

    /// Requests this room's password be used while joining.
    pub fn with_password<P: Into<String>>(mut self, password: P) -> Muc {
        self.password = Some(password.into());
        self
    }

    /// Requests the given amount of history to be replayed upon entry.
    pub fn with_history(mut self, history: History) -> Muc {
        self.history = Some(history);
        self
    }
}

impl PresencePayload for Muc {}

generate_attribute!(
    /// The affiliation of an occupant with a room, which is independent of
    /// their presence in it.
    Affiliation, "affiliation", {
        /// The owner of the room.
        Owner => "owner",

        /// An admin of the room.
        Admin => "admin",

        /// A member of a members-only room, or a user allowlisted in an
        /// open room.
        Member => "member",

        /// An occupant without any affiliation.
        None => "none",

        /// A user banned from the room.
        Outcast => "outcast",
    }, Default = None
);

generate_attribute!(
    /// The role of an occupant within a room, for the duration of their
    /// visit.
    Role, "role", {
        /// May not send messages to all occupants.
        Visitor => "visitor",

        /// An occupant with voice may send messages to all occupants.
        Participant => "participant",

        /// An occupant with all the privileges.
        Moderator => "moderator",

        /// Present in the `<item/>`s broadcast when an occupant leaves.
        None => "none",
    }, Default = None
);

/// Information about an occupant, as broadcast in presence by the room.
#[derive(FromXml, AsXml, PartialEq, Debug, Clone)]
#[xml(namespace = ns::MUC_USER, name = "item")]
pub struct MucUserItem {
    /// The occupant's affiliation with the room.
    #[xml(attribute)]
    pub affiliation: Affiliation,

    /// The occupant's role for the duration of their visit.
    #[xml(attribute)]
    pub role: Role,

    /// The real JID of the occupant, only shown in non-anonymous rooms, or
    /// to room moderators.
    #[xml(attribute(default))]
    pub jid: Option<Jid>,

    /// The occupant's room nickname, present when this item describes a
    /// nickname change.
    #[xml(attribute(default))]
    pub nick: Option<String>,

    /// Reason given along an affiliation or role change.
    #[xml(extract(default, fields(text(type_ = String))))]
    pub reason: Option<String>,
}

/// Status code describing why a presence was sent, as defined in the MUC
/// registrar.
#[derive(FromXml, AsXml, PartialEq, Debug, Clone)]
#[xml(namespace = ns::MUC_USER, name = "status")]
pub struct Status {
    /// The numeric status code. See the MUC registrar for the meaning of
    /// the individual codes (110 = "this is you", 201 = "room created",
    /// 301 = "banned", etc).
    #[xml(attribute)]
    pub code: u16,
}

/// Sent by the room together with presence, to convey information about the
/// sending occupant and, on join, about the room itself.
///
/// See <https://xmpp.org/extensions/xep-0045.html#registrar-statuscodes>
#[derive(FromXml, AsXml, PartialEq, Debug, Clone, Default)]
#[xml(namespace = ns::MUC_USER, name = "x")]
pub struct MucUser {
    /// Affiliation/role/jid information about the occupants this stanza
    /// talks about. There is usually only one, except when the room sends
    /// the full occupant list upon entry.
    #[xml(child(n = ..))]
    pub items: Vec<MucUserItem>,

    /// Status codes giving context to the presence.
    #[xml(child(n = ..))]
    pub status: Vec<Status>,
}

impl PresencePayload for MucUser {}
impl MessagePayload for MucUser {}

#[cfg(test)]
mod tests {
    use super::*;
    use minidom::Element;

    #[test]
    fn test_simple_join() {
        let elem: Element = "<x xmlns='http://jabber.org/protocol/muc'/>"
            .parse()
            .unwrap();
        let muc = Muc::try_from(elem).unwrap();
        assert_eq!(muc.password, None);
        assert_eq!(muc.history, None);
    }

    #[test]
    fn test_password() {
        let muc = Muc::new().with_password("secret");
        let elem = Element::from(muc.clone());
        let muc2 = Muc::try_from(elem).unwrap();
        assert_eq!(muc2.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_user_item() {
        let elem: Element = "<x xmlns='http://jabber.org/protocol/muc#user'>
            <item affiliation='member' role='participant'/>
            <status code='110'/>
        </x>"
            .parse()
            .unwrap();
        let user = MucUser::try_from(elem).unwrap();
        assert_eq!(user.items.len(), 1);
        assert_eq!(user.items[0].affiliation, Affiliation::Member);
        assert_eq!(user.items[0].role, Role::Participant);
        assert_eq!(user.status.len(), 1);
        assert_eq!(user.status[0].code, 110);
    }
}
