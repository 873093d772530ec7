// Copyright (c) 2023 xmpp-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// Opt-in high-level behaviour toggled on a [`ClientBuilder`][crate::ClientBuilder]
/// before the [`Agent`][crate::Agent] is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientFeature {
    /// Request the roster on connect and emit `ContactAdded`/`ContactChanged`/
    /// `ContactRemoved` events ([RFC 6121]).
    ///
    /// [RFC 6121]: https://tools.ietf.org/html/rfc6121
    ContactList,

    /// Advertise support for joining rooms via [`Agent::join_room`][crate::Agent::join_room]
    /// ([XEP-0045](https://xmpp.org/extensions/xep-0045.html)).
    JoinRooms,
}
