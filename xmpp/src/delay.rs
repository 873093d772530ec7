// Copyright (c) 2023 xmpp-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use tokio_xmpp::parsers::{date::DateTime, delay::Delay, message::Message};

/// Timing information carried alongside an [`Event`][crate::Event], telling
/// the caller when a message was actually sent, as opposed to when it was
/// received (which may differ when the message was held back by the server,
/// e.g. MUC history replay).
#[derive(Clone, Debug)]
pub struct StanzaTimeInfo {
    /// When this stanza was received by us.
    pub received: DateTime,

    /// When this stanza was originally sent, if it carried a delayed
    /// delivery ([XEP-0203](https://xmpp.org/extensions/xep-0203.html))
    /// annotation.
    pub delay: Option<DateTime>,
}

/// Extracts the delayed delivery annotation from a message, if any, pairing
/// it with the current time.
pub fn message_time_info(message: &Message) -> StanzaTimeInfo {
    let delay = message
        .payloads
        .iter()
        .find_map(|payload| Delay::try_from(payload.clone()).ok())
        .map(|delay| delay.stamp);

    StanzaTimeInfo {
        received: now(),
        delay,
    }
}

fn now() -> DateTime {
    chrono::Utc::now().fixed_offset().into()
}
