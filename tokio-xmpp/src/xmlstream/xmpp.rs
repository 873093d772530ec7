// Copyright (c) 2024 Jonas Schäfer <jonas@zombofant.net>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use core::pin::Pin;
use core::task::{Context, Poll};
use std::io;

use futures::Sink;

use tokio::io::AsyncWrite;

use xso::{AsXml, FromXml};

use xmpp_parsers::{component, sasl, sm, starttls, stream_error::StreamError};

use crate::event::Stanza;

use super::XmppStream;

/// Any valid XMPP stream-level element.
#[derive(FromXml, AsXml, Debug)]
#[xml()]
pub enum XmppStreamElement {
    /// A stanza (`<iq/>`, `<message/>` or `<presence/>`).
    #[xml(transparent)]
    Stanza(Stanza),

    /// SASL-related nonza
    #[xml(transparent)]
    Sasl(sasl::Nonza),

    /// STARTTLS-related nonza
    #[xml(transparent)]
    Starttls(starttls::Nonza),

    /// Component protocol nonzas
    #[xml(transparent)]
    ComponentHandshake(component::Handshake),

    /// Stream management (XEP-0198) nonza
    #[xml(transparent)]
    SM(sm::Nonza),

    /// A `<stream:error/>` element received from the peer.
    #[xml(transparent)]
    StreamError(StreamError),
}

impl From<&Stanza> for XmppStreamElement {
    fn from(other: &Stanza) -> Self {
        Self::Stanza(other.clone())
    }
}

/// Send a single stanza on the stream without taking ownership of it.
///
/// This is a thin wrapper around `Sink<&XmppStreamElement>` that clones the
/// stanza into a fresh [`XmppStreamElement`] for serialisation. The clone is
/// dropped again once [`start_send`][`Sink::start_send`] returns.
impl<'x, Io: AsyncWrite> Sink<&'x Stanza> for XmppStream<Io> {
    type Error = io::Error;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        <Self as Sink<&XmppStreamElement>>::poll_ready(self, cx)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        <Self as Sink<&XmppStreamElement>>::poll_flush(self, cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        <Self as Sink<&XmppStreamElement>>::poll_close(self, cx)
    }

    fn start_send(self: Pin<&mut Self>, item: &'x Stanza) -> Result<(), Self::Error> {
        let element = XmppStreamElement::from(item);
        <Self as Sink<&XmppStreamElement>>::start_send(self, &element)
    }
}
