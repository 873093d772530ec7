// Copyright (c) 2019 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use core::ops::ControlFlow::{Break, Continue};
use core::pin::Pin;
use core::task::{Context, Poll};
use std::io;

use futures::{ready, Sink, Stream};

use xmpp_parsers::{
    jid::Jid,
    sm,
    stream_error::StreamError,
    stream_features::StreamFeatures,
};

use crate::xmlstream::{ReadError, XmppStreamElement};

use super::negotiation::{NegotiationResult, NegotiationState};
use super::queue::{QueueEntry, TransmitQueue};
use super::stream_management::SmState;
use super::worker::{Never, WorkerEvent, XmppStream};

/// Event produced by driving a [`ConnectedState`].
pub(super) enum ConnectedEvent {
    /// Forward this event to the frontend.
    Worker(WorkerEvent),

    /// The connection broke (or was broken by us) and needs to be replaced.
    Disconnect {
        /// Stream management state to carry over to the replacement
        /// connection, if resumption should be attempted.
        sm_state: Option<SmState>,

        /// The error which caused (or describes) the disconnect.
        error: Option<io::Error>,
    },

    /// The peer closed the stream by sending a `</stream:stream>` footer.
    RemoteShutdown {
        /// Stream management state to carry over, since the peer may still
        /// let us resume after reconnecting.
        sm_state: Option<SmState>,
    },

    /// Local code requested the stream be shut down (e.g. via
    /// [`StanzaStream::close`][`super::StanzaStream::close`]).
    LocalShutdownRequested,
}

/// Steady-state (i.e. post-negotiation) half of a connection's lifecycle.
struct ReadyState {
    sm_state: Option<SmState>,

    /// Stream error queued by [`ConnectedState::start_send_stream_error`],
    /// still needing to be flushed to the wire.
    pending_error: Option<StreamError>,

    /// I/O error observed while driving writes, surfaced on the next call to
    /// [`ConnectedState::poll`].
    write_error: Option<io::Error>,
}

impl ReadyState {
    fn new(sm_state: Option<SmState>) -> Self {
        Self {
            sm_state,
            pending_error: None,
            write_error: None,
        }
    }

    /// Drive the write side: flush outstanding stream-management
    /// acknowledgements and requests ahead of the application queue, and a
    /// queued stream error ahead of everything else.
    fn poll_writes(
        &mut self,
        mut stream: Pin<&mut XmppStream>,
        transmit_queue: &mut TransmitQueue<QueueEntry>,
        cx: &mut Context,
    ) -> Poll<Never> {
        loop {
            match ready!(<XmppStream as Sink<&XmppStreamElement>>::poll_ready(
                stream.as_mut(),
                cx
            )) {
                Ok(()) => (),
                Err(e) => {
                    self.write_error = Some(e);
                    return Poll::Pending;
                }
            }

            if let Some(error) = self.pending_error.take() {
                let element = XmppStreamElement::StreamError(error);
                if let Err(e) = stream.as_mut().start_send(&element) {
                    self.write_error = Some(e);
                }
                continue;
            }

            if let Some(sm_state) = self.sm_state.as_mut() {
                if sm_state.pending_req {
                    sm_state.pending_req = false;
                    if let Err(e) =
                        stream.as_mut().start_send(&XmppStreamElement::SM(sm::Nonza::Req(sm::R)))
                    {
                        self.write_error = Some(e);
                    }
                    continue;
                }

                if sm_state.pending_acks > 0 {
                    sm_state.pending_acks = 0;
                    let ack = sm::A::new(sm_state.inbound_ctr());
                    if let Err(e) = stream
                        .as_mut()
                        .start_send(&XmppStreamElement::SM(sm::Nonza::Ack(ack)))
                    {
                        self.write_error = Some(e);
                    }
                    continue;
                }
            }

            match transmit_queue.poll_next(cx) {
                Poll::Ready(Some(entry_ref)) => {
                    let entry = entry_ref.take();
                    if let Err(e) = stream.as_mut().start_send(&*entry.stanza) {
                        self.write_error = Some(e);
                        continue;
                    }
                    if let Some(sm_state) = self.sm_state.as_mut() {
                        sm_state.enqueue(entry);
                    } else {
                        entry
                            .token
                            .send_replace(super::queue::StanzaState::SentWithoutSm);
                    }
                }
                Poll::Ready(None) | Poll::Pending => break,
            }
        }

        match <XmppStream as Sink<&XmppStreamElement>>::poll_flush(stream, cx) {
            Poll::Ready(Err(e)) => self.write_error = Some(e),
            Poll::Ready(Ok(())) | Poll::Pending => (),
        }

        Poll::Pending
    }

    fn poll(
        &mut self,
        mut stream: Pin<&mut XmppStream>,
        cx: &mut Context<'_>,
    ) -> Poll<ConnectedEvent> {
        if let Some(error) = self.write_error.take() {
            return Poll::Ready(ConnectedEvent::Disconnect {
                sm_state: self.sm_state.take(),
                error: Some(error),
            });
        }

        let item = ready!(stream.as_mut().poll_next(cx));
        let item = item.unwrap_or_else(|| {
            Err(ReadError::HardError(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "eof before stream footer",
            )))
        });

        match item {
            Ok(XmppStreamElement::Stanza(data)) => {
                if let Some(sm_state) = self.sm_state.as_mut() {
                    sm_state.stanza_received();
                }
                Poll::Ready(ConnectedEvent::Worker(WorkerEvent::Stanza(data)))
            }

            Ok(XmppStreamElement::SM(sm::Nonza::Req(_))) => {
                if let Some(sm_state) = self.sm_state.as_mut() {
                    sm_state.pending_acks += 1;
                }
                Poll::Pending
            }

            Ok(XmppStreamElement::SM(sm::Nonza::Ack(ack))) => {
                if let Some(sm_state) = self.sm_state.as_mut() {
                    if let Err(e) = sm_state.remote_acked(ack.h) {
                        self.pending_error = Some(e.into());
                    }
                }
                Poll::Pending
            }

            Ok(XmppStreamElement::StreamError(error)) => {
                log::debug!("Received stream:error, failing stream and discarding any stream management state.");
                Poll::Ready(ConnectedEvent::Disconnect {
                    sm_state: self.sm_state.take(),
                    error: Some(io::Error::new(io::ErrorKind::Other, error)),
                })
            }

            Ok(other) => {
                log::warn!("Received unexpected stream element: {other:?}. Ignoring.");
                Poll::Pending
            }

            Err(ReadError::SoftTimeout) => {
                Poll::Ready(ConnectedEvent::Worker(WorkerEvent::SoftTimeout))
            }

            Err(ReadError::ParseError(e)) => {
                Poll::Ready(ConnectedEvent::Worker(WorkerEvent::ParseError(e)))
            }

            Err(ReadError::HardError(error)) => Poll::Ready(ConnectedEvent::Disconnect {
                sm_state: self.sm_state.take(),
                error: Some(error),
            }),

            Err(ReadError::StreamFooterReceived) => Poll::Ready(ConnectedEvent::RemoteShutdown {
                sm_state: self.sm_state.take(),
            }),
        }
    }
}

/// State of a connection past the point where the underlying transport has
/// been established.
///
/// Drives [`NegotiationState`] until a usable session is up, then serves
/// reads and writes for as long as the connection survives.
pub(super) enum ConnectedState {
    /// Negotiating resource binding and (optionally) stream management.
    Negotiating { substate: NegotiationState },

    /// Steady state: the stream is bound and ready to carry stanzas.
    Ready(ReadyState),
}

impl ConnectedState {
    pub fn poll(
        &mut self,
        mut stream: Pin<&mut XmppStream>,
        identity: &Jid,
        features: &StreamFeatures,
        transmit_queue: &mut TransmitQueue<QueueEntry>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<ConnectedEvent>> {
        loop {
            match self {
                Self::Negotiating { substate } => {
                    match ready!(substate.advance(stream.as_mut(), identity, transmit_queue, cx)) {
                        Continue(None) => continue,
                        Continue(Some(stanza)) => {
                            return Poll::Ready(Some(ConnectedEvent::Worker(WorkerEvent::Stanza(
                                stanza,
                            ))))
                        }
                        Break(NegotiationResult::Disconnect { sm_state, error }) => {
                            return Poll::Ready(Some(ConnectedEvent::Disconnect {
                                sm_state,
                                error: Some(error),
                            }))
                        }
                        Break(NegotiationResult::StreamReset {
                            sm_state,
                            bound_jid,
                        }) => {
                            *self = Self::Ready(ReadyState::new(sm_state));
                            return Poll::Ready(Some(ConnectedEvent::Worker(WorkerEvent::Reset {
                                bound_jid,
                                features: features.clone(),
                            })));
                        }
                        Break(NegotiationResult::StreamResumed { sm_state }) => {
                            *self = Self::Ready(ReadyState::new(Some(sm_state)));
                            return Poll::Ready(Some(ConnectedEvent::Worker(
                                WorkerEvent::Resumed,
                            )));
                        }
                        Break(NegotiationResult::StreamError { error }) => {
                            let mut ready = ReadyState::new(None);
                            ready.pending_error = Some(error);
                            *self = Self::Ready(ready);
                            continue;
                        }
                    }
                }
                Self::Ready(ready) => return ready.poll(stream.as_mut(), cx).map(Some),
            }
        }
    }

    pub fn poll_writes(
        &mut self,
        mut stream: Pin<&mut XmppStream>,
        transmit_queue: &mut TransmitQueue<QueueEntry>,
        cx: &mut Context,
    ) -> Poll<Never> {
        match self {
            Self::Negotiating { .. } => {
                // Negotiation sends its own requests directly via `advance`;
                // here we only need to keep flushing in case a write was
                // previously blocked on a full socket buffer. Errors
                // surface again on the next call to `advance`.
                let _: Poll<Result<(), io::Error>> =
                    <XmppStream as Sink<&XmppStreamElement>>::poll_flush(stream.as_mut(), cx);
                Poll::Pending
            }
            Self::Ready(ready) => ready.poll_writes(stream.as_mut(), transmit_queue, cx),
        }
    }

    pub fn start_send_stream_error(&mut self, error: StreamError) {
        match self {
            Self::Negotiating { .. } => {
                let mut ready = ReadyState::new(None);
                ready.pending_error = Some(error);
                *self = Self::Ready(ready);
            }
            Self::Ready(ready) => ready.pending_error = Some(error),
        }
    }

    pub fn poll_close(
        &mut self,
        mut stream: Pin<&mut XmppStream>,
        cx: &mut Context,
    ) -> Poll<io::Result<()>> {
        <XmppStream as Sink<&XmppStreamElement>>::poll_close(stream.as_mut(), cx)
    }

    /// Enqueue a `<sm:r/>`, deduplicating with any already-pending request.
    ///
    /// Returns true if stream management is enabled on this connection.
    pub fn queue_sm_request(&mut self) -> bool {
        match self {
            Self::Negotiating { .. } => false,
            Self::Ready(ready) => match ready.sm_state.as_mut() {
                Some(sm_state) => {
                    sm_state.pending_req = true;
                    true
                }
                None => false,
            },
        }
    }
}
