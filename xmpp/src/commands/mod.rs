// Copyright (c) 2023 xmpp-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! XEP-0050 Ad-Hoc Commands, requester side.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::RwLock;

use crate::{
    disco::DiscoService,
    jid::Jid,
    parsers::{
        commands::{Action, Command, Status},
        data_forms::DataForm,
        iq::Iq,
        ns,
    },
    registry::{Service, ServiceId, ServiceRegistry},
    Agent, Error,
};

#[derive(Clone)]
struct Session {
    target: Jid,
    node: String,
}

/// Tracks ad-hoc command sessions this client has initiated against remote
/// entities, and offers a `DiscoService`-backed check for whether a target
/// is known to support XEP-0050 at all.
pub struct CommandsService {
    disco: Arc<DiscoService>,
    sessions: RwLock<HashMap<String, Session>>,
    next_id: AtomicU64,
}

impl Service for CommandsService {
    fn orders_after() -> &'static [ServiceId] {
        static DEPS: OnceLock<[ServiceId; 1]> = OnceLock::new();
        DEPS.get_or_init(|| [TypeId::of::<DiscoService>()])
    }

    fn new(registry: &mut ServiceRegistry) -> Result<Self, Error> {
        let disco = registry.summon::<DiscoService>()?;
        Ok(CommandsService {
            disco,
            sessions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        })
    }
}

impl CommandsService {
    /// Whether `target`'s last known disco#info result advertises XEP-0050
    /// support. `None` if we haven't discovered `target` yet.
    pub async fn is_supported(&self, target: &Jid) -> Option<bool> {
        self.disco.supports(target, ns::COMMANDS).await
    }

    /// Requests execution of `node` on `target`, opening a new session.
    /// Returns the IQ id the session is tracked under; the response arrives
    /// as a regular IQ result and is fed back via `handle_result`.
    pub async fn execute(&self, agent: &mut Agent, target: Jid, node: impl Into<String>) -> String {
        let node = node.into();
        let id = format!("ad-hoc-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        self.sessions.write().await.insert(
            id.clone(),
            Session {
                target: target.clone(),
                node: node.clone(),
            },
        );
        let iq = Iq::from_set(id.clone(), Command::new(node))
            .with_to(target)
            .into();
        let _ = agent.client.send_stanza(iq).await;
        id
    }

    /// Advances an open multi-stage session with `action`, optionally
    /// submitting a filled-in data form.
    pub async fn advance(
        &self,
        agent: &mut Agent,
        id: &str,
        action: Action,
        form: Option<DataForm>,
    ) {
        let Some(session) = self.sessions.read().await.get(id).cloned() else {
            return;
        };
        let mut command = Command::new(session.node).with_action(id, action);
        if let Some(form) = form {
            command = command.with_form(form);
        }
        let iq = Iq::from_set(id.to_string(), command)
            .with_to(session.target)
            .into();
        let _ = agent.client.send_stanza(iq).await;
    }

    /// Feeds a `<command/>` IQ result back into the tracked session,
    /// dropping it from the outstanding set once it has completed or been
    /// canceled.
    pub(crate) async fn handle_result(&self, id: &str, command: &Command) {
        let done = matches!(command.status, Some(Status::Completed) | Some(Status::Canceled));
        if done {
            self.sessions.write().await.remove(id);
        }
    }
}

/// Handles a `<command xmlns='http://jabber.org/protocol/commands'/>` IQ
/// result, as received in response to a session opened via
/// [`CommandsService::execute`] or [`CommandsService::advance`].
pub async fn handle_iq_result(agent: &mut Agent, id: &str, command: Command) {
    if let Ok(service) = agent.registry.summon::<CommandsService>() {
        service.handle_result(id, &command).await;
    }
}
