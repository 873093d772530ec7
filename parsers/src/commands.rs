// Copyright (c) 2017 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! XEP-0050: Ad-Hoc Commands

use xso::{AsXml, FromXml};

use minidom::Element;
use xso::error::{Error, FromElementError};

use crate::data_forms::DataForm;
use crate::iq::{IqGetPayload, IqResultPayload, IqSetPayload};
use crate::ns;

generate_attribute!(
    /// The action requested by the command initiator, or performed by the
    /// responder when sent back in a response.
    Action, "action", {
        /// Execute the command. This is the only valid action for the
        /// initial request, and it is the implicit default afterwards.
        Execute => "execute",

        /// Cancel the command, closing its session without completion.
        Cancel => "cancel",

        /// Complete the command, ending its session successfully.
        Complete => "complete",

        /// Move to the next stage of a multi-stage command.
        Next => "next",

        /// Move to the previous stage of a multi-stage command.
        Prev => "prev",
    }, Default = Execute
);

generate_attribute!(
    /// The current status of a command's execution, sent in responses.
    Status, "status", {
        /// The command is awaiting further action from the requester.
        Executing => "executing",

        /// The command has completed, the session is closed.
        Completed => "completed",

        /// The command was canceled, the session is closed.
        Canceled => "canceled",
    }, Default = Executing
);

generate_attribute!(
    /// Severity of a [`Note`] attached to a command response.
    NoteType, "type", {
        /// Informational note, not indicating a problem.
        Info => "info",

        /// The command is still processing, but something unusual occurred.
        Warn => "warn",

        /// The command failed.
        Error => "error",
    }, Default = Info
);

/// Human-readable note attached to a command response, in addition to (or
/// instead of) a data form.
#[derive(FromXml, AsXml, PartialEq, Debug, Clone)]
#[xml(namespace = ns::COMMANDS, name = "note")]
pub struct Note {
    /// Severity of this note.
    #[xml(attribute(default))]
    pub type_: NoteType,

    /// The note's text.
    #[xml(text)]
    pub text: String,
}

/// Advertises which actions are available at the current stage of a
/// multi-stage command, and which of them is the default.
#[derive(FromXml, AsXml, PartialEq, Debug, Clone, Default)]
#[xml(namespace = ns::COMMANDS, name = "actions")]
pub struct Actions {
    /// The action performed when the requester does not specify one, i.e.
    /// sends a bare `<command/>` with no `@action`.
    #[xml(attribute(default))]
    pub execute: Option<Action>,

    /// Whether moving to the previous stage is allowed.
    #[xml(flag)]
    pub prev: bool,

    /// Whether moving to the next stage is allowed.
    #[xml(flag)]
    pub next: bool,

    /// Whether completing the command from here is allowed.
    #[xml(flag)]
    pub complete: bool,
}

/// The `<command xmlns='http://jabber.org/protocol/commands'/>` IQ payload,
/// used for both the request that drives a command session and the
/// responses it receives at every stage.
///
/// This carries an optional [`DataForm`], which is why it is parsed by hand
/// rather than derived, the same way [`crate::disco::DiscoInfoResult`] is.
///
/// See <https://xmpp.org/extensions/xep-0050.html>
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Identifies which command is being invoked.
    pub node: String,

    /// Identifies the session a multi-stage command belongs to. Absent on
    /// the very first request, and on single-stage commands.
    pub sessionid: Option<String>,

    /// The action being requested, or having just been performed.
    pub action: Option<Action>,

    /// Current status of the command's execution. Only meaningful in
    /// responses.
    pub status: Option<Status>,

    /// Which further actions are available from here, if more than one.
    pub actions: Option<Actions>,

    /// A data form to be filled in by the requester, or presenting the
    /// command's result.
    pub form: Option<DataForm>,

    /// Notes attached to this response.
    pub notes: Vec<Note>,
}

impl Command {
    /// Starts a new command session by requesting the given node be
    /// executed.
    pub fn new(node: impl Into<String>) -> Command {
        Command {
            node: node.into(),
            sessionid: None,
            action: None,
            status: None,
            actions: None,
            form: None,
            notes: Vec::new(),
        }
    }

    /// Moves an existing session to its next action, such as `next` or
    /// `complete`.
    pub fn with_action(mut self, sessionid: impl Into<String>, action: Action) -> Command {
        self.sessionid = Some(sessionid.into());
        self.action = Some(action);
        self
    }

    /// Attaches the data form filled in by the requester to this request.
    pub fn with_form(mut self, form: DataForm) -> Command {
        self.form = Some(form);
        self
    }
}

impl IqGetPayload for Command {}
impl IqSetPayload for Command {}
impl IqResultPayload for Command {}

impl TryFrom<Element> for Command {
    type Error = FromElementError;

    fn try_from(elem: Element) -> Result<Command, FromElementError> {
        check_self!(elem, "command", COMMANDS);
        check_no_unknown_attributes!(
            elem,
            "command",
            ["node", "sessionid", "action", "status", "xml:lang"]
        );

        let mut actions = None;
        let mut form = None;
        let mut notes = Vec::new();
        for child in elem.children() {
            if child.is("actions", ns::COMMANDS) {
                if actions.is_some() {
                    return Err(Error::Other("Command must not have more than one actions element.").into());
                }
                actions = Some(Actions::try_from(child.clone())?);
            } else if child.is("x", ns::DATA_FORMS) {
                if form.is_some() {
                    return Err(Error::Other("Command must not have more than one data form.").into());
                }
                form = Some(DataForm::try_from(child.clone())?);
            } else if child.is("note", ns::COMMANDS) {
                notes.push(Note::try_from(child.clone())?);
            } else {
                return Err(Error::Other("Unknown element in command.").into());
            }
        }

        Ok(Command {
            node: get_attr!(elem, "node", Required),
            sessionid: get_attr!(elem, "sessionid", Option),
            action: get_attr!(elem, "action", Option),
            status: get_attr!(elem, "status", Option),
            actions,
            form,
            notes,
        })
    }
}

impl From<Command> for Element {
    fn from(command: Command) -> Element {
        Element::builder("command", ns::COMMANDS)
            .attr("node", command.node)
            .attr("sessionid", command.sessionid)
            .attr("action", command.action)
            .attr("status", command.status)
            .append_all(command.actions.map(Element::from))
            .append_all(command.form.map(Element::from))
            .append_all(command.notes.into_iter().map(Element::from))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_request() {
        let elem: Element =
            "<command xmlns='http://jabber.org/protocol/commands' node='list' action='execute'/>"
                .parse()
                .unwrap();
        let command = Command::try_from(elem).unwrap();
        assert_eq!(command.node, "list");
        assert_eq!(command.action, Some(Action::Execute));
        assert!(command.sessionid.is_none());
    }

    #[test]
    fn test_executing_response_with_actions() {
        let elem: Element = "<command xmlns='http://jabber.org/protocol/commands'
                node='list' sessionid='list:1234' status='executing'>
            <actions execute='next'><next/></actions>
        </command>"
            .parse()
            .unwrap();
        let command = Command::try_from(elem).unwrap();
        assert_eq!(command.status, Some(Status::Executing));
        assert_eq!(command.sessionid.as_deref(), Some("list:1234"));
        let actions = command.actions.unwrap();
        assert_eq!(actions.execute, Some(Action::Next));
        assert!(actions.next);
        assert!(!actions.prev);
        assert!(!actions.complete);
    }

    #[test]
    fn test_completed_with_note() {
        let elem: Element = "<command xmlns='http://jabber.org/protocol/commands'
                node='list' sessionid='list:1234' status='completed'>
            <note type='info'>All done.</note>
        </command>"
            .parse()
            .unwrap();
        let command = Command::try_from(elem).unwrap();
        assert_eq!(command.status, Some(Status::Completed));
        assert_eq!(command.notes.len(), 1);
        assert_eq!(command.notes[0].type_, NoteType::Info);
        assert_eq!(command.notes[0].text, "All done.");
    }

    #[test]
    fn test_builder_roundtrip() {
        let command = Command::new("list").with_action("list:1234", Action::Next);
        let elem = Element::from(command.clone());
        let command2 = Command::try_from(elem).unwrap();
        assert_eq!(command2, command);
    }
}
