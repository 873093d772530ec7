// Copyright (c) 2017 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::ns;
use crate::stanza_error::StanzaError;
use jid::Jid;
use minidom::Element;
use xso::error::{Error, FromElementError};

/// Should be implemented on every known payload of an `<iq type='get'/>`.
pub trait IqGetPayload: TryFrom<Element> + Into<Element> {}

/// Should be implemented on every known payload of an `<iq type='set'/>`.
pub trait IqSetPayload: TryFrom<Element> + Into<Element> {}

/// Should be implemented on every known payload of an `<iq type='result'/>`.
pub trait IqResultPayload: TryFrom<Element> + Into<Element> {}

/// The payload of an IQ stanza, dependent on its `@type` attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum IqType {
    /// A request for information.
    ///
    /// Must receive either a `result` or an `error` response.
    Get(Element),

    /// A request to change or create something.
    ///
    /// Must receive either a `result` or an `error` response.
    Set(Element),

    /// A response to a successful `get` or `set` request.
    ///
    /// May carry no payload at all, if the request didn't call for a
    /// response payload.
    Result(Option<Element>),

    /// A response indicating that the `get` or `set` request failed.
    Error(StanzaError),
}

/// The main structure representing the `<iq/>` stanza.
#[derive(Debug, Clone, PartialEq)]
pub struct Iq {
    /// The JID emitting this stanza.
    pub from: Option<Jid>,

    /// The recipient of this stanza.
    pub to: Option<Jid>,

    /// The @id attribute of this stanza, required so a response can be
    /// matched with its request.
    pub id: String,

    /// The payload of this IQ, along with its `@type`.
    pub payload: IqType,
}

impl Iq {
    /// Creates a new `<iq type='get'/>` with the given id and payload.
    pub fn from_get<S: Into<String>, P: IqGetPayload>(id: S, payload: P) -> Iq {
        Iq {
            from: None,
            to: None,
            id: id.into(),
            payload: IqType::Get(payload.into()),
        }
    }

    /// Creates a new `<iq type='set'/>` with the given id and payload.
    pub fn from_set<S: Into<String>, P: IqSetPayload>(id: S, payload: P) -> Iq {
        Iq {
            from: None,
            to: None,
            id: id.into(),
            payload: IqType::Set(payload.into()),
        }
    }

    /// Creates a new `<iq type='result'/>` with the given id and no payload.
    pub fn empty_result<S: Into<String>>(id: S) -> Iq {
        Iq {
            from: None,
            to: None,
            id: id.into(),
            payload: IqType::Result(None),
        }
    }

    /// Creates a new `<iq type='result'/>` with the given id and payload.
    pub fn from_result<S: Into<String>, P: IqResultPayload>(id: S, payload: Option<P>) -> Iq {
        Iq {
            from: None,
            to: None,
            id: id.into(),
            payload: IqType::Result(payload.map(Into::into)),
        }
    }

    /// Creates a new `<iq type='error'/>` with the given id and error.
    pub fn from_error<S: Into<String>>(id: S, error: StanzaError) -> Iq {
        Iq {
            from: None,
            to: None,
            id: id.into(),
            payload: IqType::Error(error),
        }
    }

    /// Sets the recipient of this IQ.
    pub fn with_to(mut self, to: Jid) -> Iq {
        self.to = Some(to);
        self
    }

    /// Sets the sender of this IQ.
    pub fn with_from(mut self, from: Jid) -> Iq {
        self.from = Some(from);
        self
    }
}

impl TryFrom<Element> for Iq {
    type Error = FromElementError;

    fn try_from(root: Element) -> Result<Iq, FromElementError> {
        check_self!(root, "iq", DEFAULT_NS);
        check_no_unknown_attributes!(root, "iq", ["from", "to", "id", "type", "xml:lang"]);
        let from = get_attr!(root, "from", Option);
        let to = get_attr!(root, "to", Option);
        let id: Option<String> = get_attr!(root, "id", Option);
        let type_: String = get_attr!(root, "type", Required);

        let mut payload = None;
        let mut error_payload = None;
        for elem in root.children() {
            if elem.is("error", ns::DEFAULT_NS) {
                if error_payload.is_some() {
                    return Err(Error::Other("IQ must not have more than one error.").into());
                }
                error_payload = Some(StanzaError::try_from(elem.clone())?);
            } else {
                if payload.is_some() {
                    return Err(Error::Other("IQ must not have more than one payload.").into());
                }
                payload = Some(elem.clone());
            }
        }

        let payload = match type_.as_str() {
            "get" => IqType::Get(payload.ok_or(Error::Other("Get IQ must have a payload."))?),
            "set" => IqType::Set(payload.ok_or(Error::Other("Set IQ must have a payload."))?),
            "result" => IqType::Result(payload),
            "error" => IqType::Error(
                error_payload.ok_or(Error::Other("Error IQ must have an error payload."))?,
            ),
            _ => return Err(Error::Other("Unknown IQ type.").into()),
        };

        Ok(Iq {
            from,
            to,
            id: id.ok_or(Error::Other("IQ must have an id."))?,
            payload,
        })
    }
}

impl From<Iq> for Element {
    fn from(iq: Iq) -> Element {
        let type_ = match iq.payload {
            IqType::Get(_) => "get",
            IqType::Set(_) => "set",
            IqType::Result(_) => "result",
            IqType::Error(_) => "error",
        };
        Element::builder("iq", ns::DEFAULT_NS)
            .attr("from", iq.from)
            .attr("to", iq.to)
            .attr("id", iq.id)
            .attr("type", type_)
            .append_all(match iq.payload {
                IqType::Get(elem) => Some(elem),
                IqType::Set(elem) => Some(elem),
                IqType::Result(elem) => elem,
                IqType::Error(_) => None,
            })
            .append_all(match iq.payload {
                IqType::Error(error) => Some(Element::from(error)),
                _ => None,
            })
            .build()
    }
}

impl ::xso::FromXml for Iq {
    type Builder = ::xso::minidom_compat::FromEventsViaElement<Iq>;

    fn from_events(
        qname: ::xso::exports::rxml::QName,
        attrs: ::xso::exports::rxml::AttrMap,
    ) -> Result<Self::Builder, ::xso::error::FromEventsError> {
        if qname.0 != crate::ns::DEFAULT_NS || qname.1 != "iq" {
            return Err(::xso::error::FromEventsError::Mismatch { name: qname, attrs });
        }
        Self::Builder::new(qname, attrs)
    }
}

impl ::xso::AsXml for Iq {
    type ItemIter<'x> = ::xso::minidom_compat::AsItemsViaElement<'x>;

    fn as_xml_iter(&self) -> Result<Self::ItemIter<'_>, ::xso::error::Error> {
        ::xso::minidom_compat::AsItemsViaElement::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get() {
        let elem: Element = "<iq from='a@b.c' id='hello' type='get'><ping xmlns='urn:xmpp:ping'/></iq>"
            .parse()
            .unwrap();
        let iq = Iq::try_from(elem).unwrap();
        assert_eq!(iq.id, "hello");
        match iq.payload {
            IqType::Get(ref payload) => assert!(payload.is("ping", "urn:xmpp:ping")),
            _ => panic!("wrong IQ type"),
        }
    }

    #[test]
    fn test_empty_result() {
        let iq = Iq::empty_result("hello");
        let elem = Element::from(iq);
        assert!(elem.is("iq", ns::DEFAULT_NS));
        assert_eq!(elem.attr("type"), Some("result"));
        assert_eq!(elem.children().count(), 0);
    }

    #[test]
    fn test_missing_id() {
        let elem: Element = "<iq type='get'><ping xmlns='urn:xmpp:ping'/></iq>"
            .parse()
            .unwrap();
        assert!(Iq::try_from(elem).is_err());
    }
}
