// Copyright (c) 2020 lumi <lumi@pew.im>
// Copyright (c) 2020 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A small non-streaming driver building a whole [`Element`] tree out of a
//! byte buffer. The stanza stream (in `tokio-xmpp`) uses the streaming
//! rxml/xso path instead; this module exists for convenience callers (tests,
//! ad-hoc tooling, `FromStr`) that just want a tree.

use std::io;

use rxml::writer::{SimpleNamespaces, TrackNamespace};

use crate::element::{Builder, Prefixes};
use crate::error::{Error, Result};
use crate::Element;

fn map_io(e: io::Error) -> Error {
    match e.downcast::<rxml::Error>() {
        Ok(e) => Error::XmlError(e),
        Err(e) => Error::Io(e),
    }
}

fn start_element(qname: rxml::QName, attrs: rxml::AttrMap) -> Result<(Builder, Prefixes)> {
    let mut prefixes = SimpleNamespaces::new();
    let mut builder = Element::builder(qname.1, qname.0);
    let mut declared = Prefixes::new();
    for ((namespace, name), value) in attrs.into_iter() {
        if namespace.is_none() {
            builder = builder.attr(name, value);
        } else {
            let (is_new, prefix) = prefixes.declare_with_auto_prefix(namespace.clone());
            let qualified = prefix.with_suffix(&name);
            if is_new {
                declared.insert(
                    Some(prefix.as_str().to_owned()),
                    namespace.as_str().to_owned(),
                );
            }
            builder = builder.attr(qualified, value);
        }
    }
    Ok((builder, declared))
}

/// Parse a whole document from a byte source and return its single root
/// element.
pub fn parse<R: io::Read>(mut r: R) -> Result<Element> {
    let mut buf = Vec::new();
    r.read_to_end(&mut buf).map_err(Error::Io)?;
    let mut reader = rxml::Reader::new(&buf[..]);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    for ev in &mut reader {
        match ev.map_err(map_io)? {
            rxml::Event::XmlDeclaration(..) => {}
            rxml::Event::StartElement(_, qname, attrs) => {
                let (builder, declared) = start_element(qname, attrs)?;
                let mut el = builder.build();
                el.prefixes = declared;
                stack.push(el);
            }
            rxml::Event::Text(_, text) => {
                if let Some(top) = stack.last_mut() {
                    top.append_text_node(text.as_str());
                }
            }
            rxml::Event::EndElement(_) => match stack.pop() {
                Some(el) => match stack.last_mut() {
                    Some(parent) => {
                        parent.append_child(el);
                    }
                    None => {
                        root = Some(el);
                        break;
                    }
                },
                None => return Err(Error::EndOfDocument),
            },
        }
    }
    root.ok_or(Error::EndOfDocument)
}
