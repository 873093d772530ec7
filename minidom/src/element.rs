// Copyright (c) 2020 lumi <lumi@pew.im>
// Copyright (c) 2020 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
// Copyright (c) 2020 Bastien Orivel <eijebong+minidom@bananium.fr>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Provides the [`Element`] type and the associated builder.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// In-scope namespace prefix declarations of an element: `None` is the
/// default namespace, `Some(prefix)` a named one.
pub type Prefixes = BTreeMap<Option<String>, String>;

/// A child of an [`Element`]: either text or a nested element.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A text node.
    Text(String),
    /// An element node.
    Element(Element),
}

/// A DOM-like element: a qualified name, an attribute map, in-scope prefix
/// declarations and an ordered list of child nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: String,
    namespace: String,
    attributes: BTreeMap<String, String>,
    /// Namespace prefixes declared on this element, in scope for itself and
    /// its descendants.
    pub prefixes: Prefixes,
    children: Vec<Node>,
}

/// Iterator over `(name, value)` attribute pairs of an [`Element`].
pub type Attrs<'a> = std::collections::btree_map::Iter<'a, String, String>;

/// Iterator over the child [`Node`]s of an [`Element`].
pub type Nodes<'a> = std::slice::Iter<'a, Node>;

impl Element {
    /// Start building a new element with the given local name and
    /// namespace.
    pub fn builder<N: Into<String>, NS: Into<String>>(name: N, namespace: NS) -> Builder {
        Builder::new(name, namespace)
    }

    /// Bare constructor, equivalent to `Element::builder(name, ns).build()`.
    pub fn bare<N: Into<String>, NS: Into<String>>(name: N, namespace: NS) -> Element {
        Builder::new(name, namespace).build()
    }

    /// The local name of this element.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespace of this element.
    pub fn ns(&self) -> String {
        self.namespace.clone()
    }

    /// True if this element's name and namespace match.
    pub fn is<N: AsRef<str>, NS: AsRef<str>>(&self, name: N, namespace: NS) -> bool {
        self.name == name.as_ref() && self.namespace == namespace.as_ref()
    }

    /// True if this element's namespace matches, regardless of name.
    pub fn has_ns<NS: AsRef<str>>(&self, namespace: NS) -> bool {
        self.namespace == namespace.as_ref()
    }

    /// Value of an unprefixed attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Iterate over this element's attributes.
    pub fn attrs(&self) -> Attrs<'_> {
        self.attributes.iter()
    }

    /// Iterate over this element's child nodes (text and elements).
    pub fn nodes(&self) -> Nodes<'_> {
        self.children.iter()
    }

    /// Iterate over this element's child elements only.
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// First child element with the given name and namespace, if any.
    pub fn get_child<N: AsRef<str>, NS: AsRef<str>>(
        &self,
        name: N,
        namespace: NS,
    ) -> Option<&Element> {
        self.children()
            .find(|el| el.is(name.as_ref(), namespace.as_ref()))
    }

    /// Concatenation of this element's direct text children.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            if let Node::Text(text) = node {
                out.push_str(text);
            }
        }
        out
    }

    /// Append a child element, returning a reference to it.
    pub fn append_child(&mut self, element: Element) -> &mut Element {
        self.children.push(Node::Element(element));
        match self.children.last_mut() {
            Some(Node::Element(el)) => el,
            _ => unreachable!(),
        }
    }

    /// Append a text node.
    pub fn append_text_node<S: Into<String>>(&mut self, text: S) {
        self.children.push(Node::Text(text.into()));
    }

    /// Remove and return all child nodes, leaving this element childless.
    pub fn take_nodes(&mut self) -> Vec<Node> {
        std::mem::take(&mut self.children)
    }
}

/// Incremental constructor for an [`Element`].
pub struct Builder {
    element: Element,
}

impl Builder {
    fn new<N: Into<String>, NS: Into<String>>(name: N, namespace: NS) -> Self {
        Builder {
            element: Element {
                name: name.into(),
                namespace: namespace.into(),
                attributes: BTreeMap::new(),
                prefixes: Prefixes::new(),
                children: Vec::new(),
            },
        }
    }

    /// Set an attribute. A `None` value removes any previous setting.
    pub fn attr<N: Into<String>, V: IntoAttributeValue>(mut self, name: N, value: V) -> Self {
        match value.into_attribute_value() {
            Some(value) => {
                self.element.attributes.insert(name.into(), value);
            }
            None => {
                self.element.attributes.remove(&name.into());
            }
        }
        self
    }

    /// Declare a namespace prefix (`None` for the default namespace) in
    /// scope for this element.
    pub fn prefix(mut self, prefix: Option<String>, namespace: String) -> Result<Self> {
        if self.element.prefixes.contains_key(&prefix) {
            return Err(Error::DuplicatePrefix);
        }
        self.element.prefixes.insert(prefix, namespace);
        Ok(self)
    }

    /// Append a child element.
    pub fn append<E: Into<Node>>(mut self, node: E) -> Self {
        self.element.children.push(node.into());
        self
    }

    /// Finish building and return the [`Element`].
    pub fn build(self) -> Element {
        self.element
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Node {
        Node::Element(el)
    }
}

/// Conversion of Rust values into a wire attribute value, with `None`
/// meaning the attribute should be omitted.
pub trait IntoAttributeValue {
    /// Convert into the attribute's textual representation.
    fn into_attribute_value(self) -> Option<String>;
}

impl IntoAttributeValue for String {
    fn into_attribute_value(self) -> Option<String> {
        Some(self)
    }
}

impl<'a> IntoAttributeValue for &'a str {
    fn into_attribute_value(self) -> Option<String> {
        Some(self.to_owned())
    }
}

impl<T: IntoAttributeValue> IntoAttributeValue for Option<T> {
    fn into_attribute_value(self) -> Option<String> {
        self.and_then(IntoAttributeValue::into_attribute_value)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        if !self.namespace.is_empty() {
            write!(f, " xmlns='{}'", escape_attr(&self.namespace))?;
        }
        for (prefix, ns) in &self.prefixes {
            match prefix {
                Some(prefix) => write!(f, " xmlns:{}='{}'", prefix, escape_attr(ns))?,
                None => {}
            }
        }
        for (name, value) in &self.attributes {
            write!(f, " {}='{}'", name, escape_attr(value))?;
        }
        if self.children.is_empty() {
            return write!(f, "/>");
        }
        write!(f, ">")?;
        for node in &self.children {
            match node {
                Node::Text(text) => write!(f, "{}", escape_text(text))?,
                Node::Element(el) => write!(f, "{}", el)?,
            }
        }
        write!(f, "</{}>", self.name)
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('\'', "&apos;")
}

impl FromStr for Element {
    type Err = Error;

    fn from_str(s: &str) -> Result<Element> {
        crate::parse(s.as_bytes())
    }
}
