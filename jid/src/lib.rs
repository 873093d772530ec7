// Copyright (c) 2017-2019 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
// Copyright (c) 2017-2019 Maxime “pep” Buquet <pep@bouah.net>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Jabber IDs, as specified in [RFC 6122](https://xmpp.org/rfcs/rfc6122.html).
//!
//! A JID is a triple `(node, domain, resource)`, where `domain` is the only
//! mandatory part. Comparisons between JIDs happen on their canonicalized
//! forms: the local part through NODEPREP, the domain through NAMEPREP, the
//! resource through RESOURCEPREP (all via the [`stringprep`] crate, which
//! implements the legacy stringprep profiles XMPP still requires).

#![warn(missing_docs)]

mod error;
mod parts;

#[cfg(feature = "minidom")]
mod minidom_impls;

pub use crate::error::Error;
pub use crate::parts::{DomainPart, NodePart, ResourcePart};

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

/// Escape a localpart per
/// [XEP-0106](https://xmpp.org/extensions/xep-0106.html) so it can be safely
/// embedded as the node of a JID.
pub fn escape_node(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            ' ' => out.push_str("\\20"),
            '"' => out.push_str("\\22"),
            '&' => out.push_str("\\26"),
            '\'' => out.push_str("\\27"),
            '/' => out.push_str("\\2f"),
            ':' => out.push_str("\\3a"),
            '<' => out.push_str("\\3c"),
            '>' => out.push_str("\\3e"),
            '@' => out.push_str("\\40"),
            '\\' => out.push_str("\\5c"),
            c => out.push(c),
        }
    }
    out
}

/// Reverse of [`escape_node`].
pub fn unescape_node(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 2 < bytes.len() {
            let unescaped = match &s[i + 1..i + 3] {
                "20" => Some(' '),
                "22" => Some('"'),
                "26" => Some('&'),
                "27" => Some('\''),
                "2f" => Some('/'),
                "3a" => Some(':'),
                "3c" => Some('<'),
                "3e" => Some('>'),
                "40" => Some('@'),
                "5c" => Some('\\'),
                _ => None,
            };
            if let Some(c) = unescaped {
                out.push(c);
                i += 3;
                continue;
            }
        }
        let c = s[i..].chars().next().unwrap();
        out.push(c);
        i += c.len_utf8();
    }
    out
}

/// A parsed, normalized Jabber ID: `[local@]domain[/resource]`.
///
/// `Jid` does not distinguish bare from full JIDs at the type level by
/// itself; [`BareJid`] and [`FullJid`] are newtypes enforcing the
/// presence/absence of a resource, for call sites that need that guarantee
/// in their signature.
#[derive(Debug, Clone, Eq)]
pub struct Jid {
    normalized: String,
    at: Option<u32>,
    slash: Option<u32>,
}

impl Jid {
    /// Build a `Jid` from its normalized parts.
    pub fn from_parts(
        node: Option<&NodePart>,
        domain: &DomainPart,
        resource: Option<&ResourcePart>,
    ) -> Jid {
        let mut normalized = String::new();
        let at = node.map(|n| {
            normalized.push_str(n.as_str());
            normalized.push('@');
            normalized.len() as u32 - 1
        });
        normalized.push_str(domain.as_str());
        let slash = resource.map(|r| {
            normalized.push('/');
            let pos = normalized.len() as u32;
            normalized.push_str(r.as_str());
            pos
        });
        Jid {
            normalized,
            at,
            slash,
        }
    }

    /// The localpart, if any, already NODEPREP-normalized.
    pub fn node_str(&self) -> Option<&str> {
        self.at.map(|at| &self.normalized[..at as usize])
    }

    /// The domain part, already NAMEPREP-normalized.
    pub fn domain_str(&self) -> &str {
        let start = self.at.map(|at| at as usize + 1).unwrap_or(0);
        let end = self.slash.map(|s| s as usize - 1).unwrap_or(self.normalized.len());
        &self.normalized[start..end]
    }

    /// The resource, if any, already RESOURCEPREP-normalized.
    pub fn resource_str(&self) -> Option<&str> {
        self.slash.map(|s| &self.normalized[s as usize..])
    }

    /// True if this JID has no resource.
    pub fn is_bare(&self) -> bool {
        self.slash.is_none()
    }

    /// True if this JID has a resource.
    pub fn is_full(&self) -> bool {
        self.slash.is_some()
    }

    /// The bare JID obtained by dropping any resource.
    pub fn to_bare(&self) -> BareJid {
        match self.slash {
            None => BareJid(self.clone()),
            Some(slash) => BareJid(Jid {
                normalized: self.normalized[..slash as usize - 1].to_owned(),
                at: self.at,
                slash: None,
            }),
        }
    }

    /// Attempt to view this JID as a [`FullJid`], if it has a resource.
    pub fn try_as_full(&self) -> Option<FullJid> {
        if self.is_full() {
            Some(FullJid(self.clone()))
        } else {
            None
        }
    }

    /// Return a new JID with the resource replaced (or added/removed).
    ///
    /// The node and domain are already normalized, so re-validating them
    /// through [`NodePart`]/[`DomainPart`] here is cheap and infallible.
    pub fn with_resource(&self, resource: Option<&ResourcePart>) -> Jid {
        let node = self.node_str().map(|n| {
            NodePart::new(n).expect("already-normalized node must re-validate")
        });
        let domain =
            DomainPart::new(self.domain_str()).expect("already-normalized domain must re-validate");
        Jid::from_parts(node.as_ref(), &domain, resource)
    }
}

impl fmt::Display for Jid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

impl PartialEq for Jid {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl core::hash::Hash for Jid {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.normalized.hash(state)
    }
}

impl PartialOrd for Jid {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Jid {
    fn cmp(&self, other: &Self) -> Ordering {
        self.normalized.cmp(&other.normalized)
    }
}

impl FromStr for Jid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::DomainEmpty);
        }
        if s.contains('\0') {
            return Err(Error::InvalidCharacter);
        }

        // Resource is everything after the first unescaped '/'.
        let (non_resource, resource) = match memchr::memchr(b'/', s.as_bytes()) {
            Some(idx) => (&s[..idx], Some(&s[idx + 1..])),
            None => (s, None),
        };
        let resource = match resource {
            Some("") => return Err(Error::ResourceEmpty),
            Some(r) => Some(ResourcePart::new(r)?),
            None => None,
        };

        let (node, domain) = match memchr::memchr(b'@', non_resource.as_bytes()) {
            Some(idx) => (Some(&non_resource[..idx]), &non_resource[idx + 1..]),
            None => (None, non_resource),
        };
        let node = match node {
            Some("") => return Err(Error::NodeEmpty),
            Some(n) => Some(NodePart::new(n)?),
            None => None,
        };
        if domain.is_empty() {
            return Err(Error::DomainEmpty);
        }
        let domain = DomainPart::new(domain)?;

        Ok(Jid::from_parts(node.as_ref(), &domain, resource.as_ref()))
    }
}

macro_rules! wrapper {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Jid);

        impl $name {
            /// Access the underlying, unconstrained [`Jid`].
            pub fn as_jid(&self) -> &Jid {
                &self.0
            }

            /// Consume this wrapper, returning the underlying [`Jid`].
            pub fn into_jid(self) -> Jid {
                self.0
            }

            /// The localpart, if any.
            pub fn node_str(&self) -> Option<&str> {
                self.0.node_str()
            }

            /// The domain part.
            pub fn domain_str(&self) -> &str {
                self.0.domain_str()
            }
        }

        impl core::ops::Deref for $name {
            type Target = Jid;
            fn deref(&self) -> &Jid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<$name> for Jid {
            fn from(v: $name) -> Jid {
                v.0
            }
        }
    };
}

wrapper!(BareJid, "A JID guaranteed not to carry a resource.");
wrapper!(FullJid, "A JID guaranteed to carry a resource.");

impl BareJid {
    /// Build a bare JID from parts.
    pub fn from_parts(node: Option<&NodePart>, domain: &DomainPart) -> BareJid {
        BareJid(Jid::from_parts(node, domain, None))
    }

    /// Add a resource, turning this into a [`FullJid`].
    pub fn with_resource(&self, resource: &ResourcePart) -> FullJid {
        FullJid(self.0.with_resource(Some(resource)))
    }
}

impl FullJid {
    /// Build a full JID from parts.
    pub fn from_parts(
        node: Option<&NodePart>,
        domain: &DomainPart,
        resource: &ResourcePart,
    ) -> FullJid {
        FullJid(Jid::from_parts(node, domain, Some(resource)))
    }

    /// The resource part.
    pub fn resource_str(&self) -> &str {
        self.0.resource_str().expect("FullJid always has a resource")
    }

    /// Drop the resource, yielding the bare JID.
    pub fn to_bare(&self) -> BareJid {
        self.0.to_bare()
    }
}

impl FromStr for BareJid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let jid: Jid = s.parse()?;
        if jid.is_full() {
            return Err(Error::ResourceNotEmpty);
        }
        Ok(BareJid(jid))
    }
}

impl FromStr for FullJid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let jid: Jid = s.parse()?;
        if jid.is_bare() {
            return Err(Error::ResourceEmpty);
        }
        Ok(FullJid(jid))
    }
}

impl TryFrom<Jid> for BareJid {
    type Error = Error;

    fn try_from(jid: Jid) -> Result<Self, Self::Error> {
        if jid.is_full() {
            return Err(Error::ResourceNotEmpty);
        }
        Ok(BareJid(jid))
    }
}

impl TryFrom<Jid> for FullJid {
    type Error = Error;

    fn try_from(jid: Jid) -> Result<Self, Self::Error> {
        if jid.is_bare() {
            return Err(Error::ResourceEmpty);
        }
        Ok(FullJid(jid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_jid() {
        let jid: Jid = "foo@bar.com/quux".parse().unwrap();
        assert_eq!(jid.node_str(), Some("foo"));
        assert_eq!(jid.domain_str(), "bar.com");
        assert_eq!(jid.resource_str(), Some("quux"));
        assert!(jid.is_full());
    }

    #[test]
    fn parses_bare_jid() {
        let jid: Jid = "bar.com".parse().unwrap();
        assert_eq!(jid.node_str(), None);
        assert_eq!(jid.domain_str(), "bar.com");
        assert!(jid.is_bare());
    }

    #[test]
    fn rejects_empty_domain() {
        assert!(matches!("".parse::<Jid>(), Err(Error::DomainEmpty)));
        assert!(matches!("foo@/bar".parse::<Jid>(), Err(Error::DomainEmpty)));
    }

    #[test]
    fn to_bare_strips_resource() {
        let full: FullJid = "foo@bar.com/quux".parse().unwrap();
        let bare = full.to_bare();
        assert_eq!(bare.to_string(), "foo@bar.com");
    }

    #[test]
    fn escape_roundtrip() {
        let escaped = escape_node("node with spaces&stuff");
        assert_eq!(unescape_node(&escaped), "node with spaces&stuff");
    }

    #[test]
    fn display_matches_input_after_normalization() {
        let jid: Jid = "FOO@Bar.COM/Baz".parse().unwrap();
        // NAMEPREP lower-cases the domain; NODEPREP lower-cases the local part.
        assert_eq!(jid.node_str(), Some("foo"));
        assert_eq!(jid.domain_str(), "bar.com");
        assert_eq!(jid.resource_str(), Some("Baz"));
    }
}
