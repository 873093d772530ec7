// Copyright (c) 2020 lumi <lumi@pew.im>
// Copyright (c) 2020 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
// Copyright (c) 2020 Bastien Orivel <eijebong+minidom@bananium.fr>
// Copyright (c) 2020 Astro <astro@spaceboyz.net>
// Copyright (c) 2020 Maxime “pep” Buquet <pep@bouah.net>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A small, simple DOM implementation on top of rxml, targeting the subset
//! of XML useful for XMPP: one element per "stanza", arbitrary children,
//! namespace-qualified names, no comments, no processing instructions.

#![warn(missing_docs)]

pub mod element;
pub mod error;
mod parser;

pub use crate::element::{Attrs, Builder, Element, IntoAttributeValue, Node, Nodes, Prefixes};
pub use crate::error::{Error, Result};
pub use crate::parser::parse;
