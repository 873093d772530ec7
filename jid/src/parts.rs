// Copyright (c) 2017-2019 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use core::fmt;
use core::str::FromStr;

use crate::Error;

const MAX_PART_LEN: usize = 1023;

/// A validated, NODEPREP-normalized JID localpart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePart(String);

/// A validated, NAMEPREP-normalized JID domain part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomainPart(String);

/// A validated, RESOURCEPREP-normalized JID resource part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourcePart(String);

macro_rules! part {
    ($name:ident, $prep:path) => {
        impl $name {
            /// Validate and normalize `s`, returning the owned part.
            pub fn new(s: &str) -> Result<Self, Error> {
                if s.contains('\0') {
                    return Err(Error::InvalidCharacter);
                }
                let normalized = $prep(s).map_err(|_| Error::StringPrep)?;
                if normalized.len() > MAX_PART_LEN {
                    return Err(Error::TooLong);
                }
                Ok($name(normalized.into_owned()))
            }

            /// Borrow the normalized value.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Error> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

part!(NodePart, stringprep::nodeprep);
part!(DomainPart, stringprep::nameprep);
part!(ResourcePart, stringprep::resourceprep);
