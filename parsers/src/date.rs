// Copyright (c) 2017 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! XEP-0082: XMPP Date and Time Profiles

use alloc::borrow::Cow;
use chrono::{DateTime as ChronoDateTime, FixedOffset};
use core::str::FromStr;
use xso::error::Error;
use xso::{AsXmlText, FromXmlText};

/// A wrapper around a UTC or zone-offset timestamp, as used in attributes
/// and text content throughout XMPP (delayed delivery, entity time, MAM
/// archive markers...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DateTime(pub ChronoDateTime<FixedOffset>);

impl FromStr for DateTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChronoDateTime::parse_from_rfc3339(s)
            .map(DateTime)
            .map_err(Error::text_parse_error)
    }
}

impl FromXmlText for DateTime {
    fn from_xml_text(data: String) -> Result<Self, Error> {
        DateTime::from_str(&data)
    }
}

impl AsXmlText for DateTime {
    fn as_xml_text(&self) -> Result<Cow<'_, str>, Error> {
        Ok(Cow::Owned(self.0.to_rfc3339()))
    }
}

impl From<ChronoDateTime<FixedOffset>> for DateTime {
    fn from(dt: ChronoDateTime<FixedOffset>) -> DateTime {
        DateTime(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple() {
        let date: DateTime = "2002-09-10T23:08:25Z".parse().unwrap();
        assert_eq!(date.0.to_rfc3339(), "2002-09-10T23:08:25+00:00");
    }

    #[test]
    fn test_invalid() {
        assert!("not a date".parse::<DateTime>().is_err());
    }
}
