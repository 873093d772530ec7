// Copyright (c) 2023 xmpp-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fmt;

/// Errors produced by the `xmpp` crate itself, on top of whatever
/// `tokio_xmpp` reports.
#[derive(Debug)]
pub enum Error {
    /// An error from the underlying connection/stream layer.
    Client(tokio_xmpp::Error),
    /// `ServiceRegistry::summon` detected a dependency cycle between
    /// `Service::orders_after`/`orders_before` declarations.
    ServiceDependencyCycle,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Client(e) => write!(f, "{}", e),
            Error::ServiceDependencyCycle => {
                write!(f, "service dependency cycle detected while summoning a service")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Client(e) => Some(e),
            Error::ServiceDependencyCycle => None,
        }
    }
}

impl From<tokio_xmpp::Error> for Error {
    fn from(e: tokio_xmpp::Error) -> Self {
        Error::Client(e)
    }
}
