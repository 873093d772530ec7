//! Client-side SASL mechanism drivers used to authenticate an XMPP stream.
//!
//! This crate only implements the client role: the engine this workspace
//! builds never acts as a server.

#![warn(missing_docs)]

pub mod client;
pub mod common;
