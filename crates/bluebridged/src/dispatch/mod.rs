//! Command dispatch for bridge client connections.
//!
//! Each client connection runs a [`ClientSessionHandler`] loop: read one
//! framed command line, hand it to the [`CommandRouter`], write back exactly
//! one reply, repeat. The router is a pure mapping from parsed command to
//! reply given the radio gateway and session registry; all parse and
//! execution failures become error replies, so a misbehaving client can
//! never take down its own loop, let alone the listener or another client.
//!
//! Two protocol profiles share this skeleton. The `line` profile speaks the
//! full verb table with framed status-line replies; the `byte` profile
//! speaks a reduced lowercase verb set with single-byte boolean replies and
//! routes scan results and link-state changes to the notification sink.

mod command;
mod errors;
mod reply;
mod router;
mod session;

pub use self::command::{Command, CommandError};
pub use self::errors::DispatchError;
pub use self::reply::{Flow, Outcome, Reply};
pub use self::router::{BridgeContext, CommandRouter};
pub(crate) use self::session::ClientSessionHandler;

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
