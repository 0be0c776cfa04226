//! Socket listener for the bridge endpoint.
//!
//! The transport module binds the well-known endpoint and accepts client
//! connections in a background thread, spawning one session-loop thread per
//! connection. Faults inside one connection never reach the accept loop or
//! any other connection.

mod errors;
mod handler;
mod listener;
#[cfg(test)]
mod test_utils;

pub use self::errors::ListenerError;
pub(crate) use self::handler::{ConnectionHandler, ConnectionStream};
pub(crate) use self::listener::SocketListener;
pub use self::listener::ListenerHandle;
#[cfg(test)]
pub(crate) use self::test_utils::CountingHandler;

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
