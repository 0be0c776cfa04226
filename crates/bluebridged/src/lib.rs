//! Local IPC bridge exposing the host device's radio to other processes.
//!
//! Clients connect to a well-known domain socket and speak a line-oriented
//! command protocol: one framed command in, one reply out, repeated until
//! the client sends `EXIT` or disconnects. The bridge translates each verb
//! into an operation against the radio stack (behind the [`gateway`] trait
//! boundary) and against the shared session registry of open classic and
//! attribute-protocol device connections.
//!
//! The crate is organised around the connection path: the transport module
//! accepts connections and spawns one session-loop thread per client, the
//! dispatch module parses and routes commands, and the registry holds the
//! only state shared across connections. Asynchronous radio callbacks enter
//! through an event pump on their own thread and touch shared state only
//! via the registry's API. Everything that happens off the client-reply
//! path (listener faults, scan results, user notifications) lands on the
//! notification sink.
//!
//! Hosts embed the bridge by calling [`run_server_with`] with their own
//! radio gateway and shutdown signal; the standalone daemon binary wires up
//! the placeholder gateway and process signals via [`run_server`].

mod bootstrap;
mod dispatch;
mod events;
pub mod gateway;
mod notify;
mod process;
mod registry;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, Bridge, ConfigLoader, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use dispatch::{
    BridgeContext, Command, CommandError, CommandRouter, DispatchError, Flow, Outcome, Reply,
};
pub use events::EventPump;
pub use notify::{NotificationSink, StructuredNotifier};
pub use process::{
    ServeError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_server, run_server_with,
};
pub use registry::{
    AttributeSession, ClassicSession, LinkState, RegistryError, Session, SessionKind,
    SessionRegistry,
};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{ListenerError, ListenerHandle};

#[cfg(test)]
mod tests;
