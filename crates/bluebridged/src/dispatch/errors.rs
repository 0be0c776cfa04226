//! Error types for command dispatch failures.
//!
//! Every variant is recoverable from the session loop's point of view: the
//! router renders it into an error reply and the loop keeps reading. Display
//! text is client-facing.

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::registry::RegistryError;

use super::command::CommandError;

/// Errors surfaced while dispatching one command.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Command line failed to parse.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// No classic session is open for the address.
    #[error("Not connected")]
    NotConnected,

    /// No attribute session for the address, or the characteristic was not
    /// found in any discovered service.
    #[error("GATT not connected")]
    GattNotConnected,

    /// The radio stack rejected the operation.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Session registry was poisoned by a panicking thread.
    #[error("internal error: {0}")]
    Registry(#[from] RegistryError),
}
