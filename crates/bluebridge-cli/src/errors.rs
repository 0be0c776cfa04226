//! Error types for the CLI front-end.

use std::io;

use thiserror::Error;

/// Failures surfaced to the user by the CLI.
#[derive(Debug, Error)]
pub enum AppError {
    /// Endpoint host name failed to resolve.
    #[error("failed to resolve {endpoint}: {source}")]
    Resolve {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// Connection to the daemon socket failed.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// The daemon closed the connection before sending a reply.
    #[error("daemon closed the connection before replying")]
    NoReply,

    /// Frame-level protocol failure on the daemon connection.
    #[error(transparent)]
    Wire(#[from] bluebridge_wire::WireError),

    /// Writing the reply to the output stream failed.
    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),

    /// Unix sockets are not available on this platform.
    #[cfg(not(unix))]
    #[error("unix sockets are unsupported on this platform: {0}")]
    UnsupportedUnixTransport(String),
}
