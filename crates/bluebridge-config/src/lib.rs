//! Shared configuration for the bluebridge daemon and CLI.
//!
//! Configuration is resolved by `ortho_config` in layers: built-in defaults,
//! then an optional TOML file, then environment variables prefixed with
//! `BLUEBRIDGE_`, then command-line flags. Both binaries load the same
//! [`Config`] so they agree on the listener endpoint and protocol profile.

mod defaults;
mod logging;
mod profile;
mod socket;

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_TCP_PORT, SOCKET_FILE_NAME, default_log_filter,
    default_log_filter_string, default_log_format, default_protocol_profile,
    default_socket_endpoint,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use profile::{ProtocolProfile, ProtocolProfileParseError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved configuration shared by the daemon and the CLI.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, OrthoConfig)]
#[ortho_config(prefix = "BLUEBRIDGE")]
pub struct Config {
    /// Endpoint the bridge listens on and clients connect to.
    #[ortho_config(default = defaults::default_socket_endpoint())]
    #[serde(default = "defaults::default_socket_endpoint")]
    pub daemon_socket: SocketEndpoint,

    /// Tracing filter expression, e.g. `info` or `bluebridged=debug`.
    #[ortho_config(default = defaults::default_log_filter_string())]
    #[serde(default = "defaults::default_log_filter_string")]
    pub log_filter: String,

    /// Log output format.
    #[ortho_config(default = defaults::default_log_format())]
    #[serde(default = "defaults::default_log_format")]
    pub log_format: LogFormat,

    /// Wire convention spoken on the listener socket.
    #[ortho_config(default = defaults::default_protocol_profile())]
    #[serde(default = "defaults::default_protocol_profile")]
    pub protocol_profile: ProtocolProfile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daemon_socket: defaults::default_socket_endpoint(),
            log_filter: defaults::default_log_filter_string(),
            log_format: defaults::default_log_format(),
            protocol_profile: defaults::default_protocol_profile(),
        }
    }
}

impl Config {
    /// Loads configuration from the process environment and arguments.
    ///
    /// # Errors
    ///
    /// Returns the loader error when any configuration layer fails to parse
    /// or merge.
    pub fn load() -> Result<Self, Arc<OrthoError>> {
        <Self as OrthoConfig>::load()
    }

    /// Loads configuration from an explicit argument iterator; used by tests
    /// and by front-ends that pre-filter their argument list.
    ///
    /// # Errors
    ///
    /// Returns the loader error when any configuration layer fails to parse
    /// or merge.
    pub fn load_from_iter<I>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator<Item = OsString>,
    {
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Endpoint the bridge listens on.
    #[must_use]
    pub fn daemon_socket(&self) -> &SocketEndpoint {
        &self.daemon_socket
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Wire convention spoken on the listener socket.
    #[must_use]
    pub fn protocol_profile(&self) -> ProtocolProfile {
        self.protocol_profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_line_profile() {
        let config = Config::default();
        assert_eq!(config.protocol_profile(), ProtocolProfile::Line);
        assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
    }

    #[test]
    fn default_config_points_at_well_known_endpoint() {
        let config = Config::default();
        match config.daemon_socket() {
            SocketEndpoint::Unix { path } => {
                assert!(path.as_str().ends_with(SOCKET_FILE_NAME));
            }
            SocketEndpoint::Tcp { port, .. } => assert_eq!(*port, DEFAULT_TCP_PORT),
        }
    }
}
