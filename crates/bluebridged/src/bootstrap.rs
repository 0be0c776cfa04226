//! Bridge bootstrap orchestration.
//!
//! Bootstrap loads configuration, initialises telemetry, prepares the socket
//! filesystem, and creates the (empty) session registry. The notification
//! sink observes every stage so operators can diagnose startup failures.

use std::sync::Arc;

use ortho_config::OrthoError;
use thiserror::Error;

use bluebridge_config::{Config, SocketPreparationError};

use crate::notify::NotificationSink;
use crate::registry::SessionRegistry;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the bridge configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader that returns a pre-resolved configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already-resolved configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// Socket preparation failed.
    #[error("failed to prepare bridge socket: {source}")]
    Socket {
        /// Filesystem error reported while preparing the socket directory.
        #[source]
        source: SocketPreparationError,
    },
}

/// Result of a successful bootstrap invocation.
pub struct Bridge {
    config: Config,
    registry: Arc<SessionRegistry>,
    telemetry: TelemetryHandle,
}

impl Bridge {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The process-wide session registry, created empty at bootstrap and
    /// drained at shutdown.
    #[must_use]
    pub fn registry(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.registry)
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }
}

/// Bootstraps the bridge using the supplied collaborators.
///
/// # Errors
///
/// Returns a [`BootstrapError`] naming the stage that failed; the sink is
/// informed before the error propagates.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    sink: &dyn NotificationSink,
) -> Result<Bridge, BootstrapError> {
    sink.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            sink.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            sink.bootstrap_failed(&error);
            return Err(error);
        }
    };

    if let Err(source) = config.daemon_socket().prepare_filesystem() {
        let error = BootstrapError::Socket { source };
        sink.bootstrap_failed(&error);
        return Err(error);
    }

    let registry = Arc::new(SessionRegistry::new());
    sink.bootstrap_succeeded(&config);

    Ok(Bridge {
        config,
        registry,
        telemetry,
    })
}
