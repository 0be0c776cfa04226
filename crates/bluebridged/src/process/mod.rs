//! Process-level runtime: the serve loop and shutdown sequencing.

mod shutdown;

pub use shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};

use thiserror::Error;
use tracing::info;

use crate::bootstrap::{self, BootstrapError, ConfigLoader, SystemConfigLoader};
use crate::dispatch::{BridgeContext, ClientSessionHandler, CommandRouter};
use crate::events::EventPump;
use crate::gateway::{GatewayEvent, NoopRadioGateway, RadioGateway};
use crate::notify::{NotificationSink, StructuredNotifier};
use crate::registry::RegistryError;
use crate::transport::{ListenerError, SocketListener};

/// Errors fatal to the serve loop.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
    #[error("failed to drain session registry: {0}")]
    Drain(#[from] RegistryError),
}

/// Runs the bridge with the production collaborators until a termination
/// signal arrives, then drains every open session.
///
/// # Errors
///
/// Returns a [`ServeError`] when bootstrap, the listener, or the shutdown
/// path fails.
pub fn run_server() -> Result<(), ServeError> {
    let sink: Arc<dyn NotificationSink> = Arc::new(StructuredNotifier::new());
    let (events_sender, events) = mpsc::channel();
    let gateway: Arc<dyn RadioGateway> = Arc::new(NoopRadioGateway::new(events_sender));
    run_server_with(
        &SystemConfigLoader,
        sink,
        gateway,
        events,
        &SystemShutdownSignal::new(),
    )
}

/// Runs the bridge with injected collaborators.
///
/// An embedding host supplies its own gateway (with the matching event
/// channel), sink, and shutdown signal; the bridge owns everything else.
/// Shutdown stops the accept loop, lets running session loops drain their
/// own connections, and closes every registered session exactly once.
///
/// # Errors
///
/// Returns a [`ServeError`] when bootstrap, the listener, or the shutdown
/// path fails.
pub fn run_server_with(
    loader: &dyn ConfigLoader,
    sink: Arc<dyn NotificationSink>,
    gateway: Arc<dyn RadioGateway>,
    events: Receiver<GatewayEvent>,
    shutdown: &dyn ShutdownSignal,
) -> Result<(), ServeError> {
    let bridge = bootstrap::bootstrap_with(loader, sink.as_ref())?;
    let registry = bridge.registry();

    let listener = SocketListener::bind(bridge.config().daemon_socket())?;
    let _events_pump = EventPump::new(events, Arc::clone(&registry), Arc::clone(&sink)).start();

    let router = CommandRouter::new(bridge.config().protocol_profile());
    let context = BridgeContext {
        gateway,
        registry: Arc::clone(&registry),
        sink,
    };
    let handler = Arc::new(ClientSessionHandler::new(router, context));

    let listener_handle = listener.start(handler)?;
    shutdown.wait()?;

    listener_handle.shutdown();
    listener_handle.join()?;

    let drained = registry.drain_all()?;
    info!(
        target: PROCESS_TARGET,
        sessions = drained.len(),
        "drained session registry"
    );

    Ok(())
}
