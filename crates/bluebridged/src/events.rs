//! Pump translating radio-stack callbacks into registry updates.
//!
//! Gateway callbacks arrive on an `mpsc` channel and are consumed here on a
//! dedicated thread. The pump mutates shared state only through the session
//! registry's API and forwards every event to the notification sink, so a
//! callback can never block a client session loop and a session loop never
//! waits on a callback.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::thread;

use tracing::{debug, warn};

use crate::gateway::GatewayEvent;
use crate::notify::NotificationSink;
use crate::registry::{AttributeSession, LinkState, RegistryError, SessionRegistry};

const EVENTS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::events");

/// Consumer of the gateway's asynchronous event stream.
pub struct EventPump {
    events: Receiver<GatewayEvent>,
    registry: Arc<SessionRegistry>,
    sink: Arc<dyn NotificationSink>,
}

impl EventPump {
    /// Builds a pump over the given event channel.
    #[must_use]
    pub fn new(
        events: Receiver<GatewayEvent>,
        registry: Arc<SessionRegistry>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            events,
            registry,
            sink,
        }
    }

    /// Starts the pump thread. It runs until every gateway-side sender has
    /// been dropped.
    pub fn start(self) -> thread::JoinHandle<()> {
        thread::spawn(move || self.run())
    }

    fn run(self) {
        while let Ok(event) = self.events.recv() {
            self.apply(&event);
            self.sink.gateway_event(&event);
        }
        debug!(target: EVENTS_TARGET, "gateway event channel closed");
    }

    fn apply(&self, event: &GatewayEvent) {
        let result = match event {
            GatewayEvent::ServicesDiscovered { address, services } => {
                self.update_attribute(address, |session| {
                    session.set_link_state(LinkState::Connected)?;
                    session.replace_services(services.clone())
                })
            }
            GatewayEvent::AttributeConnected { address } => {
                self.update_attribute(address, |session| {
                    session.set_link_state(LinkState::Connected)
                })
            }
            GatewayEvent::AttributeDisconnected { address } => {
                self.update_attribute(address, |session| session.set_link_state(LinkState::Lost))
            }
            _ => Ok(()),
        };
        if let Err(error) = result {
            warn!(
                target: EVENTS_TARGET,
                %error,
                "failed to apply gateway event"
            );
        }
    }

    fn update_attribute(
        &self,
        address: &str,
        apply: impl FnOnce(&AttributeSession) -> Result<(), RegistryError>,
    ) -> Result<(), RegistryError> {
        match self.registry.attribute(address)? {
            Some(session) => apply(&session),
            None => {
                debug!(
                    target: EVENTS_TARGET,
                    address,
                    "event for unknown attribute session"
                );
                Ok(())
            }
        }
    }
}
