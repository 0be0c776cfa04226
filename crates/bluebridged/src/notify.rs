//! Notification sink for everything that happens off the client-reply path.
//!
//! Listener faults, asynchronous gateway events, and user-facing messages
//! have no client connection to answer on; they land here instead. The sink
//! is fire-and-forget: implementations must not block the caller.

use std::sync::Arc;

use bluebridge_config::Config;

use crate::bootstrap::BootstrapError;
use crate::gateway::GatewayEvent;

const NOTIFY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::notify");

/// Observer surface for out-of-band bridge events.
pub trait NotificationSink: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Fault on one client connection. The faulting connection is already
    /// being torn down; no other connection is affected.
    fn connection_fault(&self, detail: &str);

    /// Asynchronous radio-stack event: scan results, link state changes,
    /// characteristic completions.
    fn gateway_event(&self, event: &GatewayEvent);

    /// Fire-and-forget user-facing message.
    fn notify_user(&self, message: &str);
}

impl<T> NotificationSink for Arc<T>
where
    T: NotificationSink,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn connection_fault(&self, detail: &str) {
        (**self).connection_fault(detail);
    }

    fn gateway_event(&self, event: &GatewayEvent) {
        (**self).gateway_event(event);
    }

    fn notify_user(&self, message: &str) {
        (**self).notify_user(message);
    }
}

/// Default sink that records everything through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredNotifier;

impl StructuredNotifier {
    /// Builds a new notifier.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl NotificationSink for StructuredNotifier {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: NOTIFY_TARGET,
            event = "bootstrap_starting",
            "starting bridge bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: NOTIFY_TARGET,
            event = "bootstrap_succeeded",
            socket = %config.daemon_socket(),
            profile = %config.protocol_profile(),
            log_filter = %config.log_filter(),
            "bridge bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: NOTIFY_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "bridge bootstrap failed"
        );
    }

    fn connection_fault(&self, detail: &str) {
        tracing::warn!(
            target: NOTIFY_TARGET,
            event = "connection_fault",
            detail,
            "client connection fault"
        );
    }

    fn gateway_event(&self, event: &GatewayEvent) {
        match event {
            GatewayEvent::DeviceDiscovered { address, name } => {
                tracing::info!(
                    target: NOTIFY_TARGET,
                    event = "device_discovered",
                    address = %address,
                    name = name.as_deref().unwrap_or("<unnamed>"),
                    "scan surfaced a device"
                );
            }
            GatewayEvent::ScanFailed { reason } => {
                tracing::warn!(
                    target: NOTIFY_TARGET,
                    event = "scan_failed",
                    reason = %reason,
                    "scan stopped on failure"
                );
            }
            GatewayEvent::CharacteristicRead {
                address,
                characteristic,
                value,
            } => {
                tracing::info!(
                    target: NOTIFY_TARGET,
                    event = "characteristic_read",
                    address = %address,
                    characteristic = %characteristic,
                    bytes = value.len(),
                    "characteristic read completed"
                );
            }
            other => {
                tracing::debug!(
                    target: NOTIFY_TARGET,
                    event = ?other,
                    "gateway event"
                );
            }
        }
    }

    fn notify_user(&self, message: &str) {
        tracing::info!(
            target: NOTIFY_TARGET,
            event = "notify_user",
            message,
            "user notification"
        );
    }
}
