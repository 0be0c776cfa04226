//! Verb routing shared by both protocol profiles.

use std::sync::Arc;

use tracing::debug;

use bluebridge_config::ProtocolProfile;

use crate::gateway::RadioGateway;
use crate::notify::NotificationSink;
use crate::registry::{
    AttributeSession, ClassicSession, Session, SessionKind, SessionRegistry,
};

use super::DISPATCH_TARGET;
use super::command::{Command, CommandError};
use super::errors::DispatchError;
use super::reply::Outcome;

/// Bytes drained from a classic session per RECV command.
const RECV_BUFFER_BYTES: usize = 1024;

/// Shared collaborators handed to every dispatch call.
///
/// The registry is the only mutable state here; it is safe under concurrent
/// dispatch from arbitrarily many session loops.
#[derive(Clone)]
pub struct BridgeContext {
    pub gateway: Arc<dyn RadioGateway>,
    pub registry: Arc<SessionRegistry>,
    pub sink: Arc<dyn NotificationSink>,
}

/// Maps parsed commands to replies for one protocol profile.
///
/// Stateless apart from the profile: all session state lives in the registry
/// the context hands in, so one router instance serves every connection.
#[derive(Debug, Clone, Copy)]
pub struct CommandRouter {
    profile: ProtocolProfile,
}

impl CommandRouter {
    /// Creates a router for the given profile.
    #[must_use]
    pub fn new(profile: ProtocolProfile) -> Self {
        Self { profile }
    }

    /// The profile this router speaks.
    #[must_use]
    pub fn profile(&self) -> ProtocolProfile {
        self.profile
    }

    /// Maps one input line to exactly one reply.
    ///
    /// Parse and execution failures become error replies, never loop faults:
    /// an `ERROR` reply is a normal outcome and the session loop continues.
    pub fn dispatch(&self, line: &str, context: &BridgeContext) -> Outcome {
        let command = match Command::parse(line, self.profile) {
            Ok(command) => command,
            Err(error) => {
                debug!(target: DISPATCH_TARGET, %error, "rejected command line");
                return self.render_error(&DispatchError::Command(error));
            }
        };

        debug!(target: DISPATCH_TARGET, ?command, "dispatching command");
        match self.execute(command, context) {
            Ok(outcome) => outcome,
            Err(error) => {
                debug!(target: DISPATCH_TARGET, %error, "command failed");
                self.render_error(&error)
            }
        }
    }

    fn execute(
        &self,
        command: Command,
        context: &BridgeContext,
    ) -> Result<Outcome, DispatchError> {
        match command {
            Command::Enable => {
                context.gateway.enable()?;
                Ok(self.success("ENABLED"))
            }
            Command::Disable => {
                context.gateway.disable()?;
                Ok(self.success("DISABLED"))
            }
            Command::IsEnabled => {
                let enabled = context.gateway.is_enabled()?;
                Ok(Outcome::flag(enabled))
            }
            Command::List => self.list_bonded(context),
            Command::ScanStart => {
                context.gateway.start_scan()?;
                Ok(Outcome::flag(true))
            }
            Command::ScanStop => {
                context.gateway.stop_scan()?;
                Ok(Outcome::flag(true))
            }
            Command::Pair { address } => {
                context.gateway.request_bond(&address)?;
                Ok(self.success("PAIR_REQUESTED"))
            }
            Command::Connect { address, service } => self.connect(context, address, service),
            Command::Send { address, payload } => self.send(context, &address, &payload),
            Command::Recv { address } => self.recv(context, &address),
            Command::Disconnect { address } => self.disconnect(context, &address),
            Command::GattConnect { address } => self.gatt_connect(context, address),
            Command::GattRead {
                address,
                characteristic,
            } => self.gatt_read(context, &address, &characteristic),
            Command::GattWrite {
                address,
                characteristic,
                value,
            } => self.gatt_write(context, &address, &characteristic, &value),
            Command::Exit => Ok(Outcome::closing("BYE")),
        }
    }

    fn list_bonded(&self, context: &BridgeContext) -> Result<Outcome, DispatchError> {
        let devices = context.gateway.bonded_devices()?;
        match self.profile {
            ProtocolProfile::Line => Ok(Outcome::listing(
                devices.iter().map(|device| device.listing_line()).collect(),
            )),
            // The byte profile answers success only; the listing itself goes
            // out-of-band through the notification sink.
            ProtocolProfile::Byte => {
                for device in &devices {
                    context.sink.notify_user(&device.listing_line());
                }
                Ok(Outcome::flag(true))
            }
        }
    }

    fn connect(
        &self,
        context: &BridgeContext,
        address: String,
        service: String,
    ) -> Result<Outcome, DispatchError> {
        let channel = context.gateway.open_classic(&address, &service)?;
        let session = Session::Classic(Arc::new(ClassicSession::new(
            address.clone(),
            service,
            channel,
        )));
        // Replace policy: a new CONNECT for an address with a live session
        // wins, and the displaced session is closed before we reply.
        if let Some(displaced) = context.registry.put(session)? {
            displaced.close_once();
            debug!(
                target: DISPATCH_TARGET,
                address = %address,
                "replaced existing classic session"
            );
        }
        Ok(self.success(format!("CONNECTED {address}")))
    }

    fn send(
        &self,
        context: &BridgeContext,
        address: &str,
        payload: &str,
    ) -> Result<Outcome, DispatchError> {
        let Some(session) = context.registry.classic(address)? else {
            return Err(DispatchError::NotConnected);
        };
        match session.send(payload.as_bytes()) {
            Ok(()) => Ok(self.success("SENT")),
            Err(error) => {
                self.discard_classic(context, address)?;
                Err(error.into())
            }
        }
    }

    fn recv(&self, context: &BridgeContext, address: &str) -> Result<Outcome, DispatchError> {
        let Some(session) = context.registry.classic(address)? else {
            return Err(DispatchError::NotConnected);
        };
        let mut buffer = [0_u8; RECV_BUFFER_BYTES];
        match session.recv(&mut buffer) {
            Ok(0) => Ok(self.success("NO_DATA")),
            Ok(read) => {
                let data = String::from_utf8_lossy(&buffer[..read]);
                Ok(self.success(format!("DATA {data}")))
            }
            Err(error) => {
                self.discard_classic(context, address)?;
                Err(error.into())
            }
        }
    }

    fn disconnect(
        &self,
        context: &BridgeContext,
        address: &str,
    ) -> Result<Outcome, DispatchError> {
        let Some(session) = context.registry.remove(address, SessionKind::Classic)? else {
            return Err(DispatchError::NotConnected);
        };
        session.close_once();
        Ok(self.success(format!("DISCONNECTED {address}")))
    }

    fn gatt_connect(
        &self,
        context: &BridgeContext,
        address: String,
    ) -> Result<Outcome, DispatchError> {
        let link = context.gateway.open_attribute(&address)?;
        let session = Session::Attribute(Arc::new(AttributeSession::new(address, link)));
        if let Some(displaced) = context.registry.put(session)? {
            displaced.close_once();
        }
        Ok(self.success("GATT_CONNECTING"))
    }

    fn gatt_read(
        &self,
        context: &BridgeContext,
        address: &str,
        characteristic: &str,
    ) -> Result<Outcome, DispatchError> {
        let session = self.attribute_session(context, address)?;
        let Some(service) = session.find_characteristic(characteristic)? else {
            return Err(DispatchError::GattNotConnected);
        };
        session.request_read(&service, characteristic)?;
        Ok(self.success("GATT_READ_REQUESTED"))
    }

    fn gatt_write(
        &self,
        context: &BridgeContext,
        address: &str,
        characteristic: &str,
        value: &[u8],
    ) -> Result<Outcome, DispatchError> {
        let session = self.attribute_session(context, address)?;
        let Some(service) = session.find_characteristic(characteristic)? else {
            return Err(DispatchError::GattNotConnected);
        };
        session.request_write(&service, characteristic, value)?;
        Ok(self.success("GATT_WRITE_REQUESTED"))
    }

    fn attribute_session(
        &self,
        context: &BridgeContext,
        address: &str,
    ) -> Result<Arc<AttributeSession>, DispatchError> {
        context
            .registry
            .attribute(address)?
            .ok_or(DispatchError::GattNotConnected)
    }

    /// A faulted stream destroys the session: remove it from the registry
    /// and close the gateway resource before surfacing the error reply.
    fn discard_classic(
        &self,
        context: &BridgeContext,
        address: &str,
    ) -> Result<(), DispatchError> {
        if let Some(session) = context.registry.remove(address, SessionKind::Classic)? {
            session.close_once();
        }
        Ok(())
    }

    fn success(&self, line: impl Into<String>) -> Outcome {
        match self.profile {
            ProtocolProfile::Line => Outcome::status(line),
            ProtocolProfile::Byte => Outcome::flag(true),
        }
    }

    fn render_error(&self, error: &DispatchError) -> Outcome {
        match self.profile {
            ProtocolProfile::Byte => Outcome::flag(false),
            ProtocolProfile::Line => {
                if let DispatchError::Command(CommandError::UnknownVerb { verb }) = error {
                    Outcome::status(format!("UNKNOWN_COMMAND: {verb}"))
                } else {
                    Outcome::status(format!("ERROR {error}"))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::dispatch::reply::Reply;
    use crate::gateway::{GatewayError, MockRadioGateway};
    use crate::tests::support::RecordingSink;

    use super::*;

    fn context_with(gateway: MockRadioGateway) -> BridgeContext {
        BridgeContext {
            gateway: Arc::new(gateway),
            registry: Arc::new(SessionRegistry::new()),
            sink: Arc::new(RecordingSink::default()),
        }
    }

    #[test]
    fn permission_denial_renders_client_facing_message() {
        let mut gateway = MockRadioGateway::new();
        gateway
            .expect_enable()
            .returning(|| Err(GatewayError::permission_denied("Bluetooth")));
        let context = context_with(gateway);

        let router = CommandRouter::new(ProtocolProfile::Line);
        let outcome = router.dispatch("ENABLE", &context);
        assert_eq!(
            outcome.reply,
            Reply::Status("ERROR Missing Bluetooth permissions".to_owned())
        );
    }

    #[test]
    fn gateway_connect_error_propagates_to_reply() {
        let mut gateway = MockRadioGateway::new();
        gateway
            .expect_open_classic()
            .returning(|_, _| Err(GatewayError::radio("read failed, socket might closed")));
        let context = context_with(gateway);

        let router = CommandRouter::new(ProtocolProfile::Line);
        let outcome = router.dispatch("CONNECT AA:BB:CC:DD:EE:FF 1101", &context);
        assert_eq!(
            outcome.reply,
            Reply::Status("ERROR read failed, socket might closed".to_owned())
        );
    }

    #[test]
    fn byte_profile_renders_failures_as_false() {
        let mut gateway = MockRadioGateway::new();
        gateway
            .expect_enable()
            .returning(|| Err(GatewayError::AdapterUnavailable));
        let context = context_with(gateway);

        let router = CommandRouter::new(ProtocolProfile::Byte);
        let outcome = router.dispatch("enable", &context);
        assert_eq!(outcome.reply, Reply::Flag(false));
    }

    #[test]
    fn byte_profile_reports_adapter_state() {
        let mut gateway = MockRadioGateway::new();
        gateway.expect_is_enabled().returning(|| Ok(true));
        let context = context_with(gateway);

        let router = CommandRouter::new(ProtocolProfile::Byte);
        let outcome = router.dispatch("is_enabled", &context);
        assert_eq!(outcome.reply, Reply::Flag(true));
    }
}
