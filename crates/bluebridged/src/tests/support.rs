//! Shared test doubles for the daemon test suites.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use bluebridge_config::{Config, LogFormat, ProtocolProfile, SocketEndpoint};

use crate::bootstrap::{BootstrapError, ConfigLoader};
use crate::dispatch::BridgeContext;
use crate::gateway::{
    AttributeLink, BondedDevice, ClassicChannel, GatewayError, GatewayEvent, RadioGateway,
};
use crate::notify::NotificationSink;
use crate::registry::SessionRegistry;

/// Events observed by the [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SinkEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    ConnectionFault(String),
    Gateway(String),
    User(String),
}

/// Sink that records every notification for later assertions.
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub(crate) fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().expect("sink lock").clone()
    }

    pub(crate) fn user_messages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::User(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: SinkEvent) {
        self.events.lock().expect("sink lock").push(event);
    }
}

impl NotificationSink for RecordingSink {
    fn bootstrap_starting(&self) {
        self.push(SinkEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.push(SinkEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.push(SinkEvent::BootstrapFailed(error.to_string()));
    }

    fn connection_fault(&self, detail: &str) {
        self.push(SinkEvent::ConnectionFault(detail.to_owned()));
    }

    fn gateway_event(&self, event: &GatewayEvent) {
        self.push(SinkEvent::Gateway(format!("{event:?}")));
    }

    fn notify_user(&self, message: &str) {
        self.push(SinkEvent::User(message.to_owned()));
    }
}

/// Observable state behind one fake classic channel.
#[derive(Debug, Default)]
pub(crate) struct FakeChannelState {
    pub(crate) sent: Mutex<Vec<u8>>,
    pub(crate) inbound: Mutex<VecDeque<u8>>,
    pub(crate) closes: Mutex<usize>,
    pub(crate) fail_sends: AtomicBool,
}

impl FakeChannelState {
    pub(crate) fn push_inbound(&self, bytes: &[u8]) {
        self.inbound.lock().expect("inbound lock").extend(bytes);
    }

    pub(crate) fn close_count(&self) -> usize {
        *self.closes.lock().expect("closes lock")
    }

    pub(crate) fn sent_bytes(&self) -> Vec<u8> {
        self.sent.lock().expect("sent lock").clone()
    }
}

struct FakeChannel {
    state: Arc<FakeChannelState>,
}

impl ClassicChannel for FakeChannel {
    fn send(&self, payload: &[u8]) -> Result<(), GatewayError> {
        if self.state.fail_sends.load(Ordering::SeqCst) {
            return Err(GatewayError::radio("stream reset"));
        }
        self.state
            .sent
            .lock()
            .expect("sent lock")
            .extend_from_slice(payload);
        Ok(())
    }

    fn recv(&self, buffer: &mut [u8]) -> Result<usize, GatewayError> {
        if self.state.fail_sends.load(Ordering::SeqCst) {
            return Err(GatewayError::radio("stream reset"));
        }
        let mut inbound = self.state.inbound.lock().expect("inbound lock");
        let mut read = 0;
        while read < buffer.len() {
            let Some(byte) = inbound.pop_front() else {
                break;
            };
            buffer[read] = byte;
            read += 1;
        }
        Ok(read)
    }

    fn close(&self) {
        *self.state.closes.lock().expect("closes lock") += 1;
    }
}

/// Observable state behind one fake attribute link.
#[derive(Debug, Default)]
pub(crate) struct FakeLinkState {
    pub(crate) reads: Mutex<Vec<(String, String)>>,
    pub(crate) writes: Mutex<Vec<(String, String, Vec<u8>)>>,
    pub(crate) closes: Mutex<usize>,
}

impl FakeLinkState {
    pub(crate) fn reads(&self) -> Vec<(String, String)> {
        self.reads.lock().expect("reads lock").clone()
    }

    pub(crate) fn writes(&self) -> Vec<(String, String, Vec<u8>)> {
        self.writes.lock().expect("writes lock").clone()
    }

    pub(crate) fn close_count(&self) -> usize {
        *self.closes.lock().expect("closes lock")
    }
}

pub(crate) struct FakeLink {
    state: Arc<FakeLinkState>,
}

impl FakeLink {
    pub(crate) fn new(state: Arc<FakeLinkState>) -> Self {
        Self { state }
    }
}

impl AttributeLink for FakeLink {
    fn request_read(&self, service: &str, characteristic: &str) -> Result<(), GatewayError> {
        self.state
            .reads
            .lock()
            .expect("reads lock")
            .push((service.to_owned(), characteristic.to_owned()));
        Ok(())
    }

    fn request_write(
        &self,
        service: &str,
        characteristic: &str,
        value: &[u8],
    ) -> Result<(), GatewayError> {
        self.state.writes.lock().expect("writes lock").push((
            service.to_owned(),
            characteristic.to_owned(),
            value.to_vec(),
        ));
        Ok(())
    }

    fn close(&self) {
        *self.state.closes.lock().expect("closes lock") += 1;
    }
}

/// Scriptable in-memory gateway; every opened channel and link stays
/// observable for assertions about leaks and close counts.
#[derive(Default)]
pub(crate) struct FakeGateway {
    pub(crate) enabled: AtomicBool,
    pub(crate) scanning: AtomicBool,
    pub(crate) permission_denied: AtomicBool,
    pub(crate) connect_failure: Mutex<Option<String>>,
    pub(crate) bonded: Mutex<Vec<BondedDevice>>,
    pub(crate) bond_requests: Mutex<Vec<String>>,
    channels: Mutex<Vec<(String, Arc<FakeChannelState>)>>,
    links: Mutex<Vec<(String, Arc<FakeLinkState>)>>,
}

impl FakeGateway {
    pub(crate) fn with_bonded(devices: Vec<BondedDevice>) -> Self {
        let gateway = Self::default();
        *gateway.bonded.lock().expect("bonded lock") = devices;
        gateway
    }

    /// Most recently opened channel for the address.
    pub(crate) fn channel(&self, address: &str) -> Arc<FakeChannelState> {
        self.channels
            .lock()
            .expect("channels lock")
            .iter()
            .rev()
            .find(|(opened, _)| opened == address)
            .map(|(_, state)| Arc::clone(state))
            .expect("no channel opened for address")
    }

    /// Every channel ever opened, in order.
    pub(crate) fn channels(&self) -> Vec<Arc<FakeChannelState>> {
        self.channels
            .lock()
            .expect("channels lock")
            .iter()
            .map(|(_, state)| Arc::clone(state))
            .collect()
    }

    /// Most recently opened attribute link for the address.
    pub(crate) fn link(&self, address: &str) -> Arc<FakeLinkState> {
        self.links
            .lock()
            .expect("links lock")
            .iter()
            .rev()
            .find(|(opened, _)| opened == address)
            .map(|(_, state)| Arc::clone(state))
            .expect("no link opened for address")
    }
}

impl RadioGateway for FakeGateway {
    fn enable(&self) -> Result<(), GatewayError> {
        if self.permission_denied.load(Ordering::SeqCst) {
            return Err(GatewayError::permission_denied("Bluetooth"));
        }
        self.enabled.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn disable(&self) -> Result<(), GatewayError> {
        self.enabled.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_enabled(&self) -> Result<bool, GatewayError> {
        Ok(self.enabled.load(Ordering::SeqCst))
    }

    fn bonded_devices(&self) -> Result<Vec<BondedDevice>, GatewayError> {
        Ok(self.bonded.lock().expect("bonded lock").clone())
    }

    fn request_bond(&self, address: &str) -> Result<(), GatewayError> {
        self.bond_requests
            .lock()
            .expect("bond lock")
            .push(address.to_owned());
        Ok(())
    }

    fn open_classic(
        &self,
        address: &str,
        _service: &str,
    ) -> Result<Box<dyn ClassicChannel>, GatewayError> {
        if let Some(message) = self.connect_failure.lock().expect("failure lock").clone() {
            return Err(GatewayError::radio(message));
        }
        let state = Arc::new(FakeChannelState::default());
        self.channels
            .lock()
            .expect("channels lock")
            .push((address.to_owned(), Arc::clone(&state)));
        Ok(Box::new(FakeChannel { state }))
    }

    fn open_attribute(&self, address: &str) -> Result<Box<dyn AttributeLink>, GatewayError> {
        let state = Arc::new(FakeLinkState::default());
        self.links
            .lock()
            .expect("links lock")
            .push((address.to_owned(), Arc::clone(&state)));
        Ok(Box::new(FakeLink::new(state)))
    }

    fn start_scan(&self) -> Result<(), GatewayError> {
        self.scanning.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop_scan(&self) -> Result<(), GatewayError> {
        self.scanning.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Loader handing out a fixed test configuration.
#[derive(Debug, Clone)]
pub(crate) struct TestConfigLoader {
    config: Config,
}

impl TestConfigLoader {
    pub(crate) fn new() -> Self {
        Self {
            config: Config {
                daemon_socket: SocketEndpoint::tcp("127.0.0.1", 0),
                log_filter: "info".to_owned(),
                log_format: LogFormat::Compact,
                protocol_profile: ProtocolProfile::Line,
            },
        }
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<ortho_config::OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Builds a dispatch context over fresh collaborators.
pub(crate) fn test_context(gateway: Arc<FakeGateway>, sink: Arc<RecordingSink>) -> BridgeContext {
    BridgeContext {
        gateway,
        registry: Arc::new(SessionRegistry::new()),
        sink,
    }
}
