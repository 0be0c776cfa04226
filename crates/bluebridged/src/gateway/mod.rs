//! Boundary to the host radio stack.
//!
//! The bridge core never talks to radio hardware directly. Everything it
//! needs is expressed here: the [`RadioGateway`] trait for adapter-level
//! operations, the [`ClassicChannel`] and [`AttributeLink`] traits for the
//! two session flavours, and [`GatewayEvent`] for the asynchronous callbacks
//! the stack delivers (connection state, service discovery, characteristic
//! completions, scan results). A backend implementation hands events to an
//! `mpsc` sender; the event pump consumes them on its own thread so a
//! callback never blocks a client session loop.

mod noop;

pub use noop::NoopRadioGateway;

use thiserror::Error;

pub(crate) const GATEWAY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::gateway");

/// A device the adapter has previously bonded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BondedDevice {
    pub name: String,
    pub address: String,
}

impl BondedDevice {
    /// Builds a bonded device record.
    #[must_use]
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    /// Renders the `name [address]` listing line sent to clients.
    #[must_use]
    pub fn listing_line(&self) -> String {
        format!("{} [{}]", self.name, self.address)
    }
}

/// One characteristic within a discovered attribute service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GattCharacteristic {
    pub uuid: String,
}

impl GattCharacteristic {
    #[must_use]
    pub fn new(uuid: impl Into<String>) -> Self {
        Self { uuid: uuid.into() }
    }
}

/// One discovered attribute service and its characteristics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GattService {
    pub uuid: String,
    pub characteristics: Vec<GattCharacteristic>,
}

impl GattService {
    #[must_use]
    pub fn new(uuid: impl Into<String>, characteristics: Vec<GattCharacteristic>) -> Self {
        Self {
            uuid: uuid.into(),
            characteristics,
        }
    }

    /// Looks a characteristic up within this service.
    #[must_use]
    pub fn characteristic(&self, uuid: &str) -> Option<&GattCharacteristic> {
        self.characteristics.iter().find(|entry| entry.uuid == uuid)
    }
}

/// Errors surfaced by the radio stack.
///
/// Display text is client-facing: the dispatcher renders these messages
/// verbatim into `ERROR <reason>` replies.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The caller lacks the authorisation the operation requires.
    #[error("Missing {capability} permissions")]
    PermissionDenied { capability: String },

    /// No usable radio adapter on this host.
    #[error("radio adapter unavailable")]
    AdapterUnavailable,

    /// Operation rejected or failed inside the radio stack.
    #[error("{message}")]
    Radio { message: String },

    /// The session was already closed when the operation arrived.
    #[error("session closed")]
    SessionClosed,

    /// Transport-level failure on the device connection.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Creates a permission denial for the named capability.
    pub fn permission_denied(capability: impl Into<String>) -> Self {
        Self::PermissionDenied {
            capability: capability.into(),
        }
    }

    /// Creates a radio-stack failure with a client-facing message.
    pub fn radio(message: impl Into<String>) -> Self {
        Self::Radio {
            message: message.into(),
        }
    }
}

/// Asynchronous callbacks delivered by the radio stack.
///
/// Events are correlated to sessions only by address and characteristic
/// identity, never to the command that triggered them.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// An attribute-protocol connection completed.
    AttributeConnected { address: String },
    /// An attribute-protocol connection dropped.
    AttributeDisconnected { address: String },
    /// Service discovery finished for an attribute session.
    ServicesDiscovered {
        address: String,
        services: Vec<GattService>,
    },
    /// A requested characteristic read completed.
    CharacteristicRead {
        address: String,
        characteristic: String,
        value: Vec<u8>,
    },
    /// A requested characteristic write completed.
    CharacteristicWritten {
        address: String,
        characteristic: String,
    },
    /// A scan surfaced a nearby device.
    DeviceDiscovered {
        address: String,
        name: Option<String>,
    },
    /// The scan stopped on a stack-side failure.
    ScanFailed { reason: String },
}

/// Adapter-level operations the bridge invokes on behalf of clients.
#[cfg_attr(test, mockall::automock)]
pub trait RadioGateway: Send + Sync {
    /// Requests that the radio be powered on.
    fn enable(&self) -> Result<(), GatewayError>;

    /// Requests that the radio be powered off.
    fn disable(&self) -> Result<(), GatewayError>;

    /// Reports whether the radio is currently powered.
    fn is_enabled(&self) -> Result<bool, GatewayError>;

    /// Enumerates devices the adapter has bonded with.
    fn bonded_devices(&self) -> Result<Vec<BondedDevice>, GatewayError>;

    /// Starts the bonding procedure with a remote device.
    fn request_bond(&self, address: &str) -> Result<(), GatewayError>;

    /// Opens a classic byte-stream connection to the given service on the
    /// remote device. Blocks until the connection is established or fails.
    fn open_classic(
        &self,
        address: &str,
        service: &str,
    ) -> Result<Box<dyn ClassicChannel>, GatewayError>;

    /// Requests an attribute-protocol connection. Returns immediately; the
    /// connection completes (and services are discovered) asynchronously via
    /// [`GatewayEvent`]s.
    fn open_attribute(&self, address: &str) -> Result<Box<dyn AttributeLink>, GatewayError>;

    /// Starts low-energy device discovery; results arrive as events until
    /// the scan is stopped.
    fn start_scan(&self) -> Result<(), GatewayError>;

    /// Stops low-energy device discovery.
    fn stop_scan(&self) -> Result<(), GatewayError>;
}

/// An open classic byte-stream connection.
pub trait ClassicChannel: Send + Sync {
    /// Writes the payload to the outbound stream.
    fn send(&self, payload: &[u8]) -> Result<(), GatewayError>;

    /// Reads whatever inbound bytes are available right now; returns zero
    /// when nothing is pending. Never blocks waiting for data.
    fn recv(&self, buffer: &mut [u8]) -> Result<usize, GatewayError>;

    /// Releases the underlying connection.
    fn close(&self);
}

/// An open attribute-protocol connection.
///
/// Read and write requests are fire-and-forget: completion surfaces as a
/// [`GatewayEvent`], never as a return value.
pub trait AttributeLink: Send + Sync {
    /// Requests a read of the characteristic within the given service.
    fn request_read(&self, service: &str, characteristic: &str) -> Result<(), GatewayError>;

    /// Requests a write of `value` to the characteristic within the given
    /// service.
    fn request_write(
        &self,
        service: &str,
        characteristic: &str,
        value: &[u8],
    ) -> Result<(), GatewayError>;

    /// Releases the underlying connection.
    fn close(&self);
}
