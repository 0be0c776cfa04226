//! Concurrent store of open device sessions keyed by remote address.
//!
//! The registry is the only state shared between client session loops and
//! the gateway event pump. One mutex over the whole map keeps `put`,
//! `remove`, and `drain_all` linearizable, which is what upholds the
//! at-most-one-session-per-address-per-kind invariant under concurrent
//! `CONNECT` storms: the second installer receives the displaced session
//! back and is responsible for closing it.
//!
//! Sessions close their gateway resource at most once. Every close path
//! (explicit disconnect, stream fault, replacement, shutdown drain) goes
//! through the session's atomic close latch, so racing paths cannot double
//! close and a drain after a fault still accounts for every session.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::gateway::{AttributeLink, ClassicChannel, GattService, GatewayError};

/// Registry lock was poisoned by a panicking thread.
#[derive(Debug, Error)]
#[error("session registry lock poisoned")]
pub struct RegistryError;

/// Distinguishes the two session flavours so both can coexist per address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    Classic,
    Attribute,
}

/// Connection state of an attribute session.
///
/// A session is installed `Pending` the moment the connection is requested;
/// the gateway event pump moves it to `Connected` once the stack reports the
/// link up, and to `Lost` if the link drops. The session stays registered in
/// either case until explicitly removed or drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Pending,
    Connected,
    Lost,
}

/// One open classic byte-stream connection.
pub struct ClassicSession {
    address: String,
    service: String,
    channel: Box<dyn ClassicChannel>,
    closed: AtomicBool,
}

impl ClassicSession {
    /// Wraps a freshly opened gateway channel.
    #[must_use]
    pub fn new(
        address: impl Into<String>,
        service: impl Into<String>,
        channel: Box<dyn ClassicChannel>,
    ) -> Self {
        Self {
            address: address.into(),
            service: service.into(),
            channel,
            closed: AtomicBool::new(false),
        }
    }

    /// Remote device address this session is bound to.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Service identifier the connection was opened against.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Writes the payload to the outbound stream.
    pub fn send(&self, payload: &[u8]) -> Result<(), GatewayError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(GatewayError::SessionClosed);
        }
        self.channel.send(payload)
    }

    /// Reads whatever inbound bytes are available now; zero means no data.
    pub fn recv(&self, buffer: &mut [u8]) -> Result<usize, GatewayError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(GatewayError::SessionClosed);
        }
        self.channel.recv(buffer)
    }

    /// Closes the underlying channel; only the first caller reaches the
    /// gateway. Returns whether this call performed the close.
    pub fn close_once(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.channel.close();
        true
    }
}

impl fmt::Debug for ClassicSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ClassicSession")
            .field("address", &self.address)
            .field("service", &self.service)
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

/// One open attribute-protocol connection plus its discovered catalog.
pub struct AttributeSession {
    address: String,
    link: Box<dyn AttributeLink>,
    state: Mutex<LinkState>,
    services: Mutex<Vec<GattService>>,
    closed: AtomicBool,
}

impl AttributeSession {
    /// Wraps a freshly requested attribute link in the `Pending` state with
    /// an empty service catalog.
    #[must_use]
    pub fn new(address: impl Into<String>, link: Box<dyn AttributeLink>) -> Self {
        Self {
            address: address.into(),
            link,
            state: Mutex::new(LinkState::Pending),
            services: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Remote device address this session is bound to.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Current link state.
    pub fn link_state(&self) -> Result<LinkState, RegistryError> {
        self.state.lock().map(|state| *state).map_err(|_| RegistryError)
    }

    /// Records a link-state transition reported by the gateway.
    pub fn set_link_state(&self, state: LinkState) -> Result<(), RegistryError> {
        let mut guard = self.state.lock().map_err(|_| RegistryError)?;
        *guard = state;
        Ok(())
    }

    /// Replaces the discovered service catalog.
    pub fn replace_services(&self, services: Vec<GattService>) -> Result<(), RegistryError> {
        let mut guard = self.services.lock().map_err(|_| RegistryError)?;
        *guard = services;
        Ok(())
    }

    /// Scans every discovered service for the characteristic; the first
    /// match wins. Returns the owning service's identifier.
    pub fn find_characteristic(&self, uuid: &str) -> Result<Option<String>, RegistryError> {
        let services = self.services.lock().map_err(|_| RegistryError)?;
        Ok(services
            .iter()
            .find(|service| service.characteristic(uuid).is_some())
            .map(|service| service.uuid.clone()))
    }

    /// Requests a characteristic read; completion arrives as a gateway event.
    pub fn request_read(&self, service: &str, characteristic: &str) -> Result<(), GatewayError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(GatewayError::SessionClosed);
        }
        self.link.request_read(service, characteristic)
    }

    /// Requests a characteristic write; completion arrives as a gateway event.
    pub fn request_write(
        &self,
        service: &str,
        characteristic: &str,
        value: &[u8],
    ) -> Result<(), GatewayError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(GatewayError::SessionClosed);
        }
        self.link.request_write(service, characteristic, value)
    }

    /// Closes the underlying link; only the first caller reaches the
    /// gateway. Returns whether this call performed the close.
    pub fn close_once(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.link.close();
        true
    }
}

impl fmt::Debug for AttributeSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AttributeSession")
            .field("address", &self.address)
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

/// A registered session of either kind.
#[derive(Debug, Clone)]
pub enum Session {
    Classic(Arc<ClassicSession>),
    Attribute(Arc<AttributeSession>),
}

impl Session {
    /// The kind slot this session occupies in the registry.
    #[must_use]
    pub fn kind(&self) -> SessionKind {
        match self {
            Self::Classic(_) => SessionKind::Classic,
            Self::Attribute(_) => SessionKind::Attribute,
        }
    }

    /// Remote device address this session is bound to.
    #[must_use]
    pub fn address(&self) -> &str {
        match self {
            Self::Classic(session) => session.address(),
            Self::Attribute(session) => session.address(),
        }
    }

    /// Closes the session's gateway resource at most once.
    pub fn close_once(&self) -> bool {
        match self {
            Self::Classic(session) => session.close_once(),
            Self::Attribute(session) => session.close_once(),
        }
    }
}

/// Concurrent mapping from device address to at most one session per kind.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<(String, SessionKind), Session>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a session, returning any displaced session for the same
    /// address and kind. The caller must close the displaced session; the
    /// swap itself is atomic, so racing installers leak nothing.
    pub fn put(&self, session: Session) -> Result<Option<Session>, RegistryError> {
        let key = (session.address().to_owned(), session.kind());
        let mut sessions = self.sessions.lock().map_err(|_| RegistryError)?;
        Ok(sessions.insert(key, session))
    }

    /// Looks a session up without removing it.
    pub fn get(&self, address: &str, kind: SessionKind) -> Result<Option<Session>, RegistryError> {
        let sessions = self.sessions.lock().map_err(|_| RegistryError)?;
        Ok(sessions.get(&(address.to_owned(), kind)).cloned())
    }

    /// Removes a session. Removing an absent session is a no-op.
    pub fn remove(
        &self,
        address: &str,
        kind: SessionKind,
    ) -> Result<Option<Session>, RegistryError> {
        let mut sessions = self.sessions.lock().map_err(|_| RegistryError)?;
        Ok(sessions.remove(&(address.to_owned(), kind)))
    }

    /// Looks up the classic session for an address.
    pub fn classic(&self, address: &str) -> Result<Option<Arc<ClassicSession>>, RegistryError> {
        Ok(match self.get(address, SessionKind::Classic)? {
            Some(Session::Classic(session)) => Some(session),
            _ => None,
        })
    }

    /// Looks up the attribute session for an address.
    pub fn attribute(&self, address: &str) -> Result<Option<Arc<AttributeSession>>, RegistryError> {
        Ok(match self.get(address, SessionKind::Attribute)? {
            Some(Session::Attribute(session)) => Some(session),
            _ => None,
        })
    }

    /// Empties the registry, closing every drained session. Each close
    /// reaches the gateway exactly once even when a prior fault path already
    /// half-closed the session. Returns the drained sessions.
    pub fn drain_all(&self) -> Result<Vec<Session>, RegistryError> {
        let drained: Vec<Session> = {
            let mut sessions = self.sessions.lock().map_err(|_| RegistryError)?;
            sessions.drain().map(|(_, session)| session).collect()
        };
        for session in &drained {
            session.close_once();
        }
        Ok(drained)
    }

    /// Number of registered sessions.
    pub fn len(&self) -> Result<usize, RegistryError> {
        let sessions = self.sessions.lock().map_err(|_| RegistryError)?;
        Ok(sessions.len())
    }

    /// Whether the registry holds no sessions.
    pub fn is_empty(&self) -> Result<bool, RegistryError> {
        Ok(self.len()? == 0)
    }
}
