//! Placeholder gateway used until a real radio backend is linked in.

use std::sync::mpsc::Sender;

use tracing::warn;

use super::{
    AttributeLink, BondedDevice, ClassicChannel, GATEWAY_TARGET, GatewayError, GatewayEvent,
    RadioGateway,
};

/// Gateway that records requests without touching any radio hardware.
///
/// Adapter queries answer honestly for a radio-less host (`is_enabled` is
/// false, no bonded devices); every operation that would need hardware
/// reports [`GatewayError::AdapterUnavailable`]. The event sender is held so
/// the event pump stays attached for the gateway's lifetime even though this
/// implementation never emits.
pub struct NoopRadioGateway {
    _events: Sender<GatewayEvent>,
}

impl NoopRadioGateway {
    /// Builds a placeholder gateway bound to the given event channel.
    #[must_use]
    pub fn new(events: Sender<GatewayEvent>) -> Self {
        Self { _events: events }
    }

    fn unavailable(&self, operation: &str) -> GatewayError {
        warn!(
            target: GATEWAY_TARGET,
            operation,
            "radio operation requested but no backend is linked"
        );
        GatewayError::AdapterUnavailable
    }
}

impl RadioGateway for NoopRadioGateway {
    fn enable(&self) -> Result<(), GatewayError> {
        Err(self.unavailable("enable"))
    }

    fn disable(&self) -> Result<(), GatewayError> {
        Err(self.unavailable("disable"))
    }

    fn is_enabled(&self) -> Result<bool, GatewayError> {
        Ok(false)
    }

    fn bonded_devices(&self) -> Result<Vec<BondedDevice>, GatewayError> {
        Ok(Vec::new())
    }

    fn request_bond(&self, _address: &str) -> Result<(), GatewayError> {
        Err(self.unavailable("request_bond"))
    }

    fn open_classic(
        &self,
        _address: &str,
        _service: &str,
    ) -> Result<Box<dyn ClassicChannel>, GatewayError> {
        Err(self.unavailable("open_classic"))
    }

    fn open_attribute(&self, _address: &str) -> Result<Box<dyn AttributeLink>, GatewayError> {
        Err(self.unavailable("open_attribute"))
    }

    fn start_scan(&self) -> Result<(), GatewayError> {
        Err(self.unavailable("start_scan"))
    }

    fn stop_scan(&self) -> Result<(), GatewayError> {
        Err(self.unavailable("stop_scan"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn reports_radio_as_disabled() {
        let (sender, _receiver) = mpsc::channel();
        let gateway = NoopRadioGateway::new(sender);
        assert_eq!(gateway.is_enabled().unwrap(), false);
        assert!(gateway.bonded_devices().unwrap().is_empty());
    }

    #[test]
    fn hardware_operations_are_unavailable() {
        let (sender, _receiver) = mpsc::channel();
        let gateway = NoopRadioGateway::new(sender);
        assert!(matches!(
            gateway.enable(),
            Err(GatewayError::AdapterUnavailable)
        ));
        assert!(matches!(
            gateway.open_classic("AA:BB:CC:DD:EE:FF", "1101"),
            Err(GatewayError::AdapterUnavailable)
        ));
    }
}
