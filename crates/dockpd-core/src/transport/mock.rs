//! Mock proxy for testing the update pipeline without hardware.

use std::collections::HashMap;
use std::sync::Mutex;

use super::traits::{EcProxy, TransportError};

/// Mock proxy with captured writes and scripted hub state.
pub struct MockProxy {
    dock_type: Mutex<u8>,
    dock_sku: Mutex<u8>,
    /// Scripted raw versions keyed by (subtype, instance).
    versions: Mutex<HashMap<(u8, u8), u32>>,
    /// Captured transport writes, in order.
    write_log: Mutex<Vec<Vec<u8>>>,
    /// Write index that fails, if any.
    fail_write_at: Mutex<Option<usize>>,
    /// Whether the device is "connected".
    connected: Mutex<bool>,
}

impl MockProxy {
    pub fn new() -> Self {
        Self {
            dock_type: Mutex::new(0x07),
            dock_sku: Mutex::new(0x02),
            versions: Mutex::new(HashMap::new()),
            write_log: Mutex::new(Vec::new()),
            fail_write_at: Mutex::new(None),
            connected: Mutex::new(true),
        }
    }

    /// Script the dock type and SKU bytes.
    pub fn set_dock(&self, dock_type: u8, dock_sku: u8) {
        *self.dock_type.lock().unwrap() = dock_type;
        *self.dock_sku.lock().unwrap() = dock_sku;
    }

    /// Script the raw wire version for a PD position.
    pub fn set_pd_version(&self, subtype: u8, instance: u8, raw: u32) {
        self.versions
            .lock()
            .unwrap()
            .insert((subtype, instance), raw);
    }

    /// Make the write with this 0-based index fail.
    pub fn fail_write_at(&self, index: usize) {
        *self.fail_write_at.lock().unwrap() = Some(index);
    }

    /// Get all captured writes.
    pub fn get_writes(&self) -> Vec<Vec<u8>> {
        self.write_log.lock().unwrap().clone()
    }

    /// Clear captured writes.
    pub fn clear_writes(&self) {
        self.write_log.lock().unwrap().clear();
    }

    /// Simulate device disconnect.
    pub fn disconnect(&self) {
        *self.connected.lock().unwrap() = false;
    }

    /// Simulate device reconnect.
    pub fn reconnect(&self) {
        *self.connected.lock().unwrap() = true;
    }

    fn check_connected(&self) -> Result<(), TransportError> {
        if *self.connected.lock().unwrap() {
            Ok(())
        } else {
            Err(TransportError::Disconnected)
        }
    }
}

impl Default for MockProxy {
    fn default() -> Self {
        Self::new()
    }
}

impl EcProxy for MockProxy {
    fn dock_type(&self) -> Result<u8, TransportError> {
        self.check_connected()?;
        Ok(*self.dock_type.lock().unwrap())
    }

    fn dock_sku(&self) -> Result<u8, TransportError> {
        self.check_connected()?;
        Ok(*self.dock_sku.lock().unwrap())
    }

    fn pd_version(&self, subtype: u8, instance: u8) -> Result<u32, TransportError> {
        self.check_connected()?;
        self.versions
            .lock()
            .unwrap()
            .get(&(subtype, instance))
            .copied()
            .ok_or(TransportError::Timeout { timeout_ms: 2000 })
    }

    fn hid_write(&self, data: &[u8]) -> Result<(), TransportError> {
        self.check_connected()?;
        let mut log = self.write_log.lock().unwrap();
        if *self.fail_write_at.lock().unwrap() == Some(log.len()) {
            return Err(TransportError::WriteFailed("simulated NAK".into()));
        }
        log.push(data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_write_capture() {
        let mock = MockProxy::new();
        mock.hid_write(b"Hello").unwrap();
        mock.hid_write(b"World").unwrap();

        let writes = mock.get_writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0], b"Hello");
        assert_eq!(writes[1], b"World");
    }

    #[test]
    fn test_mock_scripted_state() {
        let mock = MockProxy::new();
        mock.set_dock(0x07, 0x03);
        mock.set_pd_version(0, 1, 0xAABBCCDD);

        assert_eq!(mock.dock_type().unwrap(), 0x07);
        assert_eq!(mock.dock_sku().unwrap(), 0x03);
        assert_eq!(mock.pd_version(0, 1).unwrap(), 0xAABBCCDD);
        // Unscripted position behaves like an unresponsive EC.
        assert!(mock.pd_version(0, 9).is_err());
    }

    #[test]
    fn test_mock_fail_write_at() {
        let mock = MockProxy::new();
        mock.fail_write_at(1);

        assert!(mock.hid_write(b"a").is_ok());
        assert!(mock.hid_write(b"b").is_err());
        // The failed write is not captured.
        assert_eq!(mock.get_writes().len(), 1);
    }

    #[test]
    fn test_mock_disconnect() {
        let mock = MockProxy::new();
        mock.disconnect();
        assert!(matches!(
            mock.hid_write(b"x"),
            Err(TransportError::Disconnected)
        ));
        mock.reconnect();
        assert!(mock.hid_write(b"x").is_ok());
    }
}
