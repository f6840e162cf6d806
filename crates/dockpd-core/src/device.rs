//! The PD sub-device: identity resolution and the firmware write path.

use bitflags::bitflags;
use thiserror::Error;
use tracing::debug;

use crate::events::{UpdateEvent, UpdateObserver};
use crate::instance_id::{InstanceIdBuilder, InstanceIdError};
use crate::payload::{ChunkArray, ChunkError, FirmwareError, PdFirmware};
use crate::protocol::constants::{
    EC_HID_DATA_PAGE_SZ, INSTANCE_ID_SCOPE, PROTOCOL_ID, VENDOR_ID_TAG,
};
use crate::protocol::header::FwUpdatePkg;
use crate::protocol::types::{DevType, DockSku, DockType, device_name};
use crate::transport::{SharedProxy, TransportError};
use crate::update::UpdatePhases;
use crate::version::{self, VersionFormat};

#[derive(Error, Debug)]
pub enum PdError {
    #[error("Failed to build instance id: {0}")]
    InstanceId(#[from] InstanceIdError),

    #[error("Firmware artifact unusable: {0}")]
    Firmware(#[from] FirmwareError),

    #[error("Chunk resolution failed: {0}")]
    Chunk(#[from] ChunkError),

    #[error("Proxy query failed: {source}")]
    Proxy {
        #[source]
        source: TransportError,
    },

    #[error("Transport write failed at chunk {chunk} of {total}: {source}")]
    Write {
        chunk: usize,
        total: usize,
        #[source]
        source: TransportError,
    },
}

bitflags! {
    /// Behavioral capabilities declared per device class.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DeviceFlags: u8 {
        /// Device accepts firmware updates.
        const UPDATABLE = 1 << 0;
        /// Payloads must be vendor-signed; the device enforces this itself.
        const SIGNED_PAYLOAD = 1 << 1;
        /// No explicit restart step is required from the host scheduler.
        const SKIPS_RESTART = 1 << 2;
        /// Update ordering relative to sibling devices is fixed.
        const EXPLICIT_ORDER = 1 << 3;
        /// All transport routes through the proxy; the device never opens
        /// its own channel.
        const USE_PROXY = 1 << 4;
    }
}

/// Static capability declaration for a device class.
#[derive(Debug, Clone, Copy)]
pub struct DeviceCaps {
    pub protocol: &'static str,
    pub vendor: &'static str,
    pub flags: DeviceFlags,
    pub version_format: VersionFormat,
}

/// One addressable PD controller behind the hub EC.
///
/// Created once per discovered port and kept for the hub session. The
/// device never owns a transport channel; everything is delegated to the
/// proxy it was bound to at construction.
pub struct PdDevice {
    proxy: SharedProxy,
    subtype: u8,
    instance: u8,
    identifier: u8,
    name: Option<String>,
    logical_id: Option<String>,
    instance_id: Option<String>,
    version_raw: u32,
    version_format: VersionFormat,
}

impl PdDevice {
    /// Capabilities of the PD device class, non-negotiable.
    pub const CAPS: DeviceCaps = DeviceCaps {
        protocol: PROTOCOL_ID,
        vendor: VENDOR_ID_TAG,
        flags: DeviceFlags::UPDATABLE
            .union(DeviceFlags::SIGNED_PAYLOAD)
            .union(DeviceFlags::SKIPS_RESTART)
            .union(DeviceFlags::EXPLICIT_ORDER)
            .union(DeviceFlags::USE_PROXY),
        version_format: VersionFormat::Quad,
    };

    /// Bind a PD device to its proxy. The wire identifier is always
    /// `instance + 1`.
    pub fn new(proxy: SharedProxy, subtype: u8, instance: u8) -> Self {
        debug_assert!(instance < u8::MAX, "instance out of range");
        Self {
            proxy,
            subtype,
            instance,
            identifier: instance.wrapping_add(1),
            name: None,
            logical_id: None,
            instance_id: None,
            version_raw: 0,
            version_format: Self::CAPS.version_format,
        }
    }

    pub fn subtype(&self) -> u8 {
        self.subtype
    }

    pub fn instance(&self) -> u8 {
        self.instance
    }

    /// Wire-protocol instance identifier.
    pub fn identifier(&self) -> u8 {
        self.identifier
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn logical_id(&self) -> Option<&str> {
        self.logical_id.as_deref()
    }

    /// Composite instance identifier, present after a successful `setup`.
    pub fn instance_id(&self) -> Option<&str> {
        self.instance_id.as_deref()
    }

    /// Last-resolved firmware version, host representation.
    pub fn version_raw(&self) -> u32 {
        self.version_raw
    }

    /// Current version rendered under this device's format.
    pub fn version(&self) -> String {
        self.convert_version(self.version_raw)
    }

    pub fn convert_version(&self, raw: u32) -> String {
        version::from_u32_hex(raw, self.version_format)
    }

    /// Resolve identity and current firmware version from hub-reported
    /// state. Re-runnable on every (re)enumeration.
    pub fn setup(&mut self) -> Result<(), PdError> {
        // name and logical id derive purely from construction parameters
        let name = device_name(DevType::Pd, self.subtype, self.instance);
        self.name = Some(name.clone());
        self.logical_id = Some(name);

        let dock_type = self
            .proxy
            .dock_type()
            .map_err(|source| PdError::Proxy { source })?;
        let dock_sku = self
            .proxy
            .dock_sku()
            .map_err(|source| PdError::Proxy { source })?;

        // dock type and SKU must come from the known registries
        if DockType::from_u8(dock_type).is_none() {
            return Err(InstanceIdError::UnknownAttribute {
                key: "DOCKTYPE",
                value: dock_type,
            }
            .into());
        }
        if DockSku::from_u8(dock_sku).is_none() {
            return Err(InstanceIdError::UnknownAttribute {
                key: "DOCKSKU",
                value: dock_sku,
            }
            .into());
        }

        let instance_id = InstanceIdBuilder::new(INSTANCE_ID_SCOPE)
            .attr("DOCKTYPE", dock_type)
            .attr("DOCKSKU", dock_sku)
            .attr("DEVTYPE", DevType::Pd as u8)
            .attr("INST", self.instance)
            .build()?;
        self.instance_id = Some(instance_id);

        let raw = self
            .proxy
            .pd_version(self.subtype, self.instance)
            .map_err(|source| PdError::Proxy { source })?;
        // wire value is big-endian; swapped unconditionally, see DESIGN.md
        self.version_raw = raw.swap_bytes();

        debug!(
            name = self.name.as_deref().unwrap_or(""),
            instance_id = self.instance_id.as_deref().unwrap_or(""),
            version = %self.version(),
            "PD setup complete"
        );
        Ok(())
    }

    /// Stream a firmware artifact to the device under the
    /// detach/write/attach/reload phase sequence.
    ///
    /// The resolved version is stale after success until the next `setup`.
    /// Not reentrant for the same device; single-flight is the caller's
    /// responsibility.
    pub fn write_firmware(
        &self,
        firmware: &PdFirmware,
        observer: &dyn UpdateObserver,
    ) -> Result<(), PdError> {
        let mut phases = UpdatePhases::new();

        // detach: zero-weight bookkeeping, no transport activity
        Self::advance_phase(&mut phases, observer);

        self.write_chunks(firmware, EC_HID_DATA_PAGE_SZ, observer)?;

        // attach, reload: the device has returned; dependent state is
        // refreshed by the next setup call
        Self::advance_phase(&mut phases, observer);
        Self::advance_phase(&mut phases, observer);
        Self::advance_phase(&mut phases, observer);
        observer.on_event(&UpdateEvent::Completed);
        Ok(())
    }

    fn advance_phase(phases: &mut UpdatePhases, observer: &dyn UpdateObserver) {
        let from = phases.current();
        if let Some(to) = phases.advance() {
            observer.on_event(&UpdateEvent::PhaseChanged { from, to });
        }
    }

    /// Wrap, partition and sequentially write the firmware payload.
    fn write_chunks(
        &self,
        firmware: &PdFirmware,
        page_sz: usize,
        observer: &dyn UpdateObserver,
    ) -> Result<(), PdError> {
        let fw = firmware.bytes()?;

        debug!(
            device = self.name.as_deref().unwrap_or("PD"),
            old = %self.version(),
            new = firmware.version().unwrap_or("unknown"),
            "Writing firmware"
        );

        let wrapped = FwUpdatePkg::wrap(fw, DevType::Pd, self.identifier);
        let chunks = ChunkArray::new(&wrapped, page_sz);
        let total = chunks.len();

        // the receiving PD accumulates the payload assuming sequential
        // delivery: strictly ascending order, no reordering
        for index in 0..total {
            let chunk = chunks.get(index)?;
            self.proxy
                .hid_write(chunk.bytes())
                .map_err(|source| PdError::Write {
                    chunk: index,
                    total,
                    source,
                })?;
            observer.on_event(&UpdateEvent::ChunkWritten {
                written: index + 1,
                total,
            });
        }

        debug!(
            device = self.name.as_deref().unwrap_or("PD"),
            "Firmware written successfully"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingObserver;
    use crate::transport::MockProxy;
    use std::sync::Arc;

    fn scripted_proxy() -> Arc<MockProxy> {
        let mock = Arc::new(MockProxy::new());
        mock.set_dock(0x07, 0x02);
        mock.set_pd_version(0, 0, 0x04030201);
        mock
    }

    #[test]
    fn test_identifier_is_instance_plus_one() {
        let mock = Arc::new(MockProxy::new());
        for instance in 0u8..=254 {
            let dev = PdDevice::new(mock.clone(), 0, instance);
            assert_eq!(dev.identifier(), instance + 1);
        }
    }

    #[test]
    fn test_setup_resolves_identity_and_version() {
        let mock = scripted_proxy();
        let mut dev = PdDevice::new(mock.clone(), 0, 0);
        dev.setup().unwrap();

        assert_eq!(dev.name(), Some("PD UP5"));
        assert_eq!(dev.logical_id(), Some("PD UP5"));
        assert_eq!(
            dev.instance_id(),
            Some("EC\\DOCKTYPE_07&DOCKSKU_02&DEVTYPE_01&INST_00")
        );
        // stored version is the byte-swapped form of the proxy value
        assert_eq!(dev.version_raw(), 0x01020304);
        assert_eq!(dev.version(), "1.2.3.4");
    }

    #[test]
    fn test_setup_is_rerunnable() {
        let mock = scripted_proxy();
        let mut dev = PdDevice::new(mock.clone(), 0, 0);
        dev.setup().unwrap();

        mock.set_pd_version(0, 0, 0x0A0B0C0D);
        dev.setup().unwrap();
        assert_eq!(dev.version_raw(), 0x0D0C0B0A);
    }

    #[test]
    fn test_setup_rejects_unknown_dock_type_but_keeps_name() {
        let mock = scripted_proxy();
        mock.set_dock(0xEE, 0x02);
        let mut dev = PdDevice::new(mock.clone(), 0, 1);

        let err = dev.setup().unwrap_err();
        assert!(matches!(
            err,
            PdError::InstanceId(InstanceIdError::UnknownAttribute {
                key: "DOCKTYPE",
                value: 0xEE,
            })
        ));
        // step 1 side effect precedes the identity failure
        assert_eq!(dev.name(), Some("PD UP15"));
        assert_eq!(dev.instance_id(), None);
    }

    #[test]
    fn test_convert_version_is_deterministic() {
        let dev = PdDevice::new(Arc::new(MockProxy::new()), 0, 0);
        assert_eq!(dev.convert_version(0xFF00AB10), "ff.0.ab.10");
        assert_eq!(
            dev.convert_version(0xDEADBEEF),
            dev.convert_version(0xDEADBEEF)
        );
    }

    #[test]
    fn test_write_chunks_scenario_1000_bytes_page_64() {
        let mock = scripted_proxy();
        let dev = PdDevice::new(mock.clone(), 0, 0);
        let firmware = PdFirmware::new(vec![0x5Au8; 1000]);
        let rec = RecordingObserver::new();

        dev.write_chunks(&firmware, 64, &rec).unwrap();

        // wrapped buffer = 13-byte header + 1000 payload bytes = 16 pages
        let writes = mock.get_writes();
        assert_eq!(writes.len(), 16);
        for chunk in writes.iter().take(15) {
            assert_eq!(chunk.len(), 64);
        }
        assert_eq!(writes[15].len(), 1013 - 15 * 64);

        // concatenated pages reconstruct the wrapped buffer exactly
        let rebuilt: Vec<u8> = writes.concat();
        assert_eq!(
            rebuilt,
            FwUpdatePkg::wrap(&[0x5Au8; 1000], DevType::Pd, dev.identifier())
        );

        let progress = rec.progress();
        assert_eq!(progress.len(), 16);
        assert_eq!(progress.first(), Some(&(1, 16)));
        assert_eq!(progress.last(), Some(&(16, 16)));
        assert!(progress.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_write_chunks_aborts_at_failing_chunk() {
        let mock = scripted_proxy();
        mock.fail_write_at(5);
        let dev = PdDevice::new(mock.clone(), 0, 0);
        let firmware = PdFirmware::new(vec![0u8; 1000]);
        let rec = RecordingObserver::new();

        let err = dev.write_chunks(&firmware, 64, &rec).unwrap_err();
        assert!(matches!(
            err,
            PdError::Write {
                chunk: 5,
                total: 16,
                ..
            }
        ));

        // exactly 5 chunks landed and were reported; none after the failure
        assert_eq!(mock.get_writes().len(), 5);
        assert_eq!(rec.progress().len(), 5);
        assert_eq!(rec.progress().last(), Some(&(5, 16)));
    }

    #[test]
    fn test_write_firmware_phases_and_completion() {
        let mock = scripted_proxy();
        let dev = PdDevice::new(mock.clone(), 0, 0);
        let firmware = PdFirmware::new(vec![1u8; 400]);
        let rec = RecordingObserver::new();

        dev.write_firmware(&firmware, &rec).unwrap();

        // 413 wrapped bytes at the protocol page size = 3 writes
        assert_eq!(mock.get_writes().len(), 3);

        let phases: Vec<(crate::update::UpdatePhase, crate::update::UpdatePhase)> = rec
            .events()
            .iter()
            .filter_map(|e| match e {
                UpdateEvent::PhaseChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect();
        use crate::update::UpdatePhase::*;
        assert_eq!(
            phases,
            vec![(Detach, Write), (Write, Attach), (Attach, Reload)]
        );
        assert!(
            rec.events()
                .iter()
                .any(|e| matches!(e, UpdateEvent::Completed))
        );
    }

    #[test]
    fn test_write_firmware_failure_stops_phase_sequence() {
        let mock = scripted_proxy();
        mock.fail_write_at(0);
        let dev = PdDevice::new(mock.clone(), 0, 0);
        let firmware = PdFirmware::new(vec![1u8; 400]);
        let rec = RecordingObserver::new();

        assert!(dev.write_firmware(&firmware, &rec).is_err());

        use crate::update::UpdatePhase::*;
        let phases: Vec<_> = rec
            .events()
            .iter()
            .filter_map(|e| match e {
                UpdateEvent::PhaseChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect();
        assert_eq!(phases, vec![(Detach, Write)]);
        assert!(
            !rec.events()
                .iter()
                .any(|e| matches!(e, UpdateEvent::Completed))
        );
    }

    #[test]
    fn test_write_firmware_without_payload_touches_no_transport() {
        let mock = scripted_proxy();
        let dev = PdDevice::new(mock.clone(), 0, 0);
        let rec = RecordingObserver::new();

        let err = dev
            .write_firmware(&PdFirmware::empty(), &rec)
            .unwrap_err();
        assert!(matches!(err, PdError::Firmware(FirmwareError::NoPayload)));
        assert!(mock.get_writes().is_empty());
        assert!(rec.progress().is_empty());
    }

    #[test]
    fn test_device_caps() {
        let caps = PdDevice::CAPS;
        assert_eq!(caps.protocol, PROTOCOL_ID);
        assert_eq!(caps.vendor, VENDOR_ID_TAG);
        assert_eq!(caps.version_format, VersionFormat::Quad);
        assert!(caps.flags.contains(DeviceFlags::UPDATABLE));
        assert!(caps.flags.contains(DeviceFlags::SIGNED_PAYLOAD));
        assert!(caps.flags.contains(DeviceFlags::SKIPS_RESTART));
        assert!(caps.flags.contains(DeviceFlags::EXPLICIT_ORDER));
        assert!(caps.flags.contains(DeviceFlags::USE_PROXY));
    }
}
