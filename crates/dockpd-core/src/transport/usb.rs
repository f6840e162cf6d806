//! nusb-based production proxy implementation.
//!
//! Key nusb 0.2 API patterns:
//! - `list_devices().wait()` for device enumeration
//! - `device_info.open().wait()` to open the device
//! - `device.claim_interface(n).wait()` to claim an interface
//! - `interface.endpoint::<Bulk, Out>(addr)` to get an endpoint
//! - endpoint `.writer(buf_size)` / `.reader(buf_size)` for blocking I/O

use byteorder::{ByteOrder, LittleEndian};
use nusb::transfer::{Bulk, In, Out};
use nusb::{Interface, MaybeFuture, list_devices};
use std::io::{Read, Write};
use std::sync::Mutex;
use tracing::{debug, info, instrument};

use super::traits::{EcProxy, TransportError};
use crate::protocol::constants::{
    DOCK_INFO_RESP_LEN, DOCK_INFO_SKU_OFFSET, DOCK_PRODUCT_ID, DOCK_VENDOR_ID,
    EC_HID_CMD_GET_DOCK_DATA, EC_HID_CMD_GET_DOCK_INFO, EC_HID_CMD_GET_DOCK_TYPE,
};
use crate::protocol::types::DevType;

/// nusb-backed hub proxy.
///
/// The channel is shared by every PD device bound to this proxy; `io_lock`
/// serializes command/response exchanges and firmware page writes so no two
/// transfers are in flight concurrently.
pub struct UsbProxy {
    interface: Interface,
    in_endpoint: u8,
    out_endpoint: u8,
    vid: u16,
    pid: u16,
    io_lock: Mutex<()>,
}

impl UsbProxy {
    /// Open the dock hub EC endpoint with the default VID/PID.
    #[instrument(level = "info")]
    pub fn open() -> Result<Self, TransportError> {
        Self::open_with_ids(DOCK_VENDOR_ID, DOCK_PRODUCT_ID)
    }

    /// Open a hub with specific VID/PID.
    #[instrument(level = "info", fields(vid = format!("{:04X}", vid), pid = format!("{:04X}", pid)))]
    pub fn open_with_ids(vid: u16, pid: u16) -> Result<Self, TransportError> {
        let device_info = list_devices()
            .wait()
            .map_err(|e| TransportError::OpenFailed(e.to_string()))?
            .find(|d| d.vendor_id() == vid && d.product_id() == pid)
            .ok_or(TransportError::DeviceNotFound { vid, pid })?;

        let device = device_info
            .open()
            .wait()
            .map_err(|e| TransportError::OpenFailed(e.to_string()))?;

        let interface =
            device
                .claim_interface(0)
                .wait()
                .map_err(|e| TransportError::ClaimInterfaceFailed {
                    interface: 0,
                    message: e.to_string(),
                })?;

        // Find BULK endpoints
        let mut in_endpoint: u8 = 0;
        let mut out_endpoint: u8 = 0;

        for config in device.configurations() {
            for iface in config.interfaces() {
                if iface.interface_number() == 0 {
                    for alt in iface.alt_settings() {
                        for ep in alt.endpoints() {
                            if ep.transfer_type() == nusb::descriptors::TransferType::Bulk {
                                if ep.direction() == nusb::transfer::Direction::In {
                                    in_endpoint = ep.address();
                                } else {
                                    out_endpoint = ep.address();
                                }
                            }
                        }
                    }
                }
            }
        }

        if in_endpoint == 0 {
            return Err(TransportError::EndpointNotFound {
                ep_type: "Bulk".into(),
                direction: "In".into(),
            });
        }
        if out_endpoint == 0 {
            return Err(TransportError::EndpointNotFound {
                ep_type: "Bulk".into(),
                direction: "Out".into(),
            });
        }

        info!(
            in_ep = %format!("0x{:02X}", in_endpoint),
            out_ep = %format!("0x{:02X}", out_endpoint),
            "Hub proxy opened"
        );

        Ok(Self {
            interface,
            in_endpoint,
            out_endpoint,
            vid,
            pid,
            io_lock: Mutex::new(()),
        })
    }

    pub fn vendor_id(&self) -> u16 {
        self.vid
    }

    pub fn product_id(&self) -> u16 {
        self.pid
    }

    /// Raw channel write; callers must hold `io_lock`.
    fn raw_write(&self, data: &[u8]) -> Result<(), TransportError> {
        let ep = self
            .interface
            .endpoint::<Bulk, Out>(self.out_endpoint)
            .map_err(|e| TransportError::WriteFailed(e.to_string()))?;

        let mut writer = ep.writer(4096);
        writer
            .write_all(data)
            .map_err(|e| TransportError::WriteFailed(e.to_string()))?;
        writer
            .flush()
            .map_err(|e| TransportError::WriteFailed(e.to_string()))?;

        debug!(bytes_written = data.len(), "Write complete");
        Ok(())
    }

    /// Raw channel read; callers must hold `io_lock`.
    fn raw_read(&self, max_len: usize) -> Result<Vec<u8>, TransportError> {
        let ep = self
            .interface
            .endpoint::<Bulk, In>(self.in_endpoint)
            .map_err(|e| TransportError::ReadFailed(e.to_string()))?;

        let mut reader = ep.reader(4096);
        let mut buf = vec![0u8; max_len];

        let n = reader
            .read(&mut buf)
            .map_err(|e| TransportError::ReadFailed(e.to_string()))?;

        buf.truncate(n);
        debug!(bytes_read = n, "Read complete");
        Ok(buf)
    }

    /// One command/response exchange under the channel lock.
    fn command(&self, request: &[u8], resp_len: usize) -> Result<Vec<u8>, TransportError> {
        let _guard = self.io_lock.lock().unwrap();
        self.raw_write(request)?;
        let resp = self.raw_read(resp_len)?;
        if resp.len() < resp_len {
            return Err(TransportError::ShortResponse {
                expected: resp_len,
                actual: resp.len(),
            });
        }
        Ok(resp)
    }
}

impl EcProxy for UsbProxy {
    fn dock_type(&self) -> Result<u8, TransportError> {
        let resp = self.command(&[EC_HID_CMD_GET_DOCK_TYPE], 1)?;
        Ok(resp[0])
    }

    fn dock_sku(&self) -> Result<u8, TransportError> {
        let resp = self.command(&[EC_HID_CMD_GET_DOCK_INFO], DOCK_INFO_RESP_LEN)?;
        Ok(resp[DOCK_INFO_SKU_OFFSET])
    }

    #[instrument(skip(self))]
    fn pd_version(&self, subtype: u8, instance: u8) -> Result<u32, TransportError> {
        let request = [
            EC_HID_CMD_GET_DOCK_DATA,
            DevType::Pd as u8,
            subtype,
            instance,
        ];
        let resp = self.command(&request, 4)?;
        // The version field is returned exactly as stored in the dock data
        // block; host-order conversion happens at the device layer.
        Ok(LittleEndian::read_u32(&resp))
    }

    #[instrument(skip(self, data), fields(len = data.len()))]
    fn hid_write(&self, data: &[u8]) -> Result<(), TransportError> {
        let _guard = self.io_lock.lock().unwrap();
        self.raw_write(data)
    }
}
