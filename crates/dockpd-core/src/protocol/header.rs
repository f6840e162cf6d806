//! Firmware-update package header for the EC channel.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;
use thiserror::Error;

use super::constants::{EC_HID_CMD_WRITE_DATA, EC_HID_EXT_FW_UPDATE, EC_HID_SUBCMD_FW_UPDATE};
use super::types::DevType;

#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("Buffer too small: expected {expected}, got {actual}")]
    BufferTooSmall { expected: usize, actual: usize },
    #[error("Unexpected command bytes: cmd=0x{cmd:02X} ext=0x{ext:02X}")]
    UnexpectedCommand { cmd: u8, ext: u8 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Firmware-update package header (13 bytes).
///
/// Prefixes a raw firmware payload before it is split into transport pages.
/// The EC routes the payload to the sub-device named by `(dev_type,
/// identifier)` and accumulates pages until `fw_sz` bytes have arrived.
///
/// Layout, multi-byte fields big-endian:
///
/// | cmd | ext | pkg_sz: u32 | sub_cmd | dev_type | identifier | fw_sz: u32 |
///
/// `pkg_sz` covers the package body: the sub-command byte through the end of
/// the firmware payload, i.e. `7 + fw_sz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FwUpdatePkg {
    pub dev_type: u8,
    pub identifier: u8,
    pub fw_sz: u32,
}

impl FwUpdatePkg {
    pub const SIZE: usize = 13;

    /// Package body bytes preceding the payload (sub_cmd + dev_type +
    /// identifier + fw_sz field).
    const BODY_FIXED: u32 = 7;

    pub fn new(dev_type: DevType, identifier: u8, fw_sz: u32) -> Self {
        Self {
            dev_type: dev_type as u8,
            identifier,
            fw_sz,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.push(EC_HID_CMD_WRITE_DATA);
        buf.push(EC_HID_EXT_FW_UPDATE);
        buf.write_u32::<BigEndian>(Self::BODY_FIXED + self.fw_sz).unwrap();
        buf.push(EC_HID_SUBCMD_FW_UPDATE);
        buf.push(self.dev_type);
        buf.push(self.identifier);
        buf.write_u32::<BigEndian>(self.fw_sz).unwrap();
        buf
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, HeaderError> {
        if data.len() < Self::SIZE {
            return Err(HeaderError::BufferTooSmall {
                expected: Self::SIZE,
                actual: data.len(),
            });
        }
        let mut cursor = Cursor::new(data);
        let cmd = cursor.read_u8()?;
        let ext = cursor.read_u8()?;
        if cmd != EC_HID_CMD_WRITE_DATA || ext != EC_HID_EXT_FW_UPDATE {
            return Err(HeaderError::UnexpectedCommand { cmd, ext });
        }
        let _pkg_sz = cursor.read_u32::<BigEndian>()?;
        let _sub_cmd = cursor.read_u8()?;
        Ok(Self {
            dev_type: cursor.read_u8()?,
            identifier: cursor.read_u8()?,
            fw_sz: cursor.read_u32::<BigEndian>()?,
        })
    }

    /// Wrap a raw firmware payload: header followed by the verbatim bytes.
    pub fn wrap(fw: &[u8], dev_type: DevType, identifier: u8) -> Vec<u8> {
        let pkg = Self::new(dev_type, identifier, fw.len() as u32);
        let mut buf = pkg.to_bytes();
        buf.extend_from_slice(fw);
        buf
    }
}
