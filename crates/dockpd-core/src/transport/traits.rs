//! Hub proxy abstraction.
//!
//! Every PD device is bound to one proxy: the hub-level device that owns the
//! actual transport channel. The trait enables a production implementation
//! over nusb and a mock implementation for unit testing.

use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Device not found: VID={vid:04X} PID={pid:04X}")]
    DeviceNotFound { vid: u16, pid: u16 },

    #[error("Failed to open device: {0}")]
    OpenFailed(String),

    #[error("Failed to claim interface {interface}: {message}")]
    ClaimInterfaceFailed { interface: u8, message: String },

    #[error("Endpoint not found: type={ep_type}, direction={direction}")]
    EndpointNotFound { ep_type: String, direction: String },

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Short response: expected {expected} bytes, got {actual}")]
    ShortResponse { expected: usize, actual: usize },

    #[error("Device disconnected")]
    Disconnected,

    #[error("Timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The hub EC proxy every PD device communicates through.
///
/// The channel behind a proxy is shared by every sub-device bound to it, so
/// each call requires exclusive access to the channel for its duration;
/// implementations guard their channel with a lock.
pub trait EcProxy: Send + Sync {
    /// Dock base type byte, a pure read.
    fn dock_type(&self) -> Result<u8, TransportError>;

    /// Dock SKU byte, a pure read.
    fn dock_sku(&self) -> Result<u8, TransportError>;

    /// Firmware version of the PD at `(subtype, instance)`, exactly as it
    /// appears in the hub's data block (big-endian byte order); callers
    /// convert to host representation.
    fn pd_version(&self, subtype: u8, instance: u8) -> Result<u32, TransportError>;

    /// Write one transport unit, blocking until the channel accepts it.
    fn hid_write(&self, data: &[u8]) -> Result<(), TransportError>;
}

/// Non-owning handle to a shared proxy, handed to each PD device at
/// construction.
pub type SharedProxy = Arc<dyn EcProxy>;
