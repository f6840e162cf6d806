//! dockpd-core: firmware update driver for dock hub PD sub-devices.
//!
//! The hub's embedded controller (EC) fronts every sub-device behind one
//! shared USB channel. This crate models a single power-delivery (PD)
//! controller behind that channel and drives its firmware update.
//!
//! # Architecture
//!
//! The crate is organized into layers:
//!
//! - **Protocol**: EC command constants, identity registries, the
//!   firmware-update package header
//! - **Transport**: hub proxy abstraction (nusb, mock)
//! - **Payload**: firmware artifact and fixed-page chunking
//! - **Update**: the detach/write/attach/reload phase sequence
//! - **Events**: observer pattern for UI decoupling
//! - **Device**: the PD device itself (setup, write path, version)
//!
//! # Example
//!
//! ```no_run
//! use dockpd_core::{PdDevice, PdFirmware, TracingObserver, UsbProxy};
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let proxy = Arc::new(UsbProxy::open()?);
//! let mut pd = PdDevice::new(proxy, 0, 0);
//! pd.setup()?;
//! println!("{}: {}", pd.name().unwrap_or("?"), pd.version());
//!
//! let firmware = PdFirmware::from_file("pd.bin")?;
//! pd.write_firmware(&firmware, &TracingObserver)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod device;
pub mod events;
pub mod instance_id;
pub mod payload;
pub mod protocol;
pub mod transport;
pub mod update;
pub mod version;

// Re-exports for convenience
pub use config::ProxyConfig;
pub use device::{DeviceCaps, DeviceFlags, PdDevice, PdError};
pub use events::{
    LogLevel, NullObserver, RecordingObserver, TracingObserver, UpdateEvent, UpdateObserver,
};
pub use instance_id::{InstanceIdBuilder, InstanceIdError};
pub use payload::{Chunk, ChunkArray, ChunkError, FirmwareError, PdFirmware};
pub use protocol::{DevType, DockSku, DockType, FwUpdatePkg, HeaderError};
pub use transport::{EcProxy, MockProxy, SharedProxy, TransportError, UsbProxy};
pub use update::{PhaseStatus, UpdatePhase, UpdatePhases};
pub use version::{VersionFormat, from_u32_hex};
