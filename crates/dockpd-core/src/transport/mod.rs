//! Transport layer: the hub proxy trait plus nusb and mock implementations.

pub mod mock;
pub mod traits;
pub mod usb;

pub use mock::MockProxy;
pub use traits::{EcProxy, SharedProxy, TransportError};
pub use usb::UsbProxy;
