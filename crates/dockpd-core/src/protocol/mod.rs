//! EC channel protocol: constants, identity registries, wire header.

pub mod constants;
pub mod header;
pub mod types;

pub use header::{FwUpdatePkg, HeaderError};
pub use types::{DevType, DockSku, DockType, device_name};
