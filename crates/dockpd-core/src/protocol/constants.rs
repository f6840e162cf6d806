//! Wire constants for the hub EC channel.
//!
//! The embedded controller multiplexes every sub-device of the dock behind
//! one USB HID channel; these are the host-command bytes and transfer sizes
//! it accepts.

// ============================================================================
// Device Identification
// ============================================================================

/// Dock hub USB Vendor ID.
pub const DOCK_VENDOR_ID: u16 = 0x413C;

/// Dock hub USB Product ID (EC endpoint).
pub const DOCK_PRODUCT_ID: u16 = 0xB06E;

/// Update protocol tag declared by every PD device.
pub const PROTOCOL_ID: &str = "com.dockpd.ec";

/// Vendor identity tag declared by every PD device.
pub const VENDOR_ID_TAG: &str = "USB:0x413C";

/// Scope under which composite instance identifiers are built.
pub const INSTANCE_ID_SCOPE: &str = "EC";

// ============================================================================
// EC USB HID host commands
// ============================================================================

/// Stage a dock package.
pub const EC_HID_CMD_SET_DOCK_PKG: u8 = 0x01;

/// Read the dock info block (module map, SKU).
pub const EC_HID_CMD_GET_DOCK_INFO: u8 = 0x02;

/// Read the dock data block (per-device firmware versions).
pub const EC_HID_CMD_GET_DOCK_DATA: u8 = 0x03;

/// Read the dock base type byte.
pub const EC_HID_CMD_GET_DOCK_TYPE: u8 = 0x05;

/// Write a firmware data page.
pub const EC_HID_CMD_WRITE_DATA: u8 = 0x40;

/// Command extension selecting the firmware-update path.
pub const EC_HID_EXT_FW_UPDATE: u8 = 0x80;

/// Sub-command opening a firmware-update package.
pub const EC_HID_SUBCMD_FW_UPDATE: u8 = 0x55;

// ============================================================================
// Transfer sizes
// ============================================================================

/// Max payload bytes the EC accepts per HID data-page write.
pub const EC_HID_DATA_PAGE_SZ: usize = 180;

/// Byte offset of the SKU field inside the dock info block.
pub const DOCK_INFO_SKU_OFFSET: usize = 1;

/// Length of the dock info block read back from the EC.
pub const DOCK_INFO_RESP_LEN: usize = 64;
