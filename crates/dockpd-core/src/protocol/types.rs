//! Sub-device and dock identity registries.

use std::fmt;

/// Addressable sub-device classes behind the hub EC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DevType {
    MainEc = 0x00,
    Pd = 0x01,
    Usbhub = 0x02,
    Mst = 0x03,
    Tbt = 0x04,
    Qi = 0x05,
    DpMux = 0x06,
    Lan = 0x07,
    Fan = 0x08,
    Rmm = 0x09,
    Wtpd = 0x0a,
}

impl fmt::Display for DevType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DevType::MainEc => write!(f, "EC"),
            DevType::Pd => write!(f, "PD"),
            DevType::Usbhub => write!(f, "USB Hub"),
            DevType::Mst => write!(f, "MST"),
            DevType::Tbt => write!(f, "TBT"),
            DevType::Qi => write!(f, "Qi"),
            DevType::DpMux => write!(f, "DP Mux"),
            DevType::Lan => write!(f, "LAN"),
            DevType::Fan => write!(f, "Fan"),
            DevType::Rmm => write!(f, "RMM"),
            DevType::Wtpd => write!(f, "WT PD"),
        }
    }
}

/// PD controller subtype: TI part.
pub const PD_SUBTYPE_TI: u8 = 0x00;

/// TI PD instances, by upstream-facing dock port.
pub const PD_TI_INSTANCE_UP5: u8 = 0x00;
pub const PD_TI_INSTANCE_UP15: u8 = 0x01;
pub const PD_TI_INSTANCE_UP17: u8 = 0x02;

/// Dock base type reported by the EC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DockType {
    Unknown = 0x00,
    Dock = 0x07,
}

impl DockType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(DockType::Unknown),
            0x07 => Some(DockType::Dock),
            _ => None,
        }
    }
}

/// Dock SKU reported by the EC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DockSku {
    DpAlt = 0x01,
    Tbt4 = 0x02,
    Tbt5 = 0x03,
}

impl DockSku {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(DockSku::DpAlt),
            0x02 => Some(DockSku::Tbt4),
            0x03 => Some(DockSku::Tbt5),
            _ => None,
        }
    }
}

/// Render the display name for a sub-device position.
///
/// Known TI PD instances carry the dock port name; anything else falls back
/// to an indexed name so the result is total over construction parameters.
pub fn device_name(dev_type: DevType, subtype: u8, instance: u8) -> String {
    if dev_type == DevType::Pd && subtype == PD_SUBTYPE_TI {
        match instance {
            PD_TI_INSTANCE_UP5 => return "PD UP5".to_string(),
            PD_TI_INSTANCE_UP15 => return "PD UP15".to_string(),
            PD_TI_INSTANCE_UP17 => return "PD UP17".to_string(),
            _ => {}
        }
    }
    format!("{dev_type} {subtype}.{instance}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_pd_port_names() {
        assert_eq!(device_name(DevType::Pd, PD_SUBTYPE_TI, 0), "PD UP5");
        assert_eq!(device_name(DevType::Pd, PD_SUBTYPE_TI, 1), "PD UP15");
        assert_eq!(device_name(DevType::Pd, PD_SUBTYPE_TI, 2), "PD UP17");
    }

    #[test]
    fn test_unknown_position_gets_indexed_name() {
        assert_eq!(device_name(DevType::Pd, PD_SUBTYPE_TI, 9), "PD 0.9");
        assert_eq!(device_name(DevType::Pd, 3, 0), "PD 3.0");
    }

    #[test]
    fn test_dock_registries() {
        assert_eq!(DockType::from_u8(0x07), Some(DockType::Dock));
        assert_eq!(DockType::from_u8(0xEE), None);
        assert_eq!(DockSku::from_u8(0x02), Some(DockSku::Tbt4));
        assert_eq!(DockSku::from_u8(0x00), None);
    }
}
