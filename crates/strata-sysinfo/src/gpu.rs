use crate::types::GpuInfo;

pub const VENDOR_NVIDIA: u32 = 0x10DE;
pub const VENDOR_AMD: u32 = 0x1002;
pub const VENDOR_INTEL: u32 = 0x8086;

fn hiword(v: u32) -> u32 {
    v >> 16
}

fn loword(v: u32) -> u32 {
    v & 0xFFFF
}

/// `product.version.subversion.build` from the two packed driver version words.
pub fn format_driver_version(high: u32, low: u32) -> String {
    format!(
        "{}.{}.{}.{}",
        hiword(high),
        loword(high),
        hiword(low),
        loword(low)
    )
}

/// Vulkan `driverVersion`. NVIDIA packs four fields (10.8.8.6 bits); everyone
/// else follows the API version layout.
pub fn format_vulkan_driver_version(vendor_id: u32, v: u32) -> String {
    if vendor_id == VENDOR_NVIDIA {
        format!(
            "{}.{}.{}.{}",
            (v >> 22) & 0x3FF,
            (v >> 14) & 0xFF,
            (v >> 6) & 0xFF,
            v & 0x3F
        )
    } else {
        format!("{}.{}.{}", v >> 22, (v >> 12) & 0x3FF, v & 0xFFF)
    }
}

/// A value read from the display property registry. Properties may be stored
/// as numbers, strings, or raw bytes, depending on the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Number(i64),
    Text(String),
    Data(Vec<u8>),
}

impl PropertyValue {
    /// Numbers as-is; 4-byte data blobs as a native-endian u32.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            PropertyValue::Number(n) => u32::try_from(*n).ok(),
            PropertyValue::Data(bytes) => {
                let arr: [u8; 4] = bytes.as_slice().try_into().ok()?;
                Some(u32::from_ne_bytes(arr))
            }
            PropertyValue::Text(_) => None,
        }
    }

    /// Strings as-is; data blobs as text up to the first NUL.
    pub fn as_text(&self) -> Option<String> {
        match self {
            PropertyValue::Text(s) => Some(s.clone()),
            PropertyValue::Data(bytes) => {
                let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
                Some(String::from_utf8_lossy(&bytes[..end]).into_owned())
            }
            PropertyValue::Number(_) => None,
        }
    }
}

/// Display registry lookups plus the device name, collected into a
/// [`GpuInfo`]. Fields that were not found keep their defaults.
#[derive(Debug, Default)]
pub struct RegistryGpu {
    pub vendor_id: Option<u32>,
    pub device_id: Option<u32>,
    pub model: Option<String>,
    pub device_name: Option<String>,
}

impl RegistryGpu {
    pub fn found_any(&self) -> bool {
        self.vendor_id.is_some()
            || self.device_id.is_some()
            || self.model.is_some()
            || self.device_name.is_some()
    }

    /// Model and device name stand in for each other when one is missing.
    pub fn into_info(self) -> GpuInfo {
        let description = self
            .model
            .or_else(|| self.device_name.clone())
            .unwrap_or_default();
        GpuInfo {
            device_name: self.device_name.unwrap_or_else(|| description.clone()),
            description,
            vendor_id: self.vendor_id.unwrap_or(0),
            device_id: self.device_id.unwrap_or(0),
            driver: String::new(),
            driver_version: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_version_is_hi_lo_hi_lo() {
        // 31.0.15.3699 as stored by d3d9
        let high = 31 << 16;
        let low = (15 << 16) | 3699;
        assert_eq!(format_driver_version(high, low), "31.0.15.3699");
        assert_eq!(format_driver_version(0x0008_000F, 0x000B_0D43), "8.15.11.3395");
    }

    #[test]
    fn vulkan_versions_per_vendor() {
        // NVIDIA 535.104.5.0
        let nv = (535 << 22) | (104 << 14) | (5 << 6);
        assert_eq!(format_vulkan_driver_version(VENDOR_NVIDIA, nv), "535.104.5.0");
        // Mesa 23.2.1
        let mesa = (23 << 22) | (2 << 12) | 1;
        assert_eq!(format_vulkan_driver_version(VENDOR_AMD, mesa), "23.2.1");
    }

    #[test]
    fn numeric_and_data_properties_coerce() {
        assert_eq!(PropertyValue::Number(0x10DE).as_u32(), Some(0x10DE));
        assert_eq!(PropertyValue::Number(-1).as_u32(), None);
        let data = PropertyValue::Data(0x1002u32.to_ne_bytes().to_vec());
        assert_eq!(data.as_u32(), Some(0x1002));
        assert_eq!(PropertyValue::Data(vec![1, 2]).as_u32(), None);
        assert_eq!(PropertyValue::Text("x".into()).as_u32(), None);
    }

    #[test]
    fn data_properties_read_as_text() {
        let v = PropertyValue::Data(b"AMD Radeon Pro 560\0".to_vec());
        assert_eq!(v.as_text().as_deref(), Some("AMD Radeon Pro 560"));
        assert_eq!(PropertyValue::Number(3).as_text(), None);
    }

    #[test]
    fn registry_fields_default_when_missing() {
        let reg = RegistryGpu {
            vendor_id: Some(VENDOR_INTEL),
            ..Default::default()
        };
        assert!(reg.found_any());
        let info = reg.into_info();
        assert_eq!(info.vendor_id, VENDOR_INTEL);
        assert_eq!(info.device_id, 0);
        assert!(info.description.is_empty());
        assert!(!RegistryGpu::default().found_any());
    }

    #[test]
    fn device_name_alone_identifies_the_adapter() {
        let reg = RegistryGpu {
            device_name: Some("Apple M2".into()),
            ..Default::default()
        };
        assert!(reg.found_any());
        let info = reg.into_info();
        assert_eq!(info.device_name, "Apple M2");
        assert_eq!(info.description, "Apple M2");
        assert_eq!(info.vendor_id, 0);
    }
}
