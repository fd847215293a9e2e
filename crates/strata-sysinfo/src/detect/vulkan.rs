use std::ffi::{CStr, CString};

use anyhow::{anyhow, Context, Result};
use ash::{vk, Entry, Instance, LoadingError};
use tracing::trace;

use crate::errors::{ProbeError, ProbeResult};
use crate::gpu;
use crate::types::GpuInfo;

/// Destroys the instance on every exit path.
struct InstanceGuard(Instance);

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        unsafe { self.0.destroy_instance(None) };
    }
}

/// Identification of the first hardware adapter the Vulkan loader reports.
/// CPU adapters (llvmpipe, SwiftShader) are used only when nothing else exists.
pub fn default_adapter() -> ProbeResult<GpuInfo> {
    adapter_from(unsafe { Entry::load() })
}

/// A loader that cannot be opened means Vulkan is not installed here.
fn adapter_from(loaded: std::result::Result<Entry, LoadingError>) -> ProbeResult<GpuInfo> {
    let entry = loaded.map_err(|e| {
        trace!(error = %e, "vulkan loader not found");
        ProbeError::Unavailable
    })?;
    Ok(first_adapter(&entry)?)
}

fn first_adapter(entry: &Entry) -> Result<GpuInfo> {
    let app = CString::new("strata-sysinfo")?;

    let app_info = vk::ApplicationInfo {
        p_application_name: app.as_ptr(),
        api_version: vk::API_VERSION_1_0,
        ..Default::default()
    };
    let ci = vk::InstanceCreateInfo {
        p_application_info: &app_info,
        ..Default::default()
    };
    let instance = InstanceGuard(
        unsafe { entry.create_instance(&ci, None) }.context("vkCreateInstance")?,
    );
    let devices =
        unsafe { instance.0.enumerate_physical_devices() }.context("enumerate physical devices")?;

    let props = devices
        .iter()
        .map(|pd| unsafe { instance.0.get_physical_device_properties(*pd) })
        .min_by_key(|p| p.device_type == vk::PhysicalDeviceType::CPU)
        .ok_or_else(|| anyhow!("no vulkan physical devices"))?;

    let name = unsafe { CStr::from_ptr(props.device_name.as_ptr()) }
        .to_string_lossy()
        .into_owned();

    Ok(GpuInfo {
        device_name: name.clone(),
        description: name,
        vendor_id: props.vendor_id,
        device_id: props.device_id,
        driver: format!(
            "Vulkan {}.{}.{}",
            vk::api_version_major(props.api_version),
            vk::api_version_minor(props.api_version),
            vk::api_version_patch(props.api_version)
        ),
        driver_version: gpu::format_vulkan_driver_version(props.vendor_id, props.driver_version),
    })
}
