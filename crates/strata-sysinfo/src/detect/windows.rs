#![allow(non_snake_case, non_camel_case_types)]

use std::ffi::CStr;
use std::mem;
use std::ptr;

use anyhow::{anyhow, Context, Result};
use libloading::{Library, Symbol};
use tracing::{debug, trace};
use windows_sys::Win32::Foundation::{GetLastError, ERROR_INSUFFICIENT_BUFFER, ERROR_SUCCESS};
use windows_sys::Win32::System::Registry::{
    RegCloseKey, RegOpenKeyExW, RegQueryValueExW, HKEY, HKEY_LOCAL_MACHINE, KEY_QUERY_VALUE,
};
use windows_sys::Win32::System::SystemInformation::{
    GetLogicalProcessorInformation, GetSystemInfo, GlobalMemoryStatusEx, RelationCache,
    RelationProcessorCore, MEMORYSTATUSEX, SYSTEM_INFO, SYSTEM_LOGICAL_PROCESSOR_INFORMATION,
};
use windows_sys::Win32::System::Threading::{GetCurrentProcess, GetProcessAffinityMask};

use super::util;
use crate::config::ProbeConfig;
use crate::cpuid::CpuIdResult;
use crate::errors::{ProbeError, ProbeResult};
use crate::gpu;
use crate::source::HostSource;
use crate::types::{CacheLevels, GpuInfo, ProcessorTopology, SystemProcessorInfo};

const CPU0_KEY: &str = r"HARDWARE\DESCRIPTION\System\CentralProcessor\0";

/// Win32 system information, the hardware registry, CPUID and d3d9/Vulkan.
#[derive(Debug, Clone, Default)]
pub struct NativeSource {
    config: ProbeConfig,
}

impl NativeSource {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Closes the registry key on drop.
struct RegKey(HKEY);

impl Drop for RegKey {
    fn drop(&mut self) {
        unsafe { RegCloseKey(self.0) };
    }
}

fn logical_processor_information() -> ProbeResult<Vec<SYSTEM_LOGICAL_PROCESSOR_INFORMATION>> {
    let entry = mem::size_of::<SYSTEM_LOGICAL_PROCESSOR_INFORMATION>();
    let mut len: u32 = 0;
    let mut buf: Vec<SYSTEM_LOGICAL_PROCESSOR_INFORMATION> = Vec::new();
    // The required size can change between calls, so retry until it fits.
    loop {
        let ok = unsafe { GetLogicalProcessorInformation(buf.as_mut_ptr(), &mut len) };
        if ok != 0 {
            buf.truncate(len as usize / entry);
            return Ok(buf);
        }
        let err = unsafe { GetLastError() };
        if err != ERROR_INSUFFICIENT_BUFFER {
            return Err(ProbeError::failed(
                "topology",
                format!("GetLogicalProcessorInformation error {err}"),
            ));
        }
        let count = (len as usize).div_ceil(entry);
        buf = vec![unsafe { mem::zeroed() }; count];
    }
}

impl HostSource for NativeSource {
    fn processor_topology(&self) -> ProbeResult<ProcessorTopology> {
        let mut topo = ProcessorTopology::default();
        let mut caches = CacheLevels::default();
        for rec in logical_processor_information()? {
            if rec.Relationship == RelationProcessorCore {
                topo.cores += 1;
                topo.logical += rec.ProcessorMask.count_ones();
            } else if rec.Relationship == RelationCache {
                let cache = unsafe { rec.Anonymous.Cache };
                let size = u64::from(cache.Size);
                match cache.Level {
                    2 => caches.l2 = caches.l2.max(size),
                    3 => caches.l3 = caches.l3.max(size),
                    _ => {}
                }
            }
        }
        topo.caches = caches;
        Ok(topo)
    }

    fn system_processor_info(&self) -> ProbeResult<SystemProcessorInfo> {
        let mut si: SYSTEM_INFO = unsafe { mem::zeroed() };
        unsafe { GetSystemInfo(&mut si) };
        Ok(SystemProcessorInfo {
            logical: si.dwNumberOfProcessors,
            level: si.wProcessorLevel,
            revision: si.wProcessorRevision,
        })
    }

    fn registry_cpu_mhz(&self) -> ProbeResult<u32> {
        let path = wide(CPU0_KEY);
        let mut hkey: HKEY = ptr::null_mut();
        let rc = unsafe {
            RegOpenKeyExW(HKEY_LOCAL_MACHINE, path.as_ptr(), 0, KEY_QUERY_VALUE, &mut hkey)
        };
        if rc != ERROR_SUCCESS {
            return Err(ProbeError::failed(
                "registry",
                format!(r"open HKLM\{CPU0_KEY}: error {rc}"),
            ));
        }
        let key = RegKey(hkey);

        let name = wide("~MHz");
        let mut data: u32 = 0;
        let mut len = mem::size_of::<u32>() as u32;
        let rc = unsafe {
            RegQueryValueExW(
                key.0,
                name.as_ptr(),
                ptr::null(),
                ptr::null_mut(),
                &mut data as *mut u32 as *mut u8,
                &mut len,
            )
        };
        if rc != ERROR_SUCCESS {
            return Err(ProbeError::failed(
                "registry",
                format!(r"query HKLM\{CPU0_KEY}\~MHz: error {rc}"),
            ));
        }
        Ok(data)
    }

    fn cpuid(&self, leaf: u32) -> ProbeResult<CpuIdResult> {
        util::native_cpuid(leaf)
    }

    fn process_affinity_cpus(&self) -> ProbeResult<u32> {
        let mut process_mask: usize = 0;
        let mut system_mask: usize = 0;
        let ok = unsafe {
            GetProcessAffinityMask(GetCurrentProcess(), &mut process_mask, &mut system_mask)
        };
        if ok == 0 {
            let err = unsafe { GetLastError() };
            return Err(ProbeError::failed(
                "affinity",
                format!("GetProcessAffinityMask error {err}"),
            ));
        }
        Ok(process_mask.count_ones())
    }

    fn runtime_logical_cpus(&self) -> ProbeResult<u32> {
        util::runtime_logical_cpus()
    }

    fn runtime_physical_cpus(&self) -> ProbeResult<u32> {
        util::runtime_physical_cpus()
    }

    fn physical_memory(&self) -> ProbeResult<i64> {
        let mut status: MEMORYSTATUSEX = unsafe { mem::zeroed() };
        status.dwLength = mem::size_of::<MEMORYSTATUSEX>() as u32;
        if unsafe { GlobalMemoryStatusEx(&mut status) } == 0 {
            let err = unsafe { GetLastError() };
            return Err(ProbeError::failed(
                "memory",
                format!("GlobalMemoryStatusEx error {err}"),
            ));
        }
        i64::try_from(status.ullTotalPhys)
            .map_err(|_| ProbeError::failed("memory", "ullTotalPhys out of range"))
    }

    fn default_adapter(&self) -> ProbeResult<GpuInfo> {
        if !self.config.is_disabled("d3d9") {
            match open_library("d3d9.dll").and_then(|lib| Ok(d3d9_default_adapter(&lib)?)) {
                Ok(info) => return Ok(info),
                Err(ProbeError::Unavailable) => trace!("d3d9.dll not present, trying vulkan"),
                Err(e) => debug!(error = %e, "d3d9 adapter query failed, trying vulkan"),
            }
        }
        if self.config.is_disabled("vulkan") {
            return Err(ProbeError::Unavailable);
        }
        super::vulkan::default_adapter()
    }
}

// --- d3d9 (dlopen + COM vtable) ---

const D3D_SDK_VERSION: u32 = 32;
const D3DADAPTER_DEFAULT: u32 = 0;
const D3D_OK: i32 = 0;

#[repr(C)]
#[allow(dead_code)]
struct D3DADAPTER_IDENTIFIER9 {
    Driver: [u8; 512],
    Description: [u8; 512],
    DeviceName: [u8; 32],
    DriverVersion: i64,
    VendorId: u32,
    DeviceId: u32,
    SubSysId: u32,
    Revision: u32,
    DeviceIdentifier: [u8; 16],
    WHQLLevel: u32,
}

#[repr(C)]
struct IDirect3D9 {
    vtbl: *const IDirect3D9Vtbl,
}

// Only the slots up to GetAdapterIdentifier are declared.
#[repr(C)]
#[allow(dead_code)]
struct IDirect3D9Vtbl {
    QueryInterface: usize,
    AddRef: unsafe extern "system" fn(*mut IDirect3D9) -> u32,
    Release: unsafe extern "system" fn(*mut IDirect3D9) -> u32,
    RegisterSoftwareDevice: usize,
    GetAdapterCount: unsafe extern "system" fn(*mut IDirect3D9) -> u32,
    GetAdapterIdentifier: unsafe extern "system" fn(
        *mut IDirect3D9,
        u32,
        u32,
        *mut D3DADAPTER_IDENTIFIER9,
    ) -> i32,
}

type Direct3DCreate9 = unsafe extern "system" fn(u32) -> *mut IDirect3D9;

/// Releases the COM object on drop.
struct D3d9(*mut IDirect3D9);

impl Drop for D3d9 {
    fn drop(&mut self) {
        unsafe { ((*(*self.0).vtbl).Release)(self.0) };
    }
}

fn c_text(bytes: &[u8]) -> String {
    CStr::from_bytes_until_nul(bytes)
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned())
}

/// A library that cannot be loaded means the driver interface is absent.
fn open_library(name: &str) -> ProbeResult<Library> {
    unsafe { Library::new(name) }.map_err(|e| {
        trace!(library = name, error = %e, "library not loadable");
        ProbeError::Unavailable
    })
}

// The library outlives the COM object released inside.
fn d3d9_default_adapter(lib: &Library) -> Result<GpuInfo> {
    let mut ident: D3DADAPTER_IDENTIFIER9 = unsafe { mem::zeroed() };
    unsafe {
        let create: Symbol<Direct3DCreate9> =
            lib.get(b"Direct3DCreate9\0").context("get Direct3DCreate9")?;
        let raw = create(D3D_SDK_VERSION);
        if raw.is_null() {
            return Err(anyhow!("Direct3DCreate9 returned null"));
        }
        let d3d = D3d9(raw);
        let vtbl = &*(*d3d.0).vtbl;
        if (vtbl.GetAdapterCount)(d3d.0) == 0 {
            return Err(anyhow!("no d3d9 adapters"));
        }
        let hr = (vtbl.GetAdapterIdentifier)(d3d.0, D3DADAPTER_DEFAULT, 0, &mut ident);
        if hr != D3D_OK {
            return Err(anyhow!("GetAdapterIdentifier failed: {hr:#x}"));
        }
    }

    let high = (ident.DriverVersion >> 32) as u32;
    let low = ident.DriverVersion as u32;
    Ok(GpuInfo {
        device_name: c_text(&ident.DeviceName),
        description: c_text(&ident.Description),
        vendor_id: ident.VendorId,
        device_id: ident.DeviceId,
        driver: c_text(&ident.Driver),
        driver_version: gpu::format_driver_version(high, low),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_library_is_unavailable() {
        assert!(matches!(
            open_library("strata-no-such-driver.dll"),
            Err(ProbeError::Unavailable)
        ));
    }
}
