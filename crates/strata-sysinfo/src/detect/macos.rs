use std::ffi::CString;
use std::io;
use std::ptr;

use super::util;
use crate::config::ProbeConfig;
use crate::cpuid::CpuIdResult;
use crate::errors::{ProbeError, ProbeResult};
#[cfg(target_os = "macos")]
use crate::gpu::PropertyValue;
use crate::source::HostSource;

/// sysctl, CPUID on Intel Macs, and the IOKit display registry.
#[derive(Debug, Clone, Default)]
pub struct NativeSource {
    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    config: ProbeConfig,
}

impl NativeSource {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }
}

/// `sysctlbyname` into `buf`; returns the number of bytes written. With an
/// empty buffer only the required size is reported.
fn sysctl_raw(name: &str, buf: &mut [u8]) -> ProbeResult<usize> {
    let cname = CString::new(name).map_err(|e| ProbeError::failed("sysctl", e))?;
    let mut len: libc::size_t = buf.len();
    let out = if buf.is_empty() {
        ptr::null_mut()
    } else {
        buf.as_mut_ptr() as *mut libc::c_void
    };
    let rc = unsafe { libc::sysctlbyname(cname.as_ptr(), out, &mut len, ptr::null_mut(), 0) };
    if rc != 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ENOENT) {
            return Err(ProbeError::Unavailable);
        }
        return Err(ProbeError::failed("sysctl", format!("{name}: {err}")));
    }
    Ok(len)
}

impl HostSource for NativeSource {
    fn named_u64(&self, name: &str) -> ProbeResult<u64> {
        // 32-bit and 64-bit integers share this entry point
        let mut buf = [0u8; 8];
        match sysctl_raw(name, &mut buf)? {
            4 => Ok(u64::from(u32::from_ne_bytes([buf[0], buf[1], buf[2], buf[3]]))),
            8 => Ok(u64::from_ne_bytes(buf)),
            n => Err(ProbeError::failed(
                "sysctl",
                format!("{name}: unexpected {n}-byte value"),
            )),
        }
    }

    fn named_string(&self, name: &str) -> ProbeResult<String> {
        let size = sysctl_raw(name, &mut [])?;
        let mut buf = vec![0u8; size];
        let len = sysctl_raw(name, &mut buf)?;
        buf.truncate(len);
        while buf.last() == Some(&0) {
            buf.pop();
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    fn cpuid(&self, leaf: u32) -> ProbeResult<CpuIdResult> {
        util::native_cpuid(leaf)
    }

    fn runtime_logical_cpus(&self) -> ProbeResult<u32> {
        util::runtime_logical_cpus()
    }

    fn runtime_physical_cpus(&self) -> ProbeResult<u32> {
        util::runtime_physical_cpus()
    }

    fn physical_memory(&self) -> ProbeResult<i64> {
        let bytes = self.named_u64("hw.memsize")?;
        i64::try_from(bytes).map_err(|_| ProbeError::failed("sysctl", "hw.memsize out of range"))
    }

    #[cfg(target_os = "macos")]
    fn display_property(&self, name: &str) -> ProbeResult<PropertyValue> {
        if self.config.is_disabled("iokit") {
            return Err(ProbeError::Unavailable);
        }
        let service = super::iokit::main_display_service()?;
        super::iokit::search_property(service, name)
    }

    #[cfg(target_os = "macos")]
    fn display_device_name(&self) -> ProbeResult<String> {
        metal::Device::system_default()
            .map(|d| d.name().to_string())
            .ok_or(ProbeError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_integer_and_string_parameters() {
        let src = NativeSource::default();
        assert!(src.named_u64("hw.ncpu").unwrap() >= 1);
        assert!(src.named_u64("hw.memsize").unwrap() > 0);
        assert!(!src.named_string("hw.model").unwrap().is_empty());
    }

    #[test]
    fn unknown_parameter_is_unavailable() {
        let src = NativeSource::default();
        assert_eq!(
            src.named_u64("hw.strata_does_not_exist"),
            Err(ProbeError::Unavailable)
        );
    }
}
