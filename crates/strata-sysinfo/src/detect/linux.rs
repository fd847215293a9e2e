use std::path::PathBuf;

use super::util;
use crate::config::ProbeConfig;
use crate::cpuid::CpuIdResult;
use crate::cpuinfo::CpuInfoFile;
use crate::errors::{ProbeError, ProbeResult};
use crate::source::HostSource;
use crate::types::{FreqKind, GpuInfo};

/// procfs/sysfs/sysconf, CPUID and the Vulkan loader.
#[derive(Debug, Clone, Default)]
pub struct NativeSource {
    config: ProbeConfig,
}

impl NativeSource {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    fn sysfs(&self, rel: &str) -> PathBuf {
        self.config.sysfs_root.join(rel)
    }
}

fn sysconf(name: libc::c_int) -> libc::c_long {
    unsafe { libc::sysconf(name) }
}

impl HostSource for NativeSource {
    fn cpuinfo(&self) -> ProbeResult<CpuInfoFile> {
        let path = &self.config.cpuinfo_path;
        CpuInfoFile::load(path).map_err(|e| util::read_error("cpuinfo", path, e))
    }

    fn cpu_freq_khz(&self, kind: FreqKind) -> ProbeResult<u64> {
        // cpuinfo_max_freq is the fixed hardware limit; scaling_cur_freq moves
        // with the governor.
        let file = match kind {
            FreqKind::Max => "devices/system/cpu/cpu0/cpufreq/cpuinfo_max_freq",
            FreqKind::Current => "devices/system/cpu/cpu0/cpufreq/scaling_cur_freq",
        };
        util::read_u64("sysfs", &self.sysfs(file))
    }

    fn cpuid(&self, leaf: u32) -> ProbeResult<CpuIdResult> {
        util::native_cpuid(leaf)
    }

    fn online_cpus(&self) -> ProbeResult<u32> {
        let n = sysconf(libc::_SC_NPROCESSORS_ONLN);
        if n < 1 {
            return Err(ProbeError::failed(
                "online",
                format!("sysconf(_SC_NPROCESSORS_ONLN) returned {n}"),
            ));
        }
        Ok(n as u32)
    }

    fn runtime_logical_cpus(&self) -> ProbeResult<u32> {
        util::runtime_logical_cpus()
    }

    fn runtime_physical_cpus(&self) -> ProbeResult<u32> {
        util::runtime_physical_cpus()
    }

    fn physical_memory(&self) -> ProbeResult<i64> {
        let pages = sysconf(libc::_SC_PHYS_PAGES);
        let page_size = sysconf(libc::_SC_PAGESIZE);
        if pages < 0 || page_size < 0 {
            return Err(ProbeError::failed(
                "memory",
                format!("sysconf(_SC_PHYS_PAGES) {pages}, sysconf(_SC_PAGESIZE) {page_size}"),
            ));
        }
        Ok(i64::from(pages).saturating_mul(i64::from(page_size)))
    }

    fn firmware_model(&self) -> ProbeResult<String> {
        // DMI on PCs, device tree on boards
        match util::read_trimmed("firmware", &self.sysfs("class/dmi/id/product_name")) {
            Ok(v) if !v.is_empty() => Ok(v),
            Ok(_) | Err(ProbeError::Unavailable) => {
                util::read_trimmed("firmware", &self.sysfs("firmware/devicetree/base/model"))
            }
            Err(e) => Err(e),
        }
    }

    fn default_adapter(&self) -> ProbeResult<GpuInfo> {
        if self.config.is_disabled("vulkan") {
            return Err(ProbeError::Unavailable);
        }
        super::vulkan::default_adapter()
    }
}
