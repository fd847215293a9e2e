use super::util;
use crate::config::ProbeConfig;
use crate::cpuid::CpuIdResult;
use crate::errors::ProbeResult;
use crate::source::HostSource;

/// Targets without a dedicated source: CPUID plus the runtime's own view.
#[derive(Debug, Clone, Default)]
pub struct NativeSource {
    #[allow(dead_code)]
    config: ProbeConfig,
}

impl NativeSource {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }
}

impl HostSource for NativeSource {
    fn cpuid(&self, leaf: u32) -> ProbeResult<CpuIdResult> {
        util::native_cpuid(leaf)
    }

    fn online_cpus(&self) -> ProbeResult<u32> {
        util::runtime_logical_cpus()
    }

    fn runtime_logical_cpus(&self) -> ProbeResult<u32> {
        util::runtime_logical_cpus()
    }

    fn runtime_physical_cpus(&self) -> ProbeResult<u32> {
        util::runtime_physical_cpus()
    }

    fn physical_memory(&self) -> ProbeResult<i64> {
        util::sysinfo_total_memory()
    }
}
