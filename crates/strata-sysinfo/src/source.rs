use crate::cpuid::CpuIdResult;
use crate::cpuinfo::CpuInfoFile;
use crate::errors::{ProbeError, ProbeResult};
use crate::gpu::PropertyValue;
use crate::types::{FreqKind, GpuInfo, ProcessorTopology, SystemProcessorInfo};

/// Raw access to the host's hardware information sources.
///
/// Each method maps to one OS facility. A platform implements only what it
/// has; everything else stays at the default `Unavailable`, and the probe
/// chains skip it. Implementations do no fallback of their own.
pub trait HostSource: Send + Sync {
    /// Processor relationship records (Windows `GetLogicalProcessorInformation`).
    fn processor_topology(&self) -> ProbeResult<ProcessorTopology> {
        Err(ProbeError::Unavailable)
    }

    /// Windows `GetSystemInfo`.
    fn system_processor_info(&self) -> ProbeResult<SystemProcessorInfo> {
        Err(ProbeError::Unavailable)
    }

    /// Integer kernel parameter by name (`sysctlbyname`).
    fn named_u64(&self, _name: &str) -> ProbeResult<u64> {
        Err(ProbeError::Unavailable)
    }

    /// String kernel parameter by name (`sysctlbyname`).
    fn named_string(&self, _name: &str) -> ProbeResult<String> {
        Err(ProbeError::Unavailable)
    }

    /// `~MHz` of the first processor from the hardware registry.
    fn registry_cpu_mhz(&self) -> ProbeResult<u32> {
        Err(ProbeError::Unavailable)
    }

    /// Parsed per-processor info file.
    fn cpuinfo(&self) -> ProbeResult<CpuInfoFile> {
        Err(ProbeError::Unavailable)
    }

    /// Frequency of the first processor in kHz from the cpufreq interface.
    fn cpu_freq_khz(&self, _kind: FreqKind) -> ProbeResult<u64> {
        Err(ProbeError::Unavailable)
    }

    /// Execute CPUID for `leaf` (subleaf 0).
    fn cpuid(&self, _leaf: u32) -> ProbeResult<CpuIdResult> {
        Err(ProbeError::Unavailable)
    }

    /// Processors in this process's affinity mask.
    fn process_affinity_cpus(&self) -> ProbeResult<u32> {
        Err(ProbeError::Unavailable)
    }

    /// Processors currently online.
    fn online_cpus(&self) -> ProbeResult<u32> {
        Err(ProbeError::Unavailable)
    }

    /// Logical processors as seen by the language runtime.
    fn runtime_logical_cpus(&self) -> ProbeResult<u32> {
        Err(ProbeError::Unavailable)
    }

    /// Physical cores as seen by the language runtime.
    fn runtime_physical_cpus(&self) -> ProbeResult<u32> {
        Err(ProbeError::Unavailable)
    }

    /// Total installed physical memory in bytes.
    fn physical_memory(&self) -> ProbeResult<i64> {
        Err(ProbeError::Unavailable)
    }

    /// Product name from firmware tables (DMI, device tree).
    fn firmware_model(&self) -> ProbeResult<String> {
        Err(ProbeError::Unavailable)
    }

    /// Identification record of the default adapter through the graphics
    /// driver interface. Implementations load and release the driver themselves.
    fn default_adapter(&self) -> ProbeResult<GpuInfo> {
        Err(ProbeError::Unavailable)
    }

    /// Property of the main display's service node, searched recursively
    /// through its parents.
    fn display_property(&self, _name: &str) -> ProbeResult<PropertyValue> {
        Err(ProbeError::Unavailable)
    }

    /// Human-readable name of the default display device.
    fn display_device_name(&self) -> ProbeResult<String> {
        Err(ProbeError::Unavailable)
    }
}
