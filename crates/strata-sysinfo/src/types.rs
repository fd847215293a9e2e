use serde::{Deserialize, Serialize};

#[cfg(not(any(
    target_arch = "x86",
    target_arch = "x86_64",
    target_arch = "arm",
    target_arch = "aarch64"
)))]
compile_error!("strata-sysinfo: unknown target architecture");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    X86,
    X64,
    Arm,
}

impl Architecture {
    /// Architecture of the build target.
    pub const fn current() -> Self {
        #[cfg(target_arch = "x86")]
        {
            Architecture::X86
        }
        #[cfg(target_arch = "x86_64")]
        {
            Architecture::X64
        }
        #[cfg(any(target_arch = "arm", target_arch = "aarch64"))]
        {
            Architecture::Arm
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Architecture::X86 => "x86",
            Architecture::X64 => "x64",
            Architecture::Arm => "arm",
        }
    }

    /// Whether the CPUID instruction exists.
    pub fn has_cpuid(self) -> bool {
        matches!(self, Architecture::X86 | Architecture::X64)
    }

    /// Vendor reported when no identification instruction is available.
    pub fn vendor_fallback(self) -> &'static str {
        match self {
            Architecture::Arm => "ARM",
            _ => "Undefined",
        }
    }
}

/// Identification of the primary graphics adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuInfo {
    pub device_name: String,
    pub description: String,
    pub vendor_id: u32,
    pub device_id: u32,
    pub driver: String,
    pub driver_version: String,
}

/// Outcome of a memoized probe.
///
/// `Unprobed` and `Failed` are distinct so callers can tell "never asked"
/// from "asked and nothing answered".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolved<T> {
    Unprobed,
    Failed,
    Valid(T),
}

impl<T: Copy> Resolved<T> {
    pub fn valid(self) -> Option<T> {
        match self {
            Resolved::Valid(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Resolved::Failed)
    }
}

impl<T: Copy> From<Option<&Option<T>>> for Resolved<T> {
    fn from(cell: Option<&Option<T>>) -> Self {
        match cell {
            None => Resolved::Unprobed,
            Some(None) => Resolved::Failed,
            Some(Some(v)) => Resolved::Valid(*v),
        }
    }
}

/// Cache sizes in bytes; 0 means "not reported".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheLevels {
    pub l2: u64,
    pub l3: u64,
}

impl CacheLevels {
    /// L3 when present, otherwise L2.
    pub fn preferred(&self) -> u64 {
        if self.l3 > 0 {
            self.l3
        } else {
            self.l2
        }
    }
}

/// Summary of the OS processor-relationship records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessorTopology {
    /// Records tagged as a processor core.
    pub cores: u32,
    /// Sum of set bits over the core records' processor masks.
    pub logical: u32,
    pub caches: CacheLevels,
}

/// Basic processor record from the OS (`GetSystemInfo` on Windows).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemProcessorInfo {
    pub logical: u32,
    /// Processor level, i.e. the family.
    pub level: u16,
    /// Model in the high byte, stepping in the low byte.
    pub revision: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreqKind {
    /// Hardware-reported maximum.
    Max,
    /// Current operating frequency.
    Current,
}

/// Point-in-time view of everything the profiler knows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareSummary {
    pub architecture: Architecture,
    pub cpu_vendor: String,
    pub logical_cpus: u32,
    pub physical_cpus: u32,
    pub current_cpus: u32,
    pub cpu_family: u32,
    pub cpu_model: u32,
    pub cpu_stepping: u32,
    pub cache_size_bytes: u64,
    #[serde(default)]
    pub max_cpu_speed_mhz: Option<u32>,
    #[serde(default)]
    pub current_cpu_speed_mhz: Option<u32>,
    #[serde(default)]
    pub memory_bytes: Option<i64>,
    pub machine_model: String,
    #[serde(default)]
    pub gpu: Option<GpuInfo>,
}
