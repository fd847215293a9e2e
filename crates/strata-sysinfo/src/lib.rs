//! Strata host hardware profiling.
//! CPU counts/identity/cache/clock, memory, machine model and GPU, probed through
//! per-platform fallback chains and memoized per profiler instance.

pub mod chain;
pub mod config;
pub mod cpuid;
pub mod cpuinfo;
pub mod detect;
pub mod errors;
pub mod gpu;
pub mod profiler;
pub mod source;
pub mod types;

pub use config::ProbeConfig;
pub use cpuid::CpuSignature;
pub use cpuinfo::CpuInfoFile;
pub use detect::NativeSource;
pub use errors::{ProbeError, ProbeResult};
pub use gpu::PropertyValue;
pub use profiler::{HardwareProfiler, MODEL_NOT_AVAILABLE};
pub use source::HostSource;
pub use types::{
    Architecture, CacheLevels, FreqKind, GpuInfo, HardwareSummary, ProcessorTopology, Resolved,
    SystemProcessorInfo,
};
