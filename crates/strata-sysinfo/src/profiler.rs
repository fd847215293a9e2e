use std::time::Instant;

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::chain;
use crate::config::ProbeConfig;
use crate::cpuid::CpuSignature;
use crate::detect::NativeSource;
use crate::source::HostSource;
use crate::types::{Architecture, GpuInfo, HardwareSummary, Resolved};

/// Returned by [`HardwareProfiler::machine_model`] when no source knows the model.
pub const MODEL_NOT_AVAILABLE: &str = "Not available";

/// Host hardware characteristics.
///
/// Counts, CPU identity and cache size are probed at construction. Vendor,
/// max clock, memory and machine model are probed on first access and then
/// memoized, failures included. Current CPU count, current clock and GPU are
/// queried on every call.
pub struct HardwareProfiler<S: HostSource = NativeSource> {
    source: S,
    config: ProbeConfig,
    architecture: Architecture,
    logical_cpus: u32,
    physical_cpus: u32,
    signature: CpuSignature,
    cache_size: u64,

    cpu_vendor: OnceCell<String>,
    max_cpu_speed: OnceCell<Option<u32>>,
    memory_size: OnceCell<Option<i64>>,
    machine_model: OnceCell<String>,
}

impl HardwareProfiler<NativeSource> {
    /// Profile the running host, with probe settings from the environment.
    pub fn new() -> Self {
        let config = ProbeConfig::from_env();
        Self::with_config(NativeSource::new(config.clone()), config)
    }
}

impl Default for HardwareProfiler<NativeSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: HostSource> HardwareProfiler<S> {
    pub fn with_source(source: S) -> Self {
        Self::with_config(source, ProbeConfig::default())
    }

    pub fn with_config(source: S, config: ProbeConfig) -> Self {
        let t0 = Instant::now();
        let architecture = Architecture::current();

        let logical_cpus = chain::logical_cpus(&source, architecture, &config).unwrap_or(1);
        let physical_cpus = chain::physical_cpus(&source, architecture, &config)
            .ok()
            .filter(|n| *n > 0)
            .unwrap_or(logical_cpus);
        let signature =
            chain::cpu_signature(&source, architecture, &config).unwrap_or_default();
        let cache_size = chain::cache_size(&source, architecture, &config).unwrap_or(0);

        debug!(
            arch = architecture.as_str(),
            logical_cpus,
            physical_cpus,
            family = signature.family,
            model = signature.model,
            stepping = signature.stepping,
            cache_size,
            ms = t0.elapsed().as_millis() as u64,
            "hardware profiler initialized"
        );

        Self {
            source,
            config,
            architecture,
            logical_cpus,
            physical_cpus,
            signature,
            cache_size,
            cpu_vendor: OnceCell::new(),
            max_cpu_speed: OnceCell::new(),
            memory_size: OnceCell::new(),
            machine_model: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn max_logical_cpus(&self) -> u32 {
        self.logical_cpus
    }

    pub fn max_physical_cpus(&self) -> u32 {
        self.physical_cpus
    }

    /// Processors usable by this process right now. Never below 1.
    pub fn current_cpus(&self) -> u32 {
        chain::current_cpus(&self.source, self.architecture, &self.config)
            .unwrap_or(self.logical_cpus)
            .max(1)
    }

    pub fn cpu_architecture(&self) -> Architecture {
        self.architecture
    }

    pub fn cpu_vendor(&self) -> &str {
        self.cpu_vendor
            .get_or_init(|| chain::cpu_vendor(&self.source, self.architecture, &self.config))
    }

    /// Largest cache level in bytes, 0 if unknown.
    pub fn cpu_cache_size(&self) -> u64 {
        self.cache_size
    }

    pub fn cpu_family(&self) -> u32 {
        self.signature.family
    }

    pub fn cpu_model(&self) -> u32 {
        self.signature.model
    }

    pub fn cpu_stepping(&self) -> u32 {
        self.signature.stepping
    }

    /// Nominal maximum clock in MHz, or -1 when no source reports it.
    pub fn max_cpu_speed(&self) -> i32 {
        self.max_cpu_speed_mhz()
            .map_or(-1, |mhz| i32::try_from(mhz).unwrap_or(i32::MAX))
    }

    pub fn max_cpu_speed_state(&self) -> Resolved<u32> {
        self.max_cpu_speed.get().into()
    }

    fn max_cpu_speed_mhz(&self) -> Option<u32> {
        *self.max_cpu_speed.get_or_init(|| {
            match chain::max_cpu_speed(&self.source, self.architecture, &self.config) {
                Ok(mhz) => Some(mhz),
                Err(e) => {
                    warn!(error = %e, "max cpu speed unavailable");
                    None
                }
            }
        })
    }

    /// Current clock in MHz; the nominal maximum when no live source answers.
    pub fn current_cpu_speed(&self) -> i32 {
        match chain::current_cpu_speed(&self.source, self.architecture, &self.config) {
            Ok(mhz) => i32::try_from(mhz).unwrap_or(i32::MAX),
            Err(_) => self.max_cpu_speed(),
        }
    }

    /// Installed physical memory in bytes, or -1 when unknown.
    pub fn memory_size(&self) -> i64 {
        self.memory_bytes().unwrap_or(-1)
    }

    pub fn memory_size_state(&self) -> Resolved<i64> {
        self.memory_size.get().into()
    }

    fn memory_bytes(&self) -> Option<i64> {
        *self.memory_size.get_or_init(|| {
            match chain::memory_size(&self.source, self.architecture, &self.config) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!(error = %e, "memory size unavailable");
                    None
                }
            }
        })
    }

    /// Machine model identifier (`MacBookAir1,1`, DMI product name), or
    /// [`MODEL_NOT_AVAILABLE`].
    pub fn machine_model(&self) -> &str {
        self.machine_model.get_or_init(|| {
            chain::machine_model(&self.source, self.architecture, &self.config)
                .unwrap_or_else(|_| MODEL_NOT_AVAILABLE.to_string())
        })
    }

    /// Primary GPU identification. The flag is false and the record default
    /// when no adapter could be identified.
    pub fn gpu_info(&self) -> (bool, GpuInfo) {
        match self.try_gpu_info() {
            Some(info) => (true, info),
            None => (false, GpuInfo::default()),
        }
    }

    pub fn try_gpu_info(&self) -> Option<GpuInfo> {
        match chain::gpu(&self.source, self.architecture, &self.config) {
            Ok(info) => Some(info),
            Err(e) => {
                debug!(error = %e, "no GPU identified");
                None
            }
        }
    }

    /// Snapshot of every accessor. Forces the lazy probes.
    pub fn summary(&self) -> HardwareSummary {
        HardwareSummary {
            architecture: self.architecture,
            cpu_vendor: self.cpu_vendor().to_string(),
            logical_cpus: self.logical_cpus,
            physical_cpus: self.physical_cpus,
            current_cpus: self.current_cpus(),
            cpu_family: self.signature.family,
            cpu_model: self.signature.model,
            cpu_stepping: self.signature.stepping,
            cache_size_bytes: self.cache_size,
            max_cpu_speed_mhz: self.max_cpu_speed_mhz(),
            current_cpu_speed_mhz: u32::try_from(self.current_cpu_speed()).ok(),
            memory_bytes: self.memory_bytes(),
            machine_model: self.machine_model().to_string(),
            gpu: self.try_gpu_info(),
        }
    }
}
