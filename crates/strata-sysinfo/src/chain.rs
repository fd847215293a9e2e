//! Ordered probe chains, one per metric.
//!
//! Each chain is a fixed list of named probes over a [`HostSource`]. The
//! runner takes the first value that passes the metric's plausibility check;
//! unavailable sources are skipped quietly, failed ones are logged and skipped.

use std::fmt::Debug;

use tracing::{debug, trace, warn};

use crate::config::ProbeConfig;
use crate::cpuid::{self, CpuSignature};
use crate::errors::{ProbeError, ProbeResult};
use crate::gpu::RegistryGpu;
use crate::source::HostSource;
use crate::types::{Architecture, CacheLevels, FreqKind, GpuInfo};

pub struct Probe<S: ?Sized, T> {
    pub name: &'static str,
    run: fn(&S, Architecture) -> ProbeResult<T>,
}

impl<S: ?Sized, T> Probe<S, T> {
    pub const fn new(name: &'static str, run: fn(&S, Architecture) -> ProbeResult<T>) -> Self {
        Self { name, run }
    }
}

/// Run `probes` in order and return the first usable value.
pub fn first_usable<S: ?Sized, T: Debug>(
    metric: &'static str,
    source: &S,
    arch: Architecture,
    config: &ProbeConfig,
    probes: &[Probe<S, T>],
    usable: fn(&T) -> bool,
) -> ProbeResult<T> {
    for p in probes {
        if config.is_disabled(p.name) {
            trace!(metric, source = p.name, "source disabled by config");
            continue;
        }
        match (p.run)(source, arch) {
            Ok(v) if usable(&v) => {
                debug!(metric, source = p.name, value = ?v, "resolved");
                return Ok(v);
            }
            Ok(v) => trace!(metric, source = p.name, value = ?v, "implausible value"),
            Err(ProbeError::Unavailable) => trace!(metric, source = p.name, "unavailable"),
            Err(ProbeError::NoData) => trace!(metric, source = p.name, "no data"),
            Err(e) => warn!(metric, source = p.name, error = %e, "probe failed, trying next source"),
        }
    }
    Err(ProbeError::NoData)
}

fn to_u32(origin: &'static str, v: u64) -> ProbeResult<u32> {
    u32::try_from(v).map_err(|_| ProbeError::failed(origin, format!("{v} out of range")))
}

fn positive(v: &u32) -> bool {
    *v > 0
}

pub fn logical_cpus<S: HostSource + ?Sized>(
    source: &S,
    arch: Architecture,
    config: &ProbeConfig,
) -> ProbeResult<u32> {
    first_usable(
        "logical_cpus",
        source,
        arch,
        config,
        &[
            Probe::new("topology", |s, _| s.processor_topology().map(|t| t.logical)),
            Probe::new("system_info", |s, _| {
                s.system_processor_info().map(|i| i.logical)
            }),
            Probe::new("sysctl", |s, _| {
                to_u32("sysctl", s.named_u64("hw.logicalcpu_max")?)
            }),
            Probe::new("cpuinfo", |s, arch| Ok(s.cpuinfo()?.logical_cpus(arch))),
            Probe::new("runtime", |s, _| s.runtime_logical_cpus()),
        ],
        positive,
    )
}

pub fn physical_cpus<S: HostSource + ?Sized>(
    source: &S,
    arch: Architecture,
    config: &ProbeConfig,
) -> ProbeResult<u32> {
    first_usable(
        "physical_cpus",
        source,
        arch,
        config,
        &[
            Probe::new("topology", |s, _| s.processor_topology().map(|t| t.cores)),
            Probe::new("sysctl", |s, _| {
                to_u32("sysctl", s.named_u64("hw.physicalcpu_max")?)
            }),
            Probe::new("cpuinfo", |s, _| Ok(s.cpuinfo()?.physical_cpus())),
            Probe::new("runtime", |s, _| s.runtime_physical_cpus()),
        ],
        positive,
    )
}

pub fn current_cpus<S: HostSource + ?Sized>(
    source: &S,
    arch: Architecture,
    config: &ProbeConfig,
) -> ProbeResult<u32> {
    first_usable(
        "current_cpus",
        source,
        arch,
        config,
        &[
            Probe::new("affinity", |s, _| s.process_affinity_cpus()),
            Probe::new("sysctl", |s, _| to_u32("sysctl", s.named_u64("hw.ncpu")?)),
            Probe::new("online", |s, _| s.online_cpus()),
        ],
        positive,
    )
}

/// Vendor string; never fails because the architecture name closes the chain.
pub fn cpu_vendor<S: HostSource + ?Sized>(
    source: &S,
    arch: Architecture,
    config: &ProbeConfig,
) -> String {
    first_usable(
        "cpu_vendor",
        source,
        arch,
        config,
        &[
            Probe::new("cpuid", |s, arch| {
                if !arch.has_cpuid() {
                    return Err(ProbeError::Unavailable);
                }
                Ok(cpuid::vendor_string(&s.cpuid(cpuid::LEAF_VENDOR)?))
            }),
            Probe::new("architecture", |_, arch| {
                Ok(arch.vendor_fallback().to_string())
            }),
        ],
        |v| !v.trim().is_empty(),
    )
    .unwrap_or_else(|_| arch.vendor_fallback().to_string())
}

pub fn cpu_signature<S: HostSource + ?Sized>(
    source: &S,
    arch: Architecture,
    config: &ProbeConfig,
) -> ProbeResult<CpuSignature> {
    first_usable(
        "cpu_signature",
        source,
        arch,
        config,
        &[
            Probe::new("cpuid", |s, arch| {
                if !arch.has_cpuid() {
                    return Err(ProbeError::Unavailable);
                }
                let max_leaf = s.cpuid(cpuid::LEAF_VENDOR)?.eax;
                if max_leaf < cpuid::LEAF_VERSION {
                    return Err(ProbeError::Unavailable);
                }
                let eax = s.cpuid(cpuid::LEAF_VERSION)?.eax;
                Ok(CpuSignature::from_version_word(eax))
            }),
            Probe::new("system_info", |s, _| {
                let i = s.system_processor_info()?;
                Ok(CpuSignature::from_level_revision(i.level, i.revision))
            }),
            Probe::new("sysctl", |s, _| {
                let family = to_u32("sysctl", s.named_u64("machdep.cpu.family")?)?;
                let model = s.named_u64("machdep.cpu.model").unwrap_or(0);
                let stepping = s.named_u64("machdep.cpu.stepping").unwrap_or(0);
                Ok(CpuSignature {
                    family,
                    model: to_u32("sysctl", model)?,
                    stepping: to_u32("sysctl", stepping)?,
                })
            }),
            Probe::new("cpuinfo", |s, arch| {
                let f = s.cpuinfo()?;
                let family = f.cpu_family(arch);
                // ARM kernels do not report model/stepping in this form
                if arch == Architecture::Arm {
                    return Ok(CpuSignature {
                        family,
                        ..Default::default()
                    });
                }
                let field = |key| f.int_value(0, key).unwrap_or(0).max(0) as u32;
                Ok(CpuSignature {
                    family,
                    model: field("model"),
                    stepping: field("stepping"),
                })
            }),
        ],
        |sig| sig.family > 0,
    )
}

/// Largest cache level in bytes (L3, else L2).
pub fn cache_size<S: HostSource + ?Sized>(
    source: &S,
    arch: Architecture,
    config: &ProbeConfig,
) -> ProbeResult<u64> {
    first_usable(
        "cache_size",
        source,
        arch,
        config,
        &[
            Probe::new("topology", |s, _| s.processor_topology().map(|t| t.caches)),
            Probe::new("sysctl", |s, _| {
                match (s.named_u64("hw.l3cachesize"), s.named_u64("hw.l2cachesize")) {
                    (Err(e), Err(_)) => Err(e),
                    (l3, l2) => Ok(CacheLevels {
                        l2: l2.unwrap_or(0),
                        l3: l3.unwrap_or(0),
                    }),
                }
            }),
            Probe::new("cpuinfo", |s, arch| {
                if arch == Architecture::Arm {
                    return Err(ProbeError::Unavailable);
                }
                let kb = s
                    .cpuinfo()?
                    .int_value(0, "cache size")
                    .ok_or_else(|| ProbeError::failed("cpuinfo", "no `cache size` field"))?;
                Ok(CacheLevels {
                    l2: kb.max(0) as u64 * 1024,
                    l3: 0,
                })
            }),
            Probe::new("cpuid", |s, arch| {
                if !arch.has_cpuid() {
                    return Err(ProbeError::Unavailable);
                }
                let max_ext = s.cpuid(cpuid::LEAF_EXT_MAX)?.eax;
                if max_ext < cpuid::LEAF_EXT_L2_CACHE {
                    return Err(ProbeError::Unavailable);
                }
                let ecx = s.cpuid(cpuid::LEAF_EXT_L2_CACHE)?.ecx;
                Ok(CacheLevels {
                    l2: cpuid::l2_cache_bytes(ecx),
                    l3: 0,
                })
            }),
        ],
        |c| c.preferred() > 0,
    )
    .map(|c| c.preferred())
}

/// Nominal maximum clock in MHz.
pub fn max_cpu_speed<S: HostSource + ?Sized>(
    source: &S,
    arch: Architecture,
    config: &ProbeConfig,
) -> ProbeResult<u32> {
    first_usable(
        "max_cpu_speed",
        source,
        arch,
        config,
        &[
            Probe::new("sysctl", |s, _| {
                to_u32("sysctl", s.named_u64("hw.cpufrequency_max")? / 1_000_000)
            }),
            Probe::new("registry", |s, _| s.registry_cpu_mhz()),
            Probe::new("sysfs", |s, _| {
                to_u32("sysfs", s.cpu_freq_khz(FreqKind::Max)? / 1000)
            }),
            // fluctuates with load, last resort
            Probe::new("cpuinfo", |s, arch| {
                if arch == Architecture::Arm {
                    return Err(ProbeError::Unavailable);
                }
                let mhz = s
                    .cpuinfo()?
                    .int_value(0, "cpu MHz")
                    .ok_or_else(|| ProbeError::failed("cpuinfo", "no `cpu MHz` field"))?;
                to_u32("cpuinfo", mhz.max(0) as u64)
            }),
        ],
        positive,
    )
}

/// Current clock in MHz from a live source. Callers fall back to the max.
pub fn current_cpu_speed<S: HostSource + ?Sized>(
    source: &S,
    arch: Architecture,
    config: &ProbeConfig,
) -> ProbeResult<u32> {
    first_usable(
        "current_cpu_speed",
        source,
        arch,
        config,
        &[
            Probe::new("sysctl", |s, _| {
                to_u32("sysctl", s.named_u64("hw.cpufrequency")? / 1_000_000)
            }),
            Probe::new("sysfs", |s, _| {
                to_u32("sysfs", s.cpu_freq_khz(FreqKind::Current)? / 1000)
            }),
        ],
        positive,
    )
}

pub fn memory_size<S: HostSource + ?Sized>(
    source: &S,
    arch: Architecture,
    config: &ProbeConfig,
) -> ProbeResult<i64> {
    first_usable(
        "memory_size",
        source,
        arch,
        config,
        &[Probe::new("memory", |s, _| s.physical_memory())],
        |v| *v > 0,
    )
}

pub fn machine_model<S: HostSource + ?Sized>(
    source: &S,
    arch: Architecture,
    config: &ProbeConfig,
) -> ProbeResult<String> {
    first_usable(
        "machine_model",
        source,
        arch,
        config,
        &[
            Probe::new("sysctl", |s, _| s.named_string("hw.model")),
            Probe::new("firmware", |s, _| s.firmware_model()),
        ],
        |v| !v.trim().is_empty(),
    )
    .map(|v| v.trim().to_string())
}

pub fn gpu<S: HostSource + ?Sized>(
    source: &S,
    arch: Architecture,
    config: &ProbeConfig,
) -> ProbeResult<GpuInfo> {
    first_usable(
        "gpu",
        source,
        arch,
        config,
        &[
            Probe::new("driver", |s, _| s.default_adapter()),
            Probe::new("display", |s, _| gpu_from_display(s)),
        ],
        |_| true,
    )
}

fn display_registry<S: HostSource + ?Sized>(s: &S) -> ProbeResult<RegistryGpu> {
    let lookup = |name: &str| match s.display_property(name) {
        Ok(v) => Ok(Some(v)),
        Err(ProbeError::Unavailable) => Err(ProbeError::Unavailable),
        Err(e) => {
            debug!(property = name, error = %e, "display property missing");
            Ok(None)
        }
    };
    Ok(RegistryGpu {
        vendor_id: lookup("vendor-id")?.and_then(|v| v.as_u32()),
        device_id: lookup("device-id")?.and_then(|v| v.as_u32()),
        model: lookup("model")?.and_then(|v| v.as_text()),
        device_name: None,
    })
}

fn gpu_from_display<S: HostSource + ?Sized>(s: &S) -> ProbeResult<GpuInfo> {
    // The registry may be missing (no service port for the main display)
    // while the device name still answers, and the other way round.
    let (mut reg, registry) = match display_registry(s) {
        Ok(reg) => (reg, true),
        Err(ProbeError::Unavailable) => (RegistryGpu::default(), false),
        Err(e) => return Err(e),
    };
    let name = s.display_device_name();
    let named = !matches!(name, Err(ProbeError::Unavailable));
    reg.device_name = name.ok().filter(|n| !n.trim().is_empty());

    if reg.found_any() {
        Ok(reg.into_info())
    } else if !registry && !named {
        Err(ProbeError::Unavailable)
    } else {
        Err(ProbeError::failed(
            "display",
            "no vendor-id, device-id, model or device name for the main display",
        ))
    }
}
