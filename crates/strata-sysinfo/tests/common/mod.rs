#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use strata_sysinfo::cpuid::CpuIdResult;
use strata_sysinfo::{
    CpuInfoFile, FreqKind, GpuInfo, HostSource, ProbeError, ProbeResult, ProcessorTopology,
    PropertyValue,
};

/// Install a subscriber once when `RUST_LOG` is set.
pub fn init_tracing() {
    if std::env::var_os("RUST_LOG").is_some() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

fn or_unavailable<T: Clone>(v: &Mutex<Option<ProbeResult<T>>>) -> ProbeResult<T> {
    v.lock().unwrap().clone().unwrap_or(Err(ProbeError::Unavailable))
}

/// Scriptable source. Unset fields answer `Unavailable`; values can be
/// changed between calls to observe memoization.
#[derive(Default)]
pub struct FakeSource {
    pub topology: Mutex<Option<ProbeResult<ProcessorTopology>>>,
    pub sysctl: Mutex<HashMap<&'static str, u64>>,
    pub sysctl_strings: Mutex<HashMap<&'static str, String>>,
    pub cpuinfo: Mutex<Option<String>>,
    pub freq_khz: Mutex<HashMap<&'static str, u64>>,
    pub cpuid: Mutex<HashMap<u32, CpuIdResult>>,
    pub online: Mutex<Option<ProbeResult<u32>>>,
    pub memory: Mutex<Option<ProbeResult<i64>>>,
    pub firmware_model: Mutex<Option<ProbeResult<String>>>,
    pub adapter: Mutex<Option<ProbeResult<GpuInfo>>>,
    pub display: Mutex<Option<HashMap<&'static str, PropertyValue>>>,
    pub display_name: Mutex<Option<ProbeResult<String>>>,

    pub sysctl_calls: AtomicUsize,
    pub memory_calls: AtomicUsize,
    pub cpuinfo_calls: AtomicUsize,
    pub adapter_calls: AtomicUsize,
}

impl FakeSource {
    pub fn set_sysctl(&self, name: &'static str, v: u64) {
        self.sysctl.lock().unwrap().insert(name, v);
    }

    pub fn set_cpuinfo(&self, text: &str) {
        *self.cpuinfo.lock().unwrap() = Some(text.to_string());
    }

    pub fn set_memory(&self, v: ProbeResult<i64>) {
        *self.memory.lock().unwrap() = Some(v);
    }

    pub fn set_cpuid(&self, leaf: u32, eax: u32, ebx: u32, ecx: u32, edx: u32) {
        self.cpuid
            .lock()
            .unwrap()
            .insert(leaf, CpuIdResult { eax, ebx, ecx, edx });
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

impl HostSource for FakeSource {
    fn processor_topology(&self) -> ProbeResult<ProcessorTopology> {
        or_unavailable(&self.topology)
    }

    fn named_u64(&self, name: &str) -> ProbeResult<u64> {
        self.sysctl_calls.fetch_add(1, Ordering::SeqCst);
        self.sysctl
            .lock()
            .unwrap()
            .get(name)
            .copied()
            .ok_or(ProbeError::Unavailable)
    }

    fn named_string(&self, name: &str) -> ProbeResult<String> {
        self.sysctl_strings
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or(ProbeError::Unavailable)
    }

    fn cpuinfo(&self) -> ProbeResult<CpuInfoFile> {
        self.cpuinfo_calls.fetch_add(1, Ordering::SeqCst);
        self.cpuinfo
            .lock()
            .unwrap()
            .as_deref()
            .map(CpuInfoFile::parse)
            .ok_or(ProbeError::Unavailable)
    }

    fn cpu_freq_khz(&self, kind: FreqKind) -> ProbeResult<u64> {
        let key = match kind {
            FreqKind::Max => "max",
            FreqKind::Current => "current",
        };
        self.freq_khz
            .lock()
            .unwrap()
            .get(key)
            .copied()
            .ok_or(ProbeError::Unavailable)
    }

    fn cpuid(&self, leaf: u32) -> ProbeResult<CpuIdResult> {
        self.cpuid
            .lock()
            .unwrap()
            .get(&leaf)
            .copied()
            .ok_or(ProbeError::Unavailable)
    }

    fn online_cpus(&self) -> ProbeResult<u32> {
        or_unavailable(&self.online)
    }

    fn physical_memory(&self) -> ProbeResult<i64> {
        self.memory_calls.fetch_add(1, Ordering::SeqCst);
        or_unavailable(&self.memory)
    }

    fn firmware_model(&self) -> ProbeResult<String> {
        or_unavailable(&self.firmware_model)
    }

    fn default_adapter(&self) -> ProbeResult<GpuInfo> {
        self.adapter_calls.fetch_add(1, Ordering::SeqCst);
        or_unavailable(&self.adapter)
    }

    fn display_property(&self, name: &str) -> ProbeResult<PropertyValue> {
        match &*self.display.lock().unwrap() {
            None => Err(ProbeError::Unavailable),
            Some(props) => props
                .get(name)
                .cloned()
                .ok_or_else(|| ProbeError::failed("display", format!("{name} not found"))),
        }
    }

    fn display_device_name(&self) -> ProbeResult<String> {
        or_unavailable(&self.display_name)
    }
}
