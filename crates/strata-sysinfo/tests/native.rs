//! Runs against the real host. Only invariants are checked since values differ
//! per machine.

use strata_sysinfo::{Architecture, HardwareProfiler, Resolved};

#[test]
fn native_profile_is_consistent() {
    let p = HardwareProfiler::new();

    assert_eq!(p.cpu_architecture(), Architecture::current());
    assert!(p.max_logical_cpus() >= 1);
    assert!(p.max_physical_cpus() >= 1);
    assert!(p.current_cpus() >= 1);
    assert!(!p.cpu_vendor().is_empty());
    assert!(!p.machine_model().is_empty());

    let max = p.max_cpu_speed();
    assert!(max == -1 || max > 0);
    let current = p.current_cpu_speed();
    assert!(current > 0 || current == max);

    let mem = p.memory_size();
    assert!(mem == -1 || mem > 0);
    assert!(!matches!(p.memory_size_state(), Resolved::Unprobed));

    let (found, info) = p.gpu_info();
    if !found {
        assert_eq!(info, Default::default());
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[test]
fn native_vendor_matches_cpuid_crate() {
    let p = HardwareProfiler::new();
    if let Some(v) = raw_cpuid::CpuId::new().get_vendor_info() {
        assert_eq!(p.cpu_vendor(), v.as_str());
    }
}
