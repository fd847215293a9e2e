use sysinfo::System;

use crate::cpuid::CpuIdResult;
use crate::errors::{ProbeError, ProbeResult};

#[cfg(any(target_os = "linux", target_os = "android"))]
use std::{fs, io, path::Path};

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub fn native_cpuid(leaf: u32) -> ProbeResult<CpuIdResult> {
    use raw_cpuid::{CpuIdReader, CpuIdReaderNative};
    Ok(CpuIdReaderNative.cpuid1(leaf))
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
pub fn native_cpuid(_leaf: u32) -> ProbeResult<CpuIdResult> {
    Err(ProbeError::Unavailable)
}

pub fn runtime_logical_cpus() -> ProbeResult<u32> {
    Ok(num_cpus::get() as u32)
}

pub fn runtime_physical_cpus() -> ProbeResult<u32> {
    System::new()
        .physical_core_count()
        .map(|n| n as u32)
        .ok_or_else(|| ProbeError::failed("runtime", "physical core count unknown"))
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "windows"
)))]
pub fn sysinfo_total_memory() -> ProbeResult<i64> {
    let mut sys = System::new();
    sys.refresh_memory();
    i64::try_from(sys.total_memory())
        .map_err(|_| ProbeError::failed("memory", "total memory out of range"))
}

#[cfg(any(target_os = "linux", target_os = "android"))]
/// Map file errors: a missing file means the source does not exist here.
pub fn read_error(origin: &'static str, path: &Path, e: io::Error) -> ProbeError {
    if e.kind() == io::ErrorKind::NotFound {
        ProbeError::Unavailable
    } else {
        ProbeError::failed(origin, format!("{}: {e}", path.display()))
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
/// Contents of a single-value file, trimmed of whitespace and NUL padding.
pub fn read_trimmed(origin: &'static str, path: &Path) -> ProbeResult<String> {
    let raw = fs::read(path).map_err(|e| read_error(origin, path, e))?;
    let text = String::from_utf8_lossy(&raw);
    Ok(text.trim_matches(|c: char| c == '\0' || c.is_whitespace()).to_string())
}

#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn read_u64(origin: &'static str, path: &Path) -> ProbeResult<u64> {
    let s = read_trimmed(origin, path)?;
    s.parse::<u64>()
        .map_err(|e| ProbeError::failed(origin, format!("{}: {e}", path.display())))
}

#[cfg(all(test, any(target_os = "linux", target_os = "android")))]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_u64("sysfs", &dir.path().join("nope")).unwrap_err();
        assert!(err.is_unavailable());
    }

    #[test]
    fn values_are_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("model");
        fs::write(&p, b"Raspberry Pi 4 Model B Rev 1.4\0").unwrap();
        assert_eq!(
            read_trimmed("firmware", &p).unwrap(),
            "Raspberry Pi 4 Model B Rev 1.4"
        );

        let p = dir.path().join("freq");
        fs::write(&p, "3600000\n").unwrap();
        assert_eq!(read_u64("sysfs", &p).unwrap(), 3_600_000);
    }

    #[test]
    fn garbage_is_a_query_failure() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("freq");
        fs::write(&p, "fast").unwrap();
        assert!(matches!(
            read_u64("sysfs", &p),
            Err(ProbeError::QueryFailed { origin: "sysfs", .. })
        ));
    }
}
