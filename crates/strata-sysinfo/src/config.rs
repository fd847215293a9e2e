use std::collections::BTreeSet;
use std::path::PathBuf;

/// Source names that can be switched off with `STRATA_SYSINFO_DISABLE_<NAME>=1`.
pub const SOURCE_NAMES: &[&str] = &[
    "topology",
    "system_info",
    "sysctl",
    "registry",
    "cpuinfo",
    "sysfs",
    "cpuid",
    "affinity",
    "online",
    "runtime",
    "memory",
    "firmware",
    "driver",
    "display",
    "d3d9",
    "vulkan",
    "iokit",
];

/// Knobs for probing, normally read from the environment.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    disabled: BTreeSet<String>,
    /// Location of the per-processor info file (`/proc/cpuinfo`).
    pub cpuinfo_path: PathBuf,
    /// Root of the sysfs tree (`/sys`).
    pub sysfs_root: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            disabled: BTreeSet::new(),
            cpuinfo_path: PathBuf::from("/proc/cpuinfo"),
            sysfs_root: PathBuf::from("/sys"),
        }
    }
}

impl ProbeConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        for name in SOURCE_NAMES {
            if env_flag(&format!("STRATA_SYSINFO_DISABLE_{}", name.to_ascii_uppercase())) {
                cfg.disabled.insert((*name).to_string());
            }
        }
        if let Some(p) = env_path("STRATA_SYSINFO_CPUINFO_PATH") {
            cfg.cpuinfo_path = p;
        }
        if let Some(p) = env_path("STRATA_SYSINFO_SYSFS_ROOT") {
            cfg.sysfs_root = p;
        }
        cfg
    }

    pub fn disable(mut self, name: &str) -> Self {
        self.disabled.insert(name.to_ascii_lowercase());
        self
    }

    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.contains(name)
    }

    pub fn with_cpuinfo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cpuinfo_path = path.into();
        self
    }

    pub fn with_sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs_root = root.into();
        self
    }
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_live_system() {
        let cfg = ProbeConfig::default();
        assert_eq!(cfg.cpuinfo_path, PathBuf::from("/proc/cpuinfo"));
        assert_eq!(cfg.sysfs_root, PathBuf::from("/sys"));
        assert!(!cfg.is_disabled("cpuid"));
    }

    #[test]
    fn disable_is_case_insensitive_on_input() {
        let cfg = ProbeConfig::default().disable("Vulkan");
        assert!(cfg.is_disabled("vulkan"));
        assert!(!cfg.is_disabled("d3d9"));
    }
}
