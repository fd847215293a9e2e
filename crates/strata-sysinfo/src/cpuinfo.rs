//! Reader for the `/proc/cpuinfo` format: blank-line separated sections of
//! `key : value` lines, one section per logical processor.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::Path;

use crate::types::Architecture;

pub type Section = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuInfoFile {
    sections: Vec<Section>,
}

impl CpuInfoFile {
    pub fn load(path: &Path) -> io::Result<Self> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    pub fn parse(text: &str) -> Self {
        let mut sections = Vec::new();
        let mut current = Section::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    sections.push(std::mem::take(&mut current));
                }
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                current.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        if !current.is_empty() {
            sections.push(current);
        }
        Self { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn str_value(&self, section: usize, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.get(key))
            .map(String::as_str)
    }

    /// Leading integer of a value: `"8192 KB"` -> 8192, `"2394.230"` -> 2394.
    pub fn int_value(&self, section: usize, key: &str) -> Option<i64> {
        self.str_value(section, key).and_then(leading_int)
    }

    /// Logical processors. On ARM only sections carrying a `processor` key
    /// count, since the kernel appends a board-level section there.
    pub fn logical_cpus(&self, arch: Architecture) -> u32 {
        let n = match arch {
            Architecture::Arm => self
                .sections
                .iter()
                .filter(|s| s.contains_key("processor"))
                .count(),
            _ => self.sections.len(),
        };
        n as u32
    }

    /// Sum of `cpu cores` over distinct `physical id`s. 0 when the file
    /// carries no socket information.
    pub fn physical_cpus(&self) -> u32 {
        let mut seen = BTreeSet::new();
        let mut total: i64 = 0;
        for s in &self.sections {
            let id = s.get("physical id").and_then(|v| leading_int(v));
            let cores = s.get("cpu cores").and_then(|v| leading_int(v));
            if let (Some(id), Some(cores)) = (id, cores) {
                if seen.insert(id) {
                    total += cores;
                }
            }
        }
        total.max(0) as u32
    }

    /// Family of the first processor.
    pub fn cpu_family(&self, arch: Architecture) -> u32 {
        match arch {
            Architecture::Arm => self
                .int_value(0, "CPU architecture")
                .filter(|v| *v > 0)
                .or_else(|| self.str_value(0, "Processor").and_then(arm_version))
                .unwrap_or(0)
                .max(0) as u32,
            _ => self.int_value(0, "cpu family").unwrap_or(0).max(0) as u32,
        }
    }
}

fn leading_int(v: &str) -> Option<i64> {
    let v = v.trim();
    let end = v
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && *c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(v.len());
    v[..end].parse().ok()
}

// "ARMv7 Processor rev 2 (v7l)" -> 7
fn arm_version(name: &str) -> Option<i64> {
    let start = name.find("(v")? + 2;
    leading_int(&name[start..]).filter(|v| *v > 0)
}
