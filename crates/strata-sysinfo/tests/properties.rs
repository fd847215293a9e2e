mod common;

use common::FakeSource;
use proptest::prelude::*;
use strata_sysinfo::cpuid::CpuSignature;
use strata_sysinfo::{Architecture, CpuInfoFile, HardwareProfiler};

fn cpuinfo_text(sockets: u32, cores: u32, threads: u32) -> String {
    let mut text = String::new();
    let mut n = 0;
    for socket in 0..sockets {
        for core in 0..cores {
            for _ in 0..threads {
                text.push_str(&format!(
                    "processor\t: {n}\nphysical id\t: {socket}\ncore id\t\t: {core}\ncpu cores\t: {cores}\nsiblings\t: {}\n\n",
                    cores * threads
                ));
                n += 1;
            }
        }
    }
    text
}

proptest! {
    #[test]
    fn physical_never_exceeds_logical(sockets in 1u32..=4, cores in 1u32..=32, threads in 1u32..=2) {
        let text = cpuinfo_text(sockets, cores, threads);
        let file = CpuInfoFile::parse(&text);
        prop_assert_eq!(file.logical_cpus(Architecture::X64), sockets * cores * threads);
        prop_assert_eq!(file.physical_cpus(), sockets * cores);

        let src = FakeSource::default();
        src.set_cpuinfo(&text);
        let p = HardwareProfiler::with_source(src);
        prop_assert!(p.max_physical_cpus() >= 1);
        prop_assert!(p.max_physical_cpus() <= p.max_logical_cpus());
    }

    #[test]
    fn version_word_fields_stay_in_range(eax in any::<u32>()) {
        let sig = CpuSignature::from_version_word(eax);
        prop_assert!(sig.stepping <= 0xF);
        prop_assert!(sig.model <= 0xFF);
        prop_assert!(sig.family <= 0xF + 0xFF);
    }
}
