//! Decoding of raw CPUID register words.
//!
//! Register access itself lives behind [`HostSource::cpuid`](crate::source::HostSource::cpuid);
//! everything here is pure so it can be fed fixed register values.

pub use raw_cpuid::CpuIdResult;
use serde::{Deserialize, Serialize};

/// Highest standard leaf in EAX, vendor string in EBX/EDX/ECX.
pub const LEAF_VENDOR: u32 = 0;
/// Version information (family/model/stepping) in EAX.
pub const LEAF_VERSION: u32 = 1;
/// Highest extended leaf in EAX.
pub const LEAF_EXT_MAX: u32 = 0x8000_0000;
/// Extended L2 cache/TLB descriptor.
pub const LEAF_EXT_L2_CACHE: u32 = 0x8000_0006;

/// Vendor identification string from leaf 0.
///
/// The twelve bytes are laid out EBX, EDX, ECX; the registers do not come
/// back in string order.
pub fn vendor_string(regs: &CpuIdResult) -> String {
    let mut bytes = [0u8; 12];
    bytes[0..4].copy_from_slice(&regs.ebx.to_le_bytes());
    bytes[4..8].copy_from_slice(&regs.edx.to_le_bytes());
    bytes[8..12].copy_from_slice(&regs.ecx.to_le_bytes());
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Family/model/stepping as the kernel reports them (extended fields folded in).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuSignature {
    pub family: u32,
    pub model: u32,
    pub stepping: u32,
}

impl CpuSignature {
    pub fn from_version_word(eax: u32) -> Self {
        let stepping = eax & 0xF;
        let base_model = (eax >> 4) & 0xF;
        let base_family = (eax >> 8) & 0xF;
        let ext_model = (eax >> 16) & 0xF;
        let ext_family = (eax >> 20) & 0xFF;

        let family = if base_family == 0xF {
            base_family + ext_family
        } else {
            base_family
        };
        let model = if base_family == 0x6 || base_family == 0xF {
            (ext_model << 4) | base_model
        } else {
            base_model
        };
        Self {
            family,
            model,
            stepping,
        }
    }

    /// Windows `wProcessorLevel` / `wProcessorRevision` pair.
    pub fn from_level_revision(level: u16, revision: u16) -> Self {
        Self {
            family: u32::from(level),
            model: u32::from(revision >> 8),
            stepping: u32::from(revision & 0xFF),
        }
    }
}

/// L2 size in bytes from leaf 0x8000_0006 ECX (upper 16 bits, in kB).
pub fn l2_cache_bytes(ecx: u32) -> u64 {
    u64::from(ecx >> 16) * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regs(eax: u32, ebx: u32, ecx: u32, edx: u32) -> CpuIdResult {
        CpuIdResult { eax, ebx, ecx, edx }
    }

    fn word(s: &[u8; 4]) -> u32 {
        u32::from_le_bytes(*s)
    }

    #[test]
    fn vendor_uses_ebx_edx_ecx_order() {
        let r = regs(0x16, word(b"Genu"), word(b"ntel"), word(b"ineI"));
        assert_eq!(vendor_string(&r), "GenuineIntel");

        let r = regs(0x10, word(b"Auth"), word(b"cAMD"), word(b"enti"));
        assert_eq!(vendor_string(&r), "AuthenticAMD");
    }

    #[test]
    fn vendor_stops_at_nul() {
        let r = regs(0, word(b"VIA\0"), 0, 0);
        assert_eq!(vendor_string(&r), "VIA");
    }

    #[test]
    fn signature_folds_extended_model_for_family_6() {
        // Coffee Lake: family 6, model 158 (0x9E), stepping 10
        let sig = CpuSignature::from_version_word(0x000906EA);
        assert_eq!(
            sig,
            CpuSignature {
                family: 6,
                model: 158,
                stepping: 10
            }
        );
    }

    #[test]
    fn signature_folds_extended_family_for_family_f() {
        // Zen 3: family 0x19, model 0x21, stepping 0
        let sig = CpuSignature::from_version_word(0x00A20F10);
        assert_eq!(sig.family, 0x19);
        assert_eq!(sig.model, 0x21);
        assert_eq!(sig.stepping, 0);
    }

    #[test]
    fn signature_ignores_extended_fields_for_old_families() {
        // family 5 keeps the base model even when extended bits are set
        let sig = CpuSignature::from_version_word(0x0001_0543);
        assert_eq!(sig.family, 5);
        assert_eq!(sig.model, 4);
        assert_eq!(sig.stepping, 3);
    }

    #[test]
    fn level_revision_split() {
        let sig = CpuSignature::from_level_revision(6, 0x9E0A);
        assert_eq!((sig.family, sig.model, sig.stepping), (6, 0x9E, 0x0A));
    }

    #[test]
    fn l2_from_upper_half_of_ecx() {
        // 512 kB L2, 64-byte lines
        assert_eq!(l2_cache_bytes(0x0200_6140), 512 * 1024);
        assert_eq!(l2_cache_bytes(0x0000_FFFF), 0);
    }
}
