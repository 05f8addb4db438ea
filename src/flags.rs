// This module encapsulates the bitflags API
// so that we don't leak details that may
// affect semver later on.

use bitflags::bitflags;

bitflags! {
    #[repr(transparent)]
    #[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
    struct HaplotypeBitFlags: u32 {
        const EMPTY = 0;
        const IS_SET = 1 << 1;
        const IS_MUTATED = 1 << 2;
    }
}

/// Lifecycle of the haplotype stored on an
/// [`Individual`](crate::Individual).
#[repr(transparent)]
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct HaplotypeFlags(HaplotypeBitFlags);

impl HaplotypeFlags {
    pub fn set() -> Self {
        Self(HaplotypeBitFlags::IS_SET)
    }

    pub fn with_mutated(self) -> Self {
        Self(self.0 | HaplotypeBitFlags::IS_MUTATED)
    }

    pub fn is_set(&self) -> bool {
        self.0.contains(HaplotypeBitFlags::IS_SET)
    }

    pub fn is_mutated(&self) -> bool {
        self.0.contains(HaplotypeBitFlags::IS_MUTATED)
    }
}

#[cfg(test)]
mod test_haplotype_flags {
    use super::HaplotypeFlags;

    #[test]
    fn test_default_is_unset() {
        let flags = HaplotypeFlags::default();
        assert!(!flags.is_set());
        assert!(!flags.is_mutated());
    }

    #[test]
    fn test_set_then_mutated() {
        let flags = HaplotypeFlags::set();
        assert!(flags.is_set());
        assert!(!flags.is_mutated());
        let flags = flags.with_mutated();
        assert!(flags.is_set());
        assert!(flags.is_mutated());
    }
}
