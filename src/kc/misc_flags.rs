//! Misc Flags Capability
//!
//! Independent debug/production switches. The payload is 15 bits wide;
//! bits without a defined flag are carried through unchanged.

use bitflags::bitflags;

use super::entry::{CapabilityEntry, EntryType};
use super::single::{SingleWord, WordCap};
use crate::error::{check_range, KcResult};

const FLAG_BITS: u32 = 15;

bitflags! {
    /// Debug and production flags.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct MiscFlags: u32 {
        /// Process may be debugged.
        const ENABLE_DEBUG = 1 << 0;
        /// Force debug behaviour on production units.
        const FORCE_DEBUG_PROD = 1 << 1;
        /// Force debug behaviour.
        const FORCE_DEBUG = 1 << 2;
    }
}

impl MiscFlags {
    /// Build flags from payload bits, keeping undefined bits.
    pub fn from_payload(bits: u32) -> KcResult<Self> {
        check_range("misc flags", bits.into(), ((1u32 << FLAG_BITS) - 1).into())?;
        Ok(Self::from_bits_retain(bits))
    }
}

impl SingleWord for MiscFlags {
    const ENTRY_TYPE: EntryType = EntryType::MiscFlags;

    fn to_payload(&self) -> u32 {
        self.bits()
    }

    fn from_entry(entry: CapabilityEntry) -> KcResult<Self> {
        Ok(Self::from_bits_retain(entry.payload()))
    }

    fn validate(&self) -> KcResult<()> {
        Self::from_payload(self.bits()).map(|_| ())
    }

    fn merge(self, later: Self) -> Self {
        self | later
    }
}

/// Codec for the MiscFlags category.
pub type MiscFlagsCap = WordCap<MiscFlags>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KcError;
    use crate::kc::CategoryCodec;

    #[test]
    fn test_word_layout() {
        let flags = MiscFlags::ENABLE_DEBUG | MiscFlags::FORCE_DEBUG;
        let entry = CapabilityEntry::new(EntryType::MiscFlags, flags.to_payload());
        assert_eq!(entry.raw(), 0xFFFF | 1 << 17 | 1 << 19);
    }

    #[test]
    fn test_undefined_bits_survive() {
        let entry = CapabilityEntry::new(EntryType::MiscFlags, 1 << 10 | 1);
        let flags = MiscFlags::from_entry(entry).unwrap();
        assert!(flags.contains(MiscFlags::ENABLE_DEBUG));
        assert_eq!(flags.bits(), 1 << 10 | 1);
    }

    #[test]
    fn test_width_checked_on_set() {
        let mut cap = MiscFlagsCap::new();
        assert!(cap.set(MiscFlags::from_bits_retain(1 << 15)).is_err());
        assert!(!cap.is_set());
        assert!(MiscFlags::from_payload(1 << 15).is_err());
    }

    #[test]
    fn test_width_checked_on_update() {
        let mut cap = MiscFlagsCap::new();
        assert_eq!(cap.update(|flags| flags.insert(MiscFlags::FORCE_DEBUG)), Ok(false));
        assert!(!cap.is_set());

        cap.set(MiscFlags::ENABLE_DEBUG).unwrap();
        assert_eq!(
            cap.update(|flags| *flags = MiscFlags::from_bits_retain(1 << 15 | 1)),
            Err(KcError::FieldOutOfRange {
                field: "misc flags",
                value: 1 << 15 | 1,
                max: 0x7FFF
            })
        );
        assert_eq!(cap.get(), Some(&MiscFlags::ENABLE_DEBUG));

        assert_eq!(cap.update(|flags| flags.insert(MiscFlags::FORCE_DEBUG)), Ok(true));
        assert_eq!(cap.get(), Some(&(MiscFlags::ENABLE_DEBUG | MiscFlags::FORCE_DEBUG)));
    }

    #[test]
    fn test_repeated_entries_merge() {
        let entries = [
            CapabilityEntry::new(EntryType::MiscFlags, MiscFlags::ENABLE_DEBUG.bits()),
            CapabilityEntry::new(EntryType::MiscFlags, MiscFlags::FORCE_DEBUG_PROD.bits()),
        ];
        let cap = MiscFlagsCap::from_entries(&entries).unwrap();
        assert_eq!(
            cap.get(),
            Some(&(MiscFlags::ENABLE_DEBUG | MiscFlags::FORCE_DEBUG_PROD))
        );
    }
}
