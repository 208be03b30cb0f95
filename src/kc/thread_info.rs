//! Thread Info Capability
//!
//! Bounds the scheduler priorities and CPU cores a process may use.
//!
//! # Payload Layout
//! - Bits 0-5: lowest priority
//! - Bits 6-11: highest priority
//! - Bits 12-19: minimum core id
//! - Bits 20-27: maximum core id

use super::entry::{field, CapabilityEntry, EntryType};
use super::single::{SingleWord, WordCap};
use crate::error::{check_range, KcResult};

/// Largest encodable thread priority.
pub const MAX_PRIORITY: u8 = 63;

const PRIORITY_BITS: u32 = 6;
const CORE_BITS: u32 = 8;

/// Priority and core range of a process.
///
/// On the target platform a numerically smaller priority is scheduled
/// first, so `lowest_priority` is usually the larger number.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ThreadInfo {
    lowest_priority: u8,
    highest_priority: u8,
    min_core_id: u8,
    max_core_id: u8,
}

impl ThreadInfo {
    /// Create thread info, checking both priorities against [`MAX_PRIORITY`].
    pub fn new(
        lowest_priority: u8,
        highest_priority: u8,
        min_core_id: u8,
        max_core_id: u8,
    ) -> KcResult<Self> {
        check_range("lowest priority", lowest_priority.into(), MAX_PRIORITY.into())?;
        check_range("highest priority", highest_priority.into(), MAX_PRIORITY.into())?;
        Ok(Self {
            lowest_priority,
            highest_priority,
            min_core_id,
            max_core_id,
        })
    }

    /// Get the lowest priority.
    #[inline]
    pub const fn lowest_priority(&self) -> u8 {
        self.lowest_priority
    }

    /// Get the highest priority.
    #[inline]
    pub const fn highest_priority(&self) -> u8 {
        self.highest_priority
    }

    /// Get the minimum core id.
    #[inline]
    pub const fn min_core_id(&self) -> u8 {
        self.min_core_id
    }

    /// Get the maximum core id.
    #[inline]
    pub const fn max_core_id(&self) -> u8 {
        self.max_core_id
    }

    /// Set the lowest priority.
    pub fn set_lowest_priority(&mut self, priority: u8) -> KcResult<()> {
        check_range("lowest priority", priority.into(), MAX_PRIORITY.into())?;
        self.lowest_priority = priority;
        Ok(())
    }

    /// Set the highest priority.
    pub fn set_highest_priority(&mut self, priority: u8) -> KcResult<()> {
        check_range("highest priority", priority.into(), MAX_PRIORITY.into())?;
        self.highest_priority = priority;
        Ok(())
    }

    /// Set the minimum core id.
    #[inline]
    pub fn set_min_core_id(&mut self, core: u8) {
        self.min_core_id = core;
    }

    /// Set the maximum core id.
    #[inline]
    pub fn set_max_core_id(&mut self, core: u8) {
        self.max_core_id = core;
    }

    /// Priority bounds as a numeric closed interval, smaller bound first.
    pub fn priority_range(&self) -> (u8, u8) {
        ordered(self.lowest_priority, self.highest_priority)
    }

    /// Core ids as a closed interval, smaller bound first.
    pub fn core_range(&self) -> (u8, u8) {
        ordered(self.min_core_id, self.max_core_id)
    }
}

fn ordered(a: u8, b: u8) -> (u8, u8) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl SingleWord for ThreadInfo {
    const ENTRY_TYPE: EntryType = EntryType::ThreadInfo;

    fn to_payload(&self) -> u32 {
        u32::from(self.lowest_priority)
            | u32::from(self.highest_priority) << PRIORITY_BITS
            | u32::from(self.min_core_id) << (2 * PRIORITY_BITS)
            | u32::from(self.max_core_id) << (2 * PRIORITY_BITS + CORE_BITS)
    }

    fn from_entry(entry: CapabilityEntry) -> KcResult<Self> {
        let payload = entry.payload();
        // Every field fits its width by construction of the word
        Ok(Self {
            lowest_priority: field(payload, 0, PRIORITY_BITS) as u8,
            highest_priority: field(payload, PRIORITY_BITS, PRIORITY_BITS) as u8,
            min_core_id: field(payload, 2 * PRIORITY_BITS, CORE_BITS) as u8,
            max_core_id: field(payload, 2 * PRIORITY_BITS + CORE_BITS, CORE_BITS) as u8,
        })
    }

    fn validate(&self) -> KcResult<()> {
        check_range("lowest priority", self.lowest_priority.into(), MAX_PRIORITY.into())?;
        check_range("highest priority", self.highest_priority.into(), MAX_PRIORITY.into())
    }
}

/// Codec for the ThreadInfo category.
pub type ThreadInfoCap = WordCap<ThreadInfo>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KcError;
    use crate::kc::CategoryCodec;
    use alloc::vec::Vec;

    #[test]
    fn test_priority_bounds() {
        assert!(ThreadInfo::new(63, 0, 0, 3).is_ok());
        assert_eq!(
            ThreadInfo::new(64, 0, 0, 3),
            Err(KcError::FieldOutOfRange {
                field: "lowest priority",
                value: 64,
                max: 63
            })
        );

        let mut info = ThreadInfo::default();
        assert!(info.set_highest_priority(64).is_err());
        assert_eq!(info.highest_priority(), 0);
    }

    #[test]
    fn test_known_word() {
        // lowest 59, highest 28, cores 0..=3
        let info = ThreadInfo::new(59, 28, 0, 3).unwrap();
        let entry = CapabilityEntry::new(EntryType::ThreadInfo, info.to_payload());
        assert_eq!(entry.raw(), 0x0300_73B7);
        assert_eq!(ThreadInfo::from_entry(entry).unwrap(), info);
        assert_eq!(entry.raw() & 0xF, 0x7);
        assert_eq!((entry.raw() >> 4) & 0x3F, 59);
        assert_eq!((entry.raw() >> 10) & 0x3F, 28);
        assert_eq!((entry.raw() >> 16) & 0xFF, 0);
        assert_eq!(entry.raw() >> 24, 3);
    }

    #[test]
    fn test_ranges_are_ordered() {
        let info = ThreadInfo::new(59, 28, 3, 1).unwrap();
        assert_eq!(info.priority_range(), (28, 59));
        assert_eq!(info.core_range(), (1, 3));
    }

    #[test]
    fn test_codec_last_entry_wins() {
        let a = ThreadInfo::new(10, 5, 0, 1).unwrap();
        let b = ThreadInfo::new(20, 15, 1, 2).unwrap();
        let entries = [
            CapabilityEntry::new(EntryType::ThreadInfo, a.to_payload()),
            CapabilityEntry::new(EntryType::ThreadInfo, b.to_payload()),
        ];
        let cap = ThreadInfoCap::from_entries(&entries).unwrap();
        assert_eq!(cap.get(), Some(&b));

        let mut out = Vec::new();
        cap.to_entries(&mut out);
        assert_eq!(out.as_slice(), &entries[1..]);
    }

    #[test]
    fn test_unset_emits_nothing() {
        let mut cap = ThreadInfoCap::new();
        let mut out = Vec::new();
        cap.to_entries(&mut out);
        assert!(out.is_empty());

        cap.set(ThreadInfo::default()).unwrap();
        assert!(cap.is_set());
        cap.clear();
        assert!(!cap.is_set());
    }
}
