//! Handle Table Size Capability
//!
//! The handle table budget. Bits 0-9 of the payload hold the size; bits
//! 10-15 are reserved and must be zero.

use super::entry::{field, CapabilityEntry, EntryType};
use super::single::{SingleWord, WordCap};
use crate::error::{check_range, KcError, KcResult};

const SIZE_BITS: u32 = 10;

/// Largest encodable handle table size.
pub const MAX_HANDLE_TABLE_SIZE: u16 = (1 << SIZE_BITS) - 1;

/// Number of handle table slots.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[repr(transparent)]
pub struct HandleTableSize(u16);

impl HandleTableSize {
    /// Create a size, checking it against [`MAX_HANDLE_TABLE_SIZE`].
    pub fn new(size: u16) -> KcResult<Self> {
        check_range("handle table size", size.into(), MAX_HANDLE_TABLE_SIZE.into())?;
        Ok(Self(size))
    }

    /// Get the size.
    #[inline]
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl SingleWord for HandleTableSize {
    const ENTRY_TYPE: EntryType = EntryType::HandleTableSize;

    fn to_payload(&self) -> u32 {
        self.0.into()
    }

    fn from_entry(entry: CapabilityEntry) -> KcResult<Self> {
        let payload = entry.payload();
        if payload >> SIZE_BITS != 0 {
            return Err(KcError::ReservedBits {
                category: Self::ENTRY_TYPE.category(),
                word: entry.raw(),
            });
        }
        Ok(Self(field(payload, 0, SIZE_BITS) as u16))
    }

    fn validate(&self) -> KcResult<()> {
        Self::new(self.0).map(|_| ())
    }
}

/// Codec for the HandleTableSize category.
pub type HandleTableSizeCap = WordCap<HandleTableSize>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert_eq!(HandleTableSize::new(1023).map(HandleTableSize::get), Ok(1023));
        assert!(HandleTableSize::new(1024).is_err());
    }

    #[test]
    fn test_word_layout() {
        let size = HandleTableSize::new(0x200).unwrap();
        let entry = CapabilityEntry::new(EntryType::HandleTableSize, size.to_payload());
        assert_eq!(entry.raw(), 0x0200_7FFF);
        assert_eq!(HandleTableSize::from_entry(entry), Ok(size));
    }

    #[test]
    fn test_reserved_bits() {
        let entry = CapabilityEntry::from_raw(0x0400_7FFF);
        assert!(matches!(
            HandleTableSize::from_entry(entry),
            Err(KcError::ReservedBits { .. })
        ));
    }
}
