//! Misc Params Capability
//!
//! Declares the program type. Bits 0-2 of the payload hold the type; the
//! remaining 12 bits are reserved and must be zero.

use serde::{Deserialize, Serialize};

use super::entry::{field, CapabilityEntry, EntryType};
use super::single::{SingleWord, WordCap};
use crate::error::{KcError, KcResult};

const PROGRAM_TYPE_BITS: u32 = 3;

/// Kind of program a process runs as.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ProgramType {
    /// System module. Also the kernel's default when the entry is absent.
    #[default]
    System = 0,
    /// Application.
    Application = 1,
    /// Applet.
    Applet = 2,
}

impl ProgramType {
    /// Look up a program type by raw value.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::System),
            1 => Some(Self::Application),
            2 => Some(Self::Applet),
            _ => None,
        }
    }

    /// Get the raw value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self as u32
    }
}

impl core::fmt::Display for ProgramType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::System => write!(f, "System"),
            Self::Application => write!(f, "Application"),
            Self::Applet => write!(f, "Applet"),
        }
    }
}

impl SingleWord for ProgramType {
    const ENTRY_TYPE: EntryType = EntryType::MiscParams;

    fn to_payload(&self) -> u32 {
        self.raw()
    }

    fn from_entry(entry: CapabilityEntry) -> KcResult<Self> {
        let payload = entry.payload();
        if payload >> PROGRAM_TYPE_BITS != 0 {
            return Err(KcError::ReservedBits {
                category: Self::ENTRY_TYPE.category(),
                word: entry.raw(),
            });
        }
        let raw = field(payload, 0, PROGRAM_TYPE_BITS);
        Self::from_raw(raw).ok_or(KcError::InvalidValue {
            field: "program type",
            value: raw.into(),
        })
    }
}

/// Codec for the MiscParams category.
pub type MiscParamsCap = WordCap<ProgramType>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kc::Category;

    #[test]
    fn test_decode() {
        let entry = CapabilityEntry::new(EntryType::MiscParams, 1);
        assert_eq!(entry.raw(), 0x1FFF | 1 << 14);
        assert_eq!(ProgramType::from_entry(entry), Ok(ProgramType::Application));
    }

    #[test]
    fn test_undefined_program_type() {
        let entry = CapabilityEntry::new(EntryType::MiscParams, 5);
        assert_eq!(
            ProgramType::from_entry(entry),
            Err(KcError::InvalidValue {
                field: "program type",
                value: 5
            })
        );
    }

    #[test]
    fn test_reserved_bits() {
        let entry = CapabilityEntry::new(EntryType::MiscParams, 1 << 3);
        assert_eq!(
            ProgramType::from_entry(entry),
            Err(KcError::ReservedBits {
                category: Category::MiscParams,
                word: entry.raw()
            })
        );
    }
}
