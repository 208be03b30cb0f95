//! Kernel Version Capability
//!
//! The minimum kernel version a process requires.
//!
//! # Payload Layout
//! - Bits 0-3: minor version
//! - Bits 4-16: major version

use core::fmt;

use super::entry::{field, CapabilityEntry, EntryType};
use super::single::{SingleWord, WordCap};
use crate::error::{check_range, KcResult};

const MINOR_BITS: u32 = 4;
const MAJOR_BITS: u32 = 13;

/// Largest encodable major version.
pub const MAX_MAJOR: u16 = (1 << MAJOR_BITS) - 1;
/// Largest encodable minor version.
pub const MAX_MINOR: u8 = (1 << MINOR_BITS) - 1;

/// A kernel version. Orders by major, then minor.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct KernelVersion {
    major: u16,
    minor: u8,
}

impl KernelVersion {
    /// Create a version, checking both parts against their widths.
    pub fn new(major: u16, minor: u8) -> KcResult<Self> {
        check_range("kernel major version", major.into(), MAX_MAJOR.into())?;
        check_range("kernel minor version", minor.into(), MAX_MINOR.into())?;
        Ok(Self { major, minor })
    }

    /// Get the major version.
    #[inline]
    pub const fn major(&self) -> u16 {
        self.major
    }

    /// Get the minor version.
    #[inline]
    pub const fn minor(&self) -> u8 {
        self.minor
    }
}

impl fmt::Display for KernelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl SingleWord for KernelVersion {
    const ENTRY_TYPE: EntryType = EntryType::KernelVersion;

    fn to_payload(&self) -> u32 {
        u32::from(self.minor) | u32::from(self.major) << MINOR_BITS
    }

    fn from_entry(entry: CapabilityEntry) -> KcResult<Self> {
        let payload = entry.payload();
        Ok(Self {
            major: field(payload, MINOR_BITS, MAJOR_BITS) as u16,
            minor: field(payload, 0, MINOR_BITS) as u8,
        })
    }

    fn validate(&self) -> KcResult<()> {
        Self::new(self.major, self.minor).map(|_| ())
    }
}

/// Codec for the KernelVersion category.
pub type KernelVersionCap = WordCap<KernelVersion>;
