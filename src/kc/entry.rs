//! Capability Words and Tags
//!
//! A kernel capability array is a flat sequence of 32-bit little-endian
//! words. The low bits of each word carry a unary tag: `N` consecutive
//! 1-bits followed by a 0-bit select entry type `N`, and the payload
//! starts at bit `N + 1`.
//!
//! # Word Layout
//! ```text
//! ┌───────────────────────────────┬───┬──────────────┐
//! │ payload (31 - N bits)         │ 0 │ 1 1 ... 1    │
//! └───────────────────────────────┴───┴──────────────┘
//!  31                          N+1  N   N-1         0
//! ```

use core::fmt;

use crate::error::{KcError, KcResult};

/// Size of one capability word in bytes.
pub const WORD_SIZE: usize = 4;

/// Capability categories, in canonical emission order.
///
/// Each category has exactly one codec in a
/// [`KernelCapabilityArray`](super::KernelCapabilityArray).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(u8)]
pub enum Category {
    /// Scheduler priority and core range.
    ThreadInfo = 0,
    /// Enabled supervisor calls.
    SystemCalls = 1,
    /// Static and IO memory mappings.
    MemoryMap = 2,
    /// Owned hardware interrupts.
    Interrupts = 3,
    /// Program type.
    MiscParams = 4,
    /// Minimum kernel version.
    KernelVersion = 5,
    /// Handle table budget.
    HandleTableSize = 6,
    /// Debug flags.
    MiscFlags = 7,
}

impl Category {
    /// Number of categories.
    pub const COUNT: usize = 8;

    /// All categories in canonical emission order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::ThreadInfo,
        Self::SystemCalls,
        Self::MemoryMap,
        Self::Interrupts,
        Self::MiscParams,
        Self::KernelVersion,
        Self::HandleTableSize,
        Self::MiscFlags,
    ];

    /// Position of this category in canonical order.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Human-readable name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ThreadInfo => "ThreadInfo",
            Self::SystemCalls => "SystemCalls",
            Self::MemoryMap => "MemoryMap",
            Self::Interrupts => "Interrupts",
            Self::MiscParams => "MiscParams",
            Self::KernelVersion => "KernelVersion",
            Self::HandleTableSize => "HandleTableSize",
            Self::MiscFlags => "MiscFlags",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw entry types defined by the tag table.
///
/// The discriminant is the tag length (number of low 1-bits). Two entry
/// types map to [`Category::MemoryMap`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum EntryType {
    /// Priority and core range.
    ThreadInfo = 3,
    /// One 24-call window of the syscall mask.
    EnableSystemCalls = 4,
    /// One word of a two-word memory range.
    MemoryMap = 6,
    /// A single IO page.
    IoMemoryMap = 7,
    /// Up to two IRQ numbers.
    EnableInterrupts = 11,
    /// Program type.
    MiscParams = 13,
    /// Minimum kernel version.
    KernelVersion = 14,
    /// Handle table size.
    HandleTableSize = 15,
    /// Debug flags.
    MiscFlags = 16,
}

impl EntryType {
    /// Look up an entry type by tag length.
    pub const fn from_tag_len(len: u32) -> Option<Self> {
        match len {
            3 => Some(Self::ThreadInfo),
            4 => Some(Self::EnableSystemCalls),
            6 => Some(Self::MemoryMap),
            7 => Some(Self::IoMemoryMap),
            11 => Some(Self::EnableInterrupts),
            13 => Some(Self::MiscParams),
            14 => Some(Self::KernelVersion),
            15 => Some(Self::HandleTableSize),
            16 => Some(Self::MiscFlags),
            _ => None,
        }
    }

    /// Number of low 1-bits in the tag.
    #[inline]
    pub const fn tag_len(self) -> u32 {
        self as u32
    }

    /// The tag bit pattern (the 0-bit terminator is implicit).
    #[inline]
    pub const fn tag(self) -> u32 {
        (1 << self.tag_len()) - 1
    }

    /// Bit position where the payload starts.
    #[inline]
    pub const fn payload_shift(self) -> u32 {
        self.tag_len() + 1
    }

    /// Width of the payload in bits.
    #[inline]
    pub const fn payload_bits(self) -> u32 {
        32 - self.payload_shift()
    }

    /// Category this entry type belongs to.
    pub const fn category(self) -> Category {
        match self {
            Self::ThreadInfo => Category::ThreadInfo,
            Self::EnableSystemCalls => Category::SystemCalls,
            Self::MemoryMap | Self::IoMemoryMap => Category::MemoryMap,
            Self::EnableInterrupts => Category::Interrupts,
            Self::MiscParams => Category::MiscParams,
            Self::KernelVersion => Category::KernelVersion,
            Self::HandleTableSize => Category::HandleTableSize,
            Self::MiscFlags => Category::MiscFlags,
        }
    }
}

/// A single tagged capability word.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct CapabilityEntry(u32);

impl CapabilityEntry {
    /// Wrap a raw word.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Build a word from an entry type and its payload.
    ///
    /// Payload bits that do not fit above the tag are discarded; callers
    /// pass payloads assembled from range-checked fields.
    #[inline]
    pub const fn new(entry_type: EntryType, payload: u32) -> Self {
        let shift = entry_type.payload_shift();
        let mask = (1u32 << entry_type.payload_bits()) - 1;
        Self(((payload & mask) << shift) | entry_type.tag())
    }

    /// Get the raw word.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Length of the unary tag.
    #[inline]
    pub const fn tag_len(self) -> u32 {
        self.0.trailing_ones()
    }

    /// Entry type, if the tag is defined.
    #[inline]
    pub const fn entry_type(self) -> Option<EntryType> {
        EntryType::from_tag_len(self.tag_len())
    }

    /// Category, if the tag is defined.
    #[inline]
    pub const fn category(self) -> Option<Category> {
        match self.entry_type() {
            Some(ty) => Some(ty.category()),
            None => None,
        }
    }

    /// Decode the tag, reporting the word's array position on failure.
    pub fn decode_tag(self, index: usize) -> KcResult<EntryType> {
        self.entry_type().ok_or(KcError::UnrecognizedTag {
            index,
            word: self.0,
        })
    }

    /// Payload bits above the tag.
    #[inline]
    pub const fn payload(self) -> u32 {
        match self.0.checked_shr(self.tag_len() + 1) {
            Some(payload) => payload,
            None => 0,
        }
    }

    /// Little-endian wire bytes.
    #[inline]
    pub const fn to_le_bytes(self) -> [u8; WORD_SIZE] {
        self.0.to_le_bytes()
    }

    /// Read a word from little-endian wire bytes.
    #[inline]
    pub const fn from_le_bytes(bytes: [u8; WORD_SIZE]) -> Self {
        Self(u32::from_le_bytes(bytes))
    }
}

impl fmt::Debug for CapabilityEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.entry_type() {
            Some(ty) => write!(f, "KcEntry({:?}, {:#010x})", ty, self.0),
            None => write!(f, "KcEntry(invalid, {:#010x})", self.0),
        }
    }
}

/// Extract a `width`-bit field starting at `shift` from a payload.
#[inline]
pub(crate) const fn field(payload: u32, shift: u32, width: u32) -> u32 {
    (payload >> shift) & ((1 << width) - 1)
}

/// Check that `entry` has one of the expected entry types.
///
/// Codecs use this when handed entries directly rather than through the
/// array's dispatch.
pub(crate) fn expect_type(
    entry: CapabilityEntry,
    index: usize,
    expected: Category,
) -> KcResult<EntryType> {
    let ty = entry.decode_tag(index)?;
    if ty.category() != expected {
        return Err(KcError::UnrecognizedTag {
            index,
            word: entry.raw(),
        });
    }
    Ok(ty)
}
