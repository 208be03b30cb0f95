//! Kernel Capability Codecs
//!
//! Converts between the packed capability word array and one semantic
//! value per category.
//!
//! # Design
//! - [`CapabilityEntry`] is one tagged word
//! - Each category has a codec implementing [`CategoryCodec`]
//! - [`KernelCapabilityArray`] owns one codec per category and
//!   dispatches decoded words to them by tag
//!
//! # Security Properties
//! - Field widths are checked when a value is built or mutated
//! - Unknown tags and reserved bits are decode errors, never dropped
//! - Encoding is infallible and uses one fixed category order

pub mod array;
pub mod entry;
pub mod handle_table;
pub mod interrupts;
pub mod kernel_version;
pub mod memory_map;
pub mod misc_flags;
pub mod misc_params;
pub mod single;
pub mod system_calls;
pub mod thread_info;

use alloc::vec::Vec;
use core::fmt;

use crate::error::KcResult;

pub use array::KernelCapabilityArray;
pub use entry::{CapabilityEntry, Category, EntryType, WORD_SIZE};
pub use handle_table::{HandleTableSize, HandleTableSizeCap};
pub use interrupts::{InterruptCap, IRQ_UNUSED, MAX_IRQ};
pub use kernel_version::{KernelVersion, KernelVersionCap};
pub use memory_map::{MappingKind, MemoryMapCap, MemoryPermission, MemoryRange, PAGE_SIZE};
pub use misc_flags::{MiscFlags, MiscFlagsCap};
pub use misc_params::{MiscParamsCap, ProgramType};
pub use single::{SingleWord, WordCap};
pub use system_calls::{SystemCallCap, MAX_SYSCALL_ID};
pub use thread_info::{ThreadInfo, ThreadInfoCap};

/// Conversion between one category's semantic state and its words.
pub trait CategoryCodec: Default + Clone + PartialEq + fmt::Debug {
    /// The category this codec handles.
    const CATEGORY: Category;

    /// Append this category's words in canonical order.
    fn to_entries(&self, out: &mut Vec<CapabilityEntry>);

    /// Build state from words already filtered to this category.
    fn from_entries(entries: &[CapabilityEntry]) -> KcResult<Self>;

    /// Whether anything would be emitted.
    fn is_set(&self) -> bool;

    /// Reset to the empty state.
    fn clear(&mut self) {
        *self = Self::default();
    }
}
