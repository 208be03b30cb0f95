//! System Call Capability
//!
//! Enables supervisor calls in windows of 24 ids. Each word carries one
//! window: a 24-bit mask and a 3-bit block index, so call id
//! `index * 24 + bit` is enabled when `bit` is set.
//!
//! # Payload Layout
//! - Bits 0-23: enabled-call mask
//! - Bits 24-26: block index

use alloc::vec::Vec;

use super::entry::{expect_type, field, CapabilityEntry, Category, EntryType};
use super::CategoryCodec;
use crate::error::{check_range, KcResult};

/// Number of call ids per block.
pub const BLOCK_BITS: u32 = 24;

/// Number of blocks addressable by the 3-bit index.
pub const BLOCK_COUNT: usize = 8;

/// Largest enableable call id.
pub const MAX_SYSCALL_ID: u32 = BLOCK_BITS * BLOCK_COUNT as u32 - 1;

/// Mask of valid bits within a block.
pub const BLOCK_MASK: u32 = (1 << BLOCK_BITS) - 1;

const INDEX_BITS: u32 = 3;

/// Codec for the SystemCalls category.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct SystemCallCap {
    blocks: [u32; BLOCK_COUNT],
}

impl SystemCallCap {
    /// No calls enabled.
    pub const fn new() -> Self {
        Self {
            blocks: [0; BLOCK_COUNT],
        }
    }

    /// Enable one call id.
    pub fn enable(&mut self, id: u32) -> KcResult<()> {
        check_range("syscall id", id.into(), MAX_SYSCALL_ID.into())?;
        self.blocks[(id / BLOCK_BITS) as usize] |= 1 << (id % BLOCK_BITS);
        Ok(())
    }

    /// Disable one call id.
    pub fn disable(&mut self, id: u32) -> KcResult<()> {
        check_range("syscall id", id.into(), MAX_SYSCALL_ID.into())?;
        self.blocks[(id / BLOCK_BITS) as usize] &= !(1 << (id % BLOCK_BITS));
        Ok(())
    }

    /// Check whether a call id is enabled. Ids past the table are never enabled.
    pub fn is_enabled(&self, id: u32) -> bool {
        id <= MAX_SYSCALL_ID
            && self.blocks[(id / BLOCK_BITS) as usize] & (1 << (id % BLOCK_BITS)) != 0
    }

    /// Get the mask of one block.
    pub fn block(&self, index: usize) -> Option<u32> {
        self.blocks.get(index).copied()
    }

    /// Replace the mask of one block.
    pub fn set_block(&mut self, index: usize, mask: u32) -> KcResult<()> {
        check_range("syscall block index", index as u64, (BLOCK_COUNT - 1) as u64)?;
        check_range("syscall block mask", mask.into(), BLOCK_MASK.into())?;
        self.blocks[index] = mask;
        Ok(())
    }

    /// OR a mask into one block.
    pub fn merge_block(&mut self, index: usize, mask: u32) -> KcResult<()> {
        check_range("syscall block index", index as u64, (BLOCK_COUNT - 1) as u64)?;
        check_range("syscall block mask", mask.into(), BLOCK_MASK.into())?;
        self.blocks[index] |= mask;
        Ok(())
    }

    /// Non-empty blocks as `(index, mask)`, ascending by index.
    pub fn blocks(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, &mask)| mask != 0)
            .map(|(index, &mask)| (index, mask))
    }

    /// Enabled call ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        (0..=MAX_SYSCALL_ID).filter(move |&id| self.is_enabled(id))
    }

    /// Check whether no call is enabled.
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|&mask| mask == 0)
    }
}

impl CategoryCodec for SystemCallCap {
    const CATEGORY: Category = Category::SystemCalls;

    fn to_entries(&self, out: &mut Vec<CapabilityEntry>) {
        for (index, mask) in self.blocks() {
            let payload = mask | (index as u32) << BLOCK_BITS;
            out.push(CapabilityEntry::new(EntryType::EnableSystemCalls, payload));
        }
    }

    fn from_entries(entries: &[CapabilityEntry]) -> KcResult<Self> {
        let mut cap = Self::new();
        for (position, &entry) in entries.iter().enumerate() {
            expect_type(entry, position, Self::CATEGORY)?;
            let payload = entry.payload();
            let index = field(payload, BLOCK_BITS, INDEX_BITS) as usize;
            // Repeated windows accumulate
            cap.blocks[index] |= field(payload, 0, BLOCK_BITS);
        }
        Ok(cap)
    }

    fn is_set(&self) -> bool {
        !self.is_empty()
    }
}
