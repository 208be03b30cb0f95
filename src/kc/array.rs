//! Kernel Capability Array
//!
//! The aggregate codec: one codec per category plus the last raw buffer.
//!
//! # Canonical Order
//! Encoding always emits ThreadInfo, SystemCalls, MemoryMap, Interrupts,
//! MiscParams, KernelVersion, HandleTableSize, MiscFlags. Re-encoding a
//! decoded array whose input used another order yields different bytes
//! with the same meaning.

use alloc::vec::Vec;

use log::{debug, trace};

use super::entry::{CapabilityEntry, Category, WORD_SIZE};
use super::memory_map::RangeScan;
use super::{
    CategoryCodec, HandleTableSizeCap, InterruptCap, KernelVersionCap, MemoryMapCap,
    MiscFlagsCap, MiscParamsCap, SystemCallCap, ThreadInfoCap,
};
use crate::error::{KcError, KcResult};

/// A decoded kernel capability array.
///
/// Equality compares category contents only; the cached raw buffer is
/// ignored.
#[derive(Clone, Debug, Default)]
pub struct KernelCapabilityArray {
    thread_info: ThreadInfoCap,
    system_calls: SystemCallCap,
    memory_map: MemoryMapCap,
    interrupts: InterruptCap,
    misc_params: MiscParamsCap,
    kernel_version: KernelVersionCap,
    handle_table_size: HandleTableSizeCap,
    misc_flags: MiscFlagsCap,
    raw: Vec<u8>,
}

impl KernelCapabilityArray {
    /// Create an empty array.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a capability array from its wire bytes.
    ///
    /// # Errors
    /// - [`KcError::Alignment`] if the length is not a multiple of 4
    /// - [`KcError::UnrecognizedTag`] on the first word with an undefined tag
    /// - [`KcError::IncompleteEntry`] if a memory range lacks its second word
    /// - [`KcError::ReservedBits`] / [`KcError::InvalidValue`] from a category
    pub fn from_bytes(bytes: &[u8]) -> KcResult<Self> {
        if bytes.len() % WORD_SIZE != 0 {
            return Err(KcError::Alignment { len: bytes.len() });
        }

        debug!("decoding {} capability words", bytes.len() / WORD_SIZE);

        let mut buckets: [Vec<CapabilityEntry>; Category::COUNT] = Default::default();
        let mut ranges = RangeScan::new();
        for (index, chunk) in bytes.chunks_exact(WORD_SIZE).enumerate() {
            let entry = CapabilityEntry::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let entry_type = entry.decode_tag(index)?;
            ranges.feed(entry_type)?;
            trace!("word {}: {:?}", index, entry);
            buckets[entry_type.category().index()].push(entry);
        }
        ranges.finish()?;

        let [
            thread_info,
            system_calls,
            memory_map,
            interrupts,
            misc_params,
            kernel_version,
            handle_table_size,
            misc_flags,
        ] = &buckets;
        Ok(Self {
            thread_info: ThreadInfoCap::from_entries(thread_info)?,
            system_calls: SystemCallCap::from_entries(system_calls)?,
            memory_map: MemoryMapCap::from_entries(memory_map)?,
            interrupts: InterruptCap::from_entries(interrupts)?,
            misc_params: MiscParamsCap::from_entries(misc_params)?,
            kernel_version: KernelVersionCap::from_entries(kernel_version)?,
            handle_table_size: HandleTableSizeCap::from_entries(handle_table_size)?,
            misc_flags: MiscFlagsCap::from_entries(misc_flags)?,
            raw: bytes.to_vec(),
        })
    }

    /// Decode into this array, replacing its contents.
    ///
    /// On error the array is left exactly as it was.
    pub fn decode(&mut self, bytes: &[u8]) -> KcResult<()> {
        *self = Self::from_bytes(bytes)?;
        Ok(())
    }

    /// All words in canonical order.
    pub fn entries(&self) -> Vec<CapabilityEntry> {
        let mut out = Vec::new();
        self.thread_info.to_entries(&mut out);
        self.system_calls.to_entries(&mut out);
        self.memory_map.to_entries(&mut out);
        self.interrupts.to_entries(&mut out);
        self.misc_params.to_entries(&mut out);
        self.kernel_version.to_entries(&mut out);
        self.handle_table_size.to_entries(&mut out);
        self.misc_flags.to_entries(&mut out);
        out
    }

    /// Encode to wire bytes in canonical order.
    pub fn encode(&self) -> Vec<u8> {
        let entries = self.entries();
        let mut bytes = Vec::with_capacity(entries.len() * WORD_SIZE);
        for entry in &entries {
            bytes.extend_from_slice(&entry.to_le_bytes());
        }
        debug!("encoded {} capability words", entries.len());
        bytes
    }

    /// Encode and keep the result as the cached raw buffer.
    pub fn to_bytes(&mut self) -> &[u8] {
        self.raw = self.encode();
        &self.raw
    }

    /// The cached raw buffer: the last decoded input or [`Self::to_bytes`]
    /// output. Not updated by mutation.
    #[inline]
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Reset every category and drop the cached buffer.
    pub fn clear(&mut self) {
        self.thread_info.clear();
        self.system_calls.clear();
        self.memory_map.clear();
        self.interrupts.clear();
        self.misc_params.clear();
        self.kernel_version.clear();
        self.handle_table_size.clear();
        self.misc_flags.clear();
        self.raw.clear();
    }

    /// Check whether a category would emit any words.
    pub fn is_set(&self, category: Category) -> bool {
        match category {
            Category::ThreadInfo => self.thread_info.is_set(),
            Category::SystemCalls => self.system_calls.is_set(),
            Category::MemoryMap => self.memory_map.is_set(),
            Category::Interrupts => self.interrupts.is_set(),
            Category::MiscParams => self.misc_params.is_set(),
            Category::KernelVersion => self.kernel_version.is_set(),
            Category::HandleTableSize => self.handle_table_size.is_set(),
            Category::MiscFlags => self.misc_flags.is_set(),
        }
    }

    /// Check whether no category is set.
    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|&category| !self.is_set(category))
    }

    /// Get the ThreadInfo codec.
    #[inline]
    pub fn thread_info(&self) -> &ThreadInfoCap {
        &self.thread_info
    }

    /// Get the ThreadInfo codec for mutation.
    #[inline]
    pub fn thread_info_mut(&mut self) -> &mut ThreadInfoCap {
        &mut self.thread_info
    }

    /// Get the SystemCalls codec.
    #[inline]
    pub fn system_calls(&self) -> &SystemCallCap {
        &self.system_calls
    }

    /// Get the SystemCalls codec for mutation.
    #[inline]
    pub fn system_calls_mut(&mut self) -> &mut SystemCallCap {
        &mut self.system_calls
    }

    /// Get the MemoryMap codec.
    #[inline]
    pub fn memory_map(&self) -> &MemoryMapCap {
        &self.memory_map
    }

    /// Get the MemoryMap codec for mutation.
    #[inline]
    pub fn memory_map_mut(&mut self) -> &mut MemoryMapCap {
        &mut self.memory_map
    }

    /// Get the Interrupts codec.
    #[inline]
    pub fn interrupts(&self) -> &InterruptCap {
        &self.interrupts
    }

    /// Get the Interrupts codec for mutation.
    #[inline]
    pub fn interrupts_mut(&mut self) -> &mut InterruptCap {
        &mut self.interrupts
    }

    /// Get the MiscParams codec.
    #[inline]
    pub fn misc_params(&self) -> &MiscParamsCap {
        &self.misc_params
    }

    /// Get the MiscParams codec for mutation.
    #[inline]
    pub fn misc_params_mut(&mut self) -> &mut MiscParamsCap {
        &mut self.misc_params
    }

    /// Get the KernelVersion codec.
    #[inline]
    pub fn kernel_version(&self) -> &KernelVersionCap {
        &self.kernel_version
    }

    /// Get the KernelVersion codec for mutation.
    #[inline]
    pub fn kernel_version_mut(&mut self) -> &mut KernelVersionCap {
        &mut self.kernel_version
    }

    /// Get the HandleTableSize codec.
    #[inline]
    pub fn handle_table_size(&self) -> &HandleTableSizeCap {
        &self.handle_table_size
    }

    /// Get the HandleTableSize codec for mutation.
    #[inline]
    pub fn handle_table_size_mut(&mut self) -> &mut HandleTableSizeCap {
        &mut self.handle_table_size
    }

    /// Get the MiscFlags codec.
    #[inline]
    pub fn misc_flags(&self) -> &MiscFlagsCap {
        &self.misc_flags
    }

    /// Get the MiscFlags codec for mutation.
    #[inline]
    pub fn misc_flags_mut(&mut self) -> &mut MiscFlagsCap {
        &mut self.misc_flags
    }
}

impl PartialEq for KernelCapabilityArray {
    fn eq(&self, other: &Self) -> bool {
        self.thread_info == other.thread_info
            && self.system_calls == other.system_calls
            && self.memory_map == other.memory_map
            && self.interrupts == other.interrupts
            && self.misc_params == other.misc_params
            && self.kernel_version == other.kernel_version
            && self.handle_table_size == other.handle_table_size
            && self.misc_flags == other.misc_flags
    }
}

impl Eq for KernelCapabilityArray {}

impl TryFrom<&[u8]> for KernelCapabilityArray {
    type Error = KcError;

    fn try_from(bytes: &[u8]) -> KcResult<Self> {
        Self::from_bytes(bytes)
    }
}
