//! Descriptor Configuration
//!
//! A serde-friendly description of a kernel capability array by named
//! fields, for tooling that synthesizes descriptors from text formats.
//! Converting to a [`KernelCapabilityArray`] applies every field check.

use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::error::{KcError, KcResult};
use crate::kc::{
    HandleTableSize, KernelCapabilityArray, KernelVersion, MappingKind, MemoryPermission,
    MemoryRange, MiscFlags, ProgramType, ThreadInfo,
};

/// Priority and core bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThreadInfoConfig {
    /// Lowest scheduling priority.
    pub lowest_priority: u8,
    /// Highest scheduling priority.
    pub highest_priority: u8,
    /// First usable core.
    pub min_core_id: u8,
    /// Last usable core.
    pub max_core_id: u8,
}

/// One memory range by byte address and size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryRangeConfig {
    /// Page-aligned base address.
    pub address: u64,
    /// Page-aligned length in bytes.
    pub size: u64,
    /// Access granted.
    pub permission: MemoryPermission,
    /// IO or static mapping.
    pub kind: MappingKind,
}

/// Minimum kernel version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KernelVersionConfig {
    /// Major version.
    pub major: u16,
    /// Minor version.
    pub minor: u8,
}

/// Named debug flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MiscFlagsConfig {
    /// Sets [`MiscFlags::ENABLE_DEBUG`].
    pub enable_debug: bool,
    /// Sets [`MiscFlags::FORCE_DEBUG_PROD`].
    pub force_debug_prod: bool,
    /// Sets [`MiscFlags::FORCE_DEBUG`].
    pub force_debug: bool,
}

impl From<MiscFlagsConfig> for MiscFlags {
    fn from(config: MiscFlagsConfig) -> Self {
        let mut flags = MiscFlags::empty();
        flags.set(MiscFlags::ENABLE_DEBUG, config.enable_debug);
        flags.set(MiscFlags::FORCE_DEBUG_PROD, config.force_debug_prod);
        flags.set(MiscFlags::FORCE_DEBUG, config.force_debug);
        flags
    }
}

/// A whole capability array. Absent fields leave their category unset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CapabilityConfig {
    /// Priority and core bounds.
    pub thread_info: Option<ThreadInfoConfig>,
    /// Enabled call ids.
    pub system_calls: Vec<u32>,
    /// Memory ranges, in emission order.
    pub memory_map: Vec<MemoryRangeConfig>,
    /// Byte addresses of single IO pages.
    pub io_pages: Vec<u64>,
    /// Granted IRQ numbers.
    pub interrupts: Vec<u16>,
    /// Program type.
    pub program_type: Option<ProgramType>,
    /// Minimum kernel version.
    pub kernel_version: Option<KernelVersionConfig>,
    /// Handle table size.
    pub handle_table_size: Option<u16>,
    /// Debug flags.
    pub misc_flags: Option<MiscFlagsConfig>,
}

impl CapabilityConfig {
    /// Build the capability array this configuration describes.
    pub fn build(&self) -> KcResult<KernelCapabilityArray> {
        let mut kc = KernelCapabilityArray::new();

        if let Some(t) = &self.thread_info {
            kc.thread_info_mut().set(ThreadInfo::new(
                t.lowest_priority,
                t.highest_priority,
                t.min_core_id,
                t.max_core_id,
            )?)?;
        }
        for &id in &self.system_calls {
            kc.system_calls_mut().enable(id)?;
        }
        for range in &self.memory_map {
            kc.memory_map_mut().add_range(MemoryRange::new(
                range.address,
                range.size,
                range.permission,
                range.kind,
            )?);
        }
        for &address in &self.io_pages {
            kc.memory_map_mut().add_io_page(address)?;
        }
        for &irq in &self.interrupts {
            kc.interrupts_mut().insert(irq)?;
        }
        if let Some(program_type) = self.program_type {
            kc.misc_params_mut().set(program_type)?;
        }
        if let Some(v) = &self.kernel_version {
            kc.kernel_version_mut().set(KernelVersion::new(v.major, v.minor)?)?;
        }
        if let Some(size) = self.handle_table_size {
            kc.handle_table_size_mut().set(HandleTableSize::new(size)?)?;
        }
        if let Some(flags) = self.misc_flags {
            kc.misc_flags_mut().set(flags.into())?;
        }

        Ok(kc)
    }
}

impl TryFrom<&CapabilityConfig> for KernelCapabilityArray {
    type Error = KcError;

    fn try_from(config: &CapabilityConfig) -> KcResult<Self> {
        config.build()
    }
}
