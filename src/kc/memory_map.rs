//! Memory Map Capability
//!
//! Grants physical memory and IO regions a process may map.
//!
//! # Entry Shapes
//! ```text
//! MemoryMap (two adjacent words)
//!   word A: bits 0-23 base page number, bit 24 read-only
//!   word B: bits 0-23 page count,       bit 24 static (0 = IO)
//! IoMemoryMap (one word)
//!   bits 0-23 page number of a single read-write IO page
//! ```
//!
//! The two words of a range carry the same tag; they are paired by
//! position, so decoding tracks whether a second word is pending.

use alloc::vec::Vec;
use core::fmt;

use serde::{Deserialize, Serialize};

use super::entry::{expect_type, field, CapabilityEntry, Category, EntryType};
use super::CategoryCodec;
use crate::error::{check_range, KcError, KcResult};

/// Page size (4 KiB).
pub const PAGE_SIZE: u64 = 1 << PAGE_SHIFT;
/// Bits to shift for page number.
pub const PAGE_SHIFT: u32 = 12;
/// Page size mask.
pub const PAGE_MASK: u64 = PAGE_SIZE - 1;

const PAGE_NUMBER_BITS: u32 = 24;
const FLAG_BIT: u32 = 24;

/// Largest encodable page number or page count.
pub const MAX_PAGE_NUMBER: u64 = (1 << PAGE_NUMBER_BITS) - 1;

/// Access permission of a mapping.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryPermission {
    /// Read-only.
    ReadOnly,
    /// Read and write.
    ReadWrite,
}

impl MemoryPermission {
    /// Check whether a mapping with this permission may be requested as
    /// `requested`. Permissions can only be reduced, never increased.
    #[inline]
    pub const fn permits(self, requested: Self) -> bool {
        matches!(
            (self, requested),
            (Self::ReadWrite, _) | (Self::ReadOnly, Self::ReadOnly)
        )
    }

    /// Short name used in reports.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadOnly => "R",
            Self::ReadWrite => "RW",
        }
    }
}

impl fmt::Display for MemoryPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of mapping.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingKind {
    /// Device IO memory.
    Io,
    /// Statically mapped memory.
    Static,
}

impl MappingKind {
    /// Short name used in reports.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Io => "IO",
            Self::Static => "Static",
        }
    }
}

impl fmt::Display for MappingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A page-aligned physical memory range.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct MemoryRange {
    address: u64,
    size: u64,
    permission: MemoryPermission,
    kind: MappingKind,
}

impl MemoryRange {
    /// Create a range from a byte address and byte size.
    ///
    /// Both must be page-aligned and expressible in 24 page-number bits.
    pub fn new(
        address: u64,
        size: u64,
        permission: MemoryPermission,
        kind: MappingKind,
    ) -> KcResult<Self> {
        let base_page = page_number("address", address)?;
        let page_count = page_number("size", size)?;
        Self::from_pages(base_page, page_count, permission, kind)
    }

    /// Create a range from a base page number and page count.
    pub fn from_pages(
        base_page: u64,
        page_count: u64,
        permission: MemoryPermission,
        kind: MappingKind,
    ) -> KcResult<Self> {
        check_range("base page", base_page, MAX_PAGE_NUMBER)?;
        check_range("page count", page_count, MAX_PAGE_NUMBER)?;
        Ok(Self {
            address: base_page << PAGE_SHIFT,
            size: page_count << PAGE_SHIFT,
            permission,
            kind,
        })
    }

    /// A single read-write IO page.
    pub fn io_page(address: u64) -> KcResult<Self> {
        Self::new(address, PAGE_SIZE, MemoryPermission::ReadWrite, MappingKind::Io)
    }

    /// Get the base address.
    #[inline]
    pub const fn address(&self) -> u64 {
        self.address
    }

    /// Get the size in bytes.
    #[inline]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Get the exclusive end address.
    #[inline]
    pub const fn end(&self) -> u64 {
        self.address + self.size
    }

    /// Get the permission.
    #[inline]
    pub const fn permission(&self) -> MemoryPermission {
        self.permission
    }

    /// Get the mapping kind.
    #[inline]
    pub const fn kind(&self) -> MappingKind {
        self.kind
    }

    /// Check whether `other`'s byte range lies entirely within this one.
    #[inline]
    pub const fn contains(&self, other: &Self) -> bool {
        other.address >= self.address && other.end() <= self.end()
    }

    /// Check whether this range may be requested as `requested`: same
    /// kind, containing range, and no wider permission.
    pub fn permits(&self, requested: &Self) -> bool {
        self.kind == requested.kind
            && self.permission.permits(requested.permission)
            && self.contains(requested)
    }

    fn to_entries(self, out: &mut Vec<CapabilityEntry>) {
        let read_only = u32::from(self.permission == MemoryPermission::ReadOnly);
        let is_static = u32::from(self.kind == MappingKind::Static);
        let base_page = (self.address >> PAGE_SHIFT) as u32;
        let page_count = (self.size >> PAGE_SHIFT) as u32;
        out.push(CapabilityEntry::new(
            EntryType::MemoryMap,
            base_page | read_only << FLAG_BIT,
        ));
        out.push(CapabilityEntry::new(
            EntryType::MemoryMap,
            page_count | is_static << FLAG_BIT,
        ));
    }

    fn from_pair(first: CapabilityEntry, second: CapabilityEntry) -> Self {
        let (a, b) = (first.payload(), second.payload());
        let permission = if field(a, FLAG_BIT, 1) != 0 {
            MemoryPermission::ReadOnly
        } else {
            MemoryPermission::ReadWrite
        };
        let kind = if field(b, FLAG_BIT, 1) != 0 {
            MappingKind::Static
        } else {
            MappingKind::Io
        };
        Self {
            address: u64::from(field(a, 0, PAGE_NUMBER_BITS)) << PAGE_SHIFT,
            size: u64::from(field(b, 0, PAGE_NUMBER_BITS)) << PAGE_SHIFT,
            permission,
            kind,
        }
    }
}

impl fmt::Display for MemoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:#x}, {:#x}) {} {}",
            self.address,
            self.end(),
            self.permission,
            self.kind
        )
    }
}

fn page_number(name: &'static str, bytes: u64) -> KcResult<u64> {
    if bytes & PAGE_MASK != 0 {
        return Err(KcError::InvalidValue {
            field: name,
            value: bytes,
        });
    }
    Ok(bytes >> PAGE_SHIFT)
}

/// Pairing state for the two-word MemoryMap entry.
///
/// Fed every entry type in scan order. A MemoryMap word opens a pair and
/// the next word must close it.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct RangeScan {
    pending: bool,
}

impl RangeScan {
    /// Start with no pair open.
    pub const fn new() -> Self {
        Self { pending: false }
    }

    /// Whether the next word must be the second word of a range.
    #[inline]
    pub const fn is_pending(&self) -> bool {
        self.pending
    }

    /// Advance over one word.
    pub fn feed(&mut self, entry_type: EntryType) -> KcResult<()> {
        match (self.pending, entry_type) {
            (true, EntryType::MemoryMap) => self.pending = false,
            (true, _) => return Err(incomplete()),
            (false, EntryType::MemoryMap) => self.pending = true,
            (false, _) => {}
        }
        Ok(())
    }

    /// Finish the scan; a pair left open is an error.
    pub fn finish(self) -> KcResult<()> {
        if self.pending {
            return Err(incomplete());
        }
        Ok(())
    }
}

fn incomplete() -> KcError {
    KcError::IncompleteEntry {
        category: Category::MemoryMap,
    }
}

/// Codec for the MemoryMap category.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct MemoryMapCap {
    ranges: Vec<MemoryRange>,
    io_pages: Vec<MemoryRange>,
}

impl MemoryMapCap {
    /// No mappings.
    pub const fn new() -> Self {
        Self {
            ranges: Vec::new(),
            io_pages: Vec::new(),
        }
    }

    /// Add a two-word range.
    pub fn add_range(&mut self, range: MemoryRange) {
        self.ranges.push(range);
    }

    /// Add a single IO page at a page-aligned address.
    pub fn add_io_page(&mut self, address: u64) -> KcResult<()> {
        self.io_pages.push(MemoryRange::io_page(address)?);
        Ok(())
    }

    /// Ranges in insertion order.
    #[inline]
    pub fn ranges(&self) -> &[MemoryRange] {
        &self.ranges
    }

    /// IO pages in insertion order.
    #[inline]
    pub fn io_pages(&self) -> &[MemoryRange] {
        &self.io_pages
    }

    /// Remove the range at `index`, if present.
    pub fn remove_range(&mut self, index: usize) -> Option<MemoryRange> {
        (index < self.ranges.len()).then(|| self.ranges.remove(index))
    }

    /// Remove the IO page at `index`, if present.
    pub fn remove_io_page(&mut self, index: usize) -> Option<MemoryRange> {
        (index < self.io_pages.len()).then(|| self.io_pages.remove(index))
    }

    /// Every mapping: ranges, then IO pages.
    pub fn mappings(&self) -> impl Iterator<Item = &MemoryRange> + '_ {
        self.ranges.iter().chain(self.io_pages.iter())
    }
}

impl CategoryCodec for MemoryMapCap {
    const CATEGORY: Category = Category::MemoryMap;

    fn to_entries(&self, out: &mut Vec<CapabilityEntry>) {
        for range in &self.ranges {
            range.to_entries(out);
        }
        for page in &self.io_pages {
            let page_number = (page.address >> PAGE_SHIFT) as u32;
            out.push(CapabilityEntry::new(EntryType::IoMemoryMap, page_number));
        }
    }

    fn from_entries(entries: &[CapabilityEntry]) -> KcResult<Self> {
        let mut cap = Self::new();
        let mut scan = RangeScan::new();
        let mut first = None;
        for (index, &entry) in entries.iter().enumerate() {
            let entry_type = expect_type(entry, index, Self::CATEGORY)?;
            scan.feed(entry_type)?;
            match entry_type {
                EntryType::MemoryMap => match first.take() {
                    Some(word) => cap.ranges.push(MemoryRange::from_pair(word, entry)),
                    None => first = Some(entry),
                },
                _ => {
                    let page = field(entry.payload(), 0, PAGE_NUMBER_BITS);
                    let address = u64::from(page) << PAGE_SHIFT;
                    cap.io_pages.push(MemoryRange {
                        address,
                        size: PAGE_SIZE,
                        permission: MemoryPermission::ReadWrite,
                        kind: MappingKind::Io,
                    });
                }
            }
        }
        scan.finish()?;
        Ok(cap)
    }

    fn is_set(&self) -> bool {
        !self.ranges.is_empty() || !self.io_pages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rw_static(address: u64, size: u64) -> MemoryRange {
        MemoryRange::new(address, size, MemoryPermission::ReadWrite, MappingKind::Static).unwrap()
    }

    #[test]
    fn test_range_checks() {
        assert_eq!(
            MemoryRange::new(0x1001, 0x1000, MemoryPermission::ReadOnly, MappingKind::Io),
            Err(KcError::InvalidValue {
                field: "address",
                value: 0x1001
            })
        );
        let ro = MemoryPermission::ReadOnly;
        assert!(MemoryRange::from_pages(1 << 24, 1, ro, MappingKind::Io).is_err());
        let max = MAX_PAGE_NUMBER;
        assert!(MemoryRange::from_pages(max, max, ro, MappingKind::Io).is_ok());
    }

    #[test]
    fn test_containment() {
        let outer = rw_static(0x0, 0x4000);
        let inner = rw_static(0x1000, 0x1000);
        assert!(outer.contains(&inner));
        assert!(outer.permits(&inner));
        assert!(!inner.contains(&outer));
        assert!(!outer.contains(&rw_static(0x3000, 0x2000)));

        let ro =
            MemoryRange::new(0x0, 0x4000, MemoryPermission::ReadOnly, MappingKind::Static).unwrap();
        assert!(!ro.permits(&inner));

        let io =
            MemoryRange::new(0x0, 0x4000, MemoryPermission::ReadWrite, MappingKind::Io).unwrap();
        assert!(!io.permits(&inner));
    }

    #[test]
    fn test_permission_order() {
        assert!(MemoryPermission::ReadWrite.permits(MemoryPermission::ReadOnly));
        assert!(MemoryPermission::ReadOnly.permits(MemoryPermission::ReadOnly));
        assert!(!MemoryPermission::ReadOnly.permits(MemoryPermission::ReadWrite));
    }

    #[test]
    fn test_word_layout() {
        let mut cap = MemoryMapCap::new();
        let range = MemoryRange::new(
            0x7000_0000,
            0x2000,
            MemoryPermission::ReadOnly,
            MappingKind::Static,
        )
        .unwrap();
        cap.add_range(range);
        cap.add_io_page(0x6000_7000).unwrap();

        let mut out = Vec::new();
        cap.to_entries(&mut out);
        assert_eq!(out.len(), 3);
        // Address word: page 0x70000, read-only
        assert_eq!(out[0].raw(), 0x3F | 0x70000 << 7 | 1 << 31);
        // Size word: 2 pages, static
        assert_eq!(out[1].raw(), 0x3F | 2 << 7 | 1 << 31);
        // IO page word
        assert_eq!(out[2].raw(), 0x7F | 0x60007 << 8);

        assert_eq!(MemoryMapCap::from_entries(&out).unwrap(), cap);
    }

    #[test]
    fn test_unpaired_word() {
        let range = rw_static(0x1000, 0x1000);
        let mut out = Vec::new();
        range.to_entries(&mut out);

        assert_eq!(MemoryMapCap::from_entries(&out[..1]), Err(incomplete()));

        // An IO page may not split a pair
        let io = CapabilityEntry::new(EntryType::IoMemoryMap, 1);
        assert_eq!(MemoryMapCap::from_entries(&[out[0], io, out[1]]), Err(incomplete()));
    }

    #[test]
    fn test_range_scan() {
        let mut scan = RangeScan::new();
        scan.feed(EntryType::ThreadInfo).unwrap();
        scan.feed(EntryType::MemoryMap).unwrap();
        assert!(scan.is_pending());
        assert_eq!(scan.feed(EntryType::KernelVersion), Err(incomplete()));

        let mut scan = RangeScan::new();
        scan.feed(EntryType::MemoryMap).unwrap();
        scan.feed(EntryType::MemoryMap).unwrap();
        assert!(!scan.is_pending());
        assert!(scan.finish().is_ok());
    }
}
