//! Interrupt Capability
//!
//! Lists the hardware interrupts a process may own. Each word holds two
//! 10-bit IRQ numbers; [`IRQ_UNUSED`] marks an empty slot.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use super::entry::{expect_type, field, CapabilityEntry, Category, EntryType};
use super::CategoryCodec;
use crate::error::{check_range, KcResult};

const IRQ_BITS: u32 = 10;

/// Slot value meaning "no interrupt".
pub const IRQ_UNUSED: u16 = (1 << IRQ_BITS) - 1;

/// Largest ownable IRQ number.
pub const MAX_IRQ: u16 = IRQ_UNUSED - 1;

/// Codec for the Interrupts category.
///
/// Held as a set: duplicates collapse and words are emitted in ascending
/// IRQ order.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct InterruptCap {
    irqs: BTreeSet<u16>,
}

impl InterruptCap {
    /// No interrupts.
    pub const fn new() -> Self {
        Self {
            irqs: BTreeSet::new(),
        }
    }

    /// Add an IRQ. Returns whether it was newly added.
    pub fn insert(&mut self, irq: u16) -> KcResult<bool> {
        check_range("irq", irq.into(), MAX_IRQ.into())?;
        Ok(self.irqs.insert(irq))
    }

    /// Remove an IRQ. Returns whether it was present.
    pub fn remove(&mut self, irq: u16) -> bool {
        self.irqs.remove(&irq)
    }

    /// Check whether an IRQ is present.
    #[inline]
    pub fn contains(&self, irq: u16) -> bool {
        self.irqs.contains(&irq)
    }

    /// IRQs in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.irqs.iter().copied()
    }

    /// Number of IRQs.
    #[inline]
    pub fn len(&self) -> usize {
        self.irqs.len()
    }

    /// Check whether no IRQ is present.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.irqs.is_empty()
    }
}

impl CategoryCodec for InterruptCap {
    const CATEGORY: Category = Category::Interrupts;

    fn to_entries(&self, out: &mut Vec<CapabilityEntry>) {
        let mut irqs = self.irqs.iter().copied();
        while let Some(first) = irqs.next() {
            let second = irqs.next().unwrap_or(IRQ_UNUSED);
            let payload = u32::from(first) | u32::from(second) << IRQ_BITS;
            out.push(CapabilityEntry::new(EntryType::EnableInterrupts, payload));
        }
    }

    fn from_entries(entries: &[CapabilityEntry]) -> KcResult<Self> {
        let mut cap = Self::new();
        for (index, &entry) in entries.iter().enumerate() {
            expect_type(entry, index, Self::CATEGORY)?;
            let payload = entry.payload();
            for slot in [field(payload, 0, IRQ_BITS), field(payload, IRQ_BITS, IRQ_BITS)] {
                let irq = slot as u16;
                if irq != IRQ_UNUSED {
                    cap.irqs.insert(irq);
                }
            }
        }
        Ok(cap)
    }

    fn is_set(&self) -> bool {
        !self.is_empty()
    }
}
