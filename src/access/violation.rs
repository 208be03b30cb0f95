//! Validation Findings
//!
//! A [`Violation`] is one declared capability that exceeds what the
//! descriptor permits. Findings are data, not errors.

use core::fmt;

use crate::kc::{Category, KernelVersion, MemoryRange, MiscFlags, ProgramType};

/// What exceeded the permitted bound.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ViolationDetail {
    /// The category is declared but the descriptor grants nothing for it.
    NotPermitted,
    /// Declared priorities leave the permitted interval.
    PriorityRange {
        /// Declared interval, smaller bound first.
        declared: (u8, u8),
        /// Permitted interval, smaller bound first.
        permitted: (u8, u8),
    },
    /// Declared cores leave the permitted interval.
    CoreRange {
        /// Declared interval.
        declared: (u8, u8),
        /// Permitted interval.
        permitted: (u8, u8),
    },
    /// Calls in one block that the descriptor does not enable.
    SystemCalls {
        /// Block index.
        block: usize,
        /// Mask of the offending calls within the block.
        excess: u32,
    },
    /// A mapping not contained in any permitted mapping of the same kind
    /// and at least the same permission.
    Mapping {
        /// The declared mapping.
        mapping: MemoryRange,
    },
    /// An IRQ the descriptor does not grant.
    Interrupt {
        /// The IRQ number.
        irq: u16,
    },
    /// A program type other than the permitted one.
    ProgramType {
        /// Declared type.
        declared: ProgramType,
        /// Permitted type.
        permitted: ProgramType,
    },
    /// A kernel version floor below the permitted floor.
    KernelVersion {
        /// Declared minimum.
        declared: KernelVersion,
        /// Permitted minimum.
        permitted: KernelVersion,
    },
    /// A handle table larger than permitted.
    HandleTableSize {
        /// Declared size.
        declared: u16,
        /// Permitted size.
        permitted: u16,
    },
    /// Flags the descriptor does not grant.
    MiscFlags {
        /// The offending flags.
        excess: MiscFlags,
    },
}

impl fmt::Display for ViolationDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPermitted => write!(f, "not granted by descriptor"),
            Self::PriorityRange {
                declared,
                permitted,
            } => write!(
                f,
                "priorities {}..={} outside {}..={}",
                declared.0, declared.1, permitted.0, permitted.1
            ),
            Self::CoreRange {
                declared,
                permitted,
            } => write!(
                f,
                "cores {}..={} outside {}..={}",
                declared.0, declared.1, permitted.0, permitted.1
            ),
            Self::SystemCalls { block, excess } => {
                write!(f, "block {} calls {:#08x} not enabled", block, excess)
            }
            Self::Mapping { mapping } => write!(f, "mapping {} not permitted", mapping),
            Self::Interrupt { irq } => write!(f, "irq {:#x} not permitted", irq),
            Self::ProgramType {
                declared,
                permitted,
            } => write!(f, "program type {} but {} permitted", declared, permitted),
            Self::KernelVersion {
                declared,
                permitted,
            } => write!(f, "kernel version {} below floor {}", declared, permitted),
            Self::HandleTableSize {
                declared,
                permitted,
            } => write!(f, "handle table size {} exceeds {}", declared, permitted),
            Self::MiscFlags { excess } => write!(f, "flags {:#x} not permitted", excess.bits()),
        }
    }
}

/// One non-conformance found by the validator.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Violation {
    /// Category of the offending declaration.
    pub category: Category,
    /// What exceeded the bound.
    pub detail: ViolationDetail,
}

impl Violation {
    /// Create a violation.
    #[inline]
    pub const fn new(category: Category, detail: ViolationDetail) -> Self {
        Self { category, detail }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_display() {
        let v = Violation::new(
            Category::SystemCalls,
            ViolationDetail::SystemCalls {
                block: 0,
                excess: 0b100,
            },
        );
        assert_eq!(v.to_string(), "SystemCalls: block 0 calls 0x000004 not enabled");

        let v = Violation::new(Category::Interrupts, ViolationDetail::Interrupt { irq: 0x20 });
        assert_eq!(v.to_string(), "Interrupts: irq 0x20 not permitted");
    }
}
