//! Kernel Capability Error Types
//!
//! Errors raised while decoding a capability array or while constructing
//! a capability field. Validation findings are not errors; see
//! [`crate::access::Violation`].

use thiserror::Error;

use crate::kc::Category;

/// Errors that can occur while decoding or building kernel capabilities.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KcError {
    /// The buffer length is not a multiple of the word size.
    #[error("capability array length {len} is not a multiple of 4")]
    Alignment {
        /// Length of the rejected buffer in bytes.
        len: usize,
    },

    /// The tag of a word maps to no defined entry type.
    #[error("unrecognized capability tag in word {index} ({word:#010x})")]
    UnrecognizedTag {
        /// Position of the word in the array.
        index: usize,
        /// The raw word.
        word: u32,
    },

    /// A multi-word entry is missing its trailing word.
    #[error("incomplete {category} entry")]
    IncompleteEntry {
        /// Category of the unpaired word.
        category: Category,
    },

    /// A field was given a value wider than its bit width.
    #[error("{field} value {value:#x} exceeds maximum {max:#x}")]
    FieldOutOfRange {
        /// Name of the field.
        field: &'static str,
        /// Rejected value.
        value: u64,
        /// Largest value the field can hold.
        max: u64,
    },

    /// A word has reserved bits set.
    #[error("{category} entry {word:#010x} has reserved bits set")]
    ReservedBits {
        /// Category of the offending word.
        category: Category,
        /// The raw word.
        word: u32,
    },

    /// A field holds a value with no defined meaning.
    #[error("{field} has invalid value {value:#x}")]
    InvalidValue {
        /// Name of the field.
        field: &'static str,
        /// Rejected value.
        value: u64,
    },
}

/// Result type for capability operations.
pub type KcResult<T> = Result<T, KcError>;

/// Check `value` against an inclusive maximum.
#[inline]
pub(crate) fn check_range(field: &'static str, value: u64, max: u64) -> KcResult<()> {
    if value > max {
        return Err(KcError::FieldOutOfRange { field, value, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_check_range() {
        assert!(check_range("size", 1023, 1023).is_ok());
        assert_eq!(
            check_range("size", 1024, 1023),
            Err(KcError::FieldOutOfRange {
                field: "size",
                value: 1024,
                max: 1023
            })
        );
    }

    #[test]
    fn test_display() {
        let err = KcError::Alignment { len: 7 };
        assert_eq!(err.to_string(), "capability array length 7 is not a multiple of 4");

        let err = KcError::IncompleteEntry {
            category: Category::MemoryMap,
        };
        assert_eq!(err.to_string(), "incomplete MemoryMap entry");
    }
}
