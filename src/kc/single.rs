//! Single-Word Categories
//!
//! ThreadInfo, MiscParams, KernelVersion, HandleTableSize and MiscFlags
//! each occupy at most one word. They share one codec shape: unset, or
//! set to a single value.

use alloc::vec::Vec;
use core::fmt;

use super::entry::{expect_type, CapabilityEntry, Category, EntryType};
use super::CategoryCodec;
use crate::error::KcResult;

/// A value that packs into the payload of exactly one capability word.
pub trait SingleWord: Copy + PartialEq + fmt::Debug {
    /// Entry type this value is emitted as.
    const ENTRY_TYPE: EntryType;

    /// Pack into payload bits.
    fn to_payload(&self) -> u32;

    /// Unpack from a word of this entry type.
    fn from_entry(entry: CapabilityEntry) -> KcResult<Self>;

    /// Re-check every field against its bit width.
    fn validate(&self) -> KcResult<()> {
        Ok(())
    }

    /// Combine a repeated entry with the value decoded so far.
    ///
    /// The later entry wins unless a category says otherwise.
    fn merge(self, later: Self) -> Self {
        later
    }
}

/// Codec for a category holding at most one [`SingleWord`] value.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct WordCap<T> {
    value: Option<T>,
}

impl<T: SingleWord> WordCap<T> {
    /// An unset category.
    pub const fn new() -> Self {
        Self { value: None }
    }

    /// Get the value, if set.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Set the value after checking its fields.
    pub fn set(&mut self, value: T) -> KcResult<()> {
        value.validate()?;
        self.value = Some(value);
        Ok(())
    }

    /// Remove the value.
    #[inline]
    pub fn unset(&mut self) {
        self.value = None;
    }

    /// Modify the value, if set, and store the result after checking its
    /// fields. A failed check leaves the previous value in place.
    ///
    /// Returns whether a value was present.
    pub fn update<F>(&mut self, f: F) -> KcResult<bool>
    where
        F: FnOnce(&mut T),
    {
        let Some(mut value) = self.value else {
            return Ok(false);
        };
        f(&mut value);
        value.validate()?;
        self.value = Some(value);
        Ok(true)
    }
}

impl<T: SingleWord> Default for WordCap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SingleWord> fmt::Debug for WordCap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{:?}", value),
            None => write!(f, "{}(unset)", T::ENTRY_TYPE.category()),
        }
    }
}

impl<T: SingleWord> CategoryCodec for WordCap<T> {
    const CATEGORY: Category = T::ENTRY_TYPE.category();

    fn to_entries(&self, out: &mut Vec<CapabilityEntry>) {
        if let Some(value) = &self.value {
            out.push(CapabilityEntry::new(T::ENTRY_TYPE, value.to_payload()));
        }
    }

    fn from_entries(entries: &[CapabilityEntry]) -> KcResult<Self> {
        let mut value: Option<T> = None;
        for (index, &entry) in entries.iter().enumerate() {
            expect_type(entry, index, Self::CATEGORY)?;
            let decoded = T::from_entry(entry)?;
            value = Some(match value {
                Some(prev) => prev.merge(decoded),
                None => decoded,
            });
        }
        Ok(Self { value })
    }

    fn is_set(&self) -> bool {
        self.value.is_some()
    }
}
