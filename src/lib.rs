//! kcap - Kernel Capability Descriptors
//!
//! Encodes, decodes and statically validates the kernel capability array
//! carried in process metadata.
//!
//! # Components
//! - [`kc`]: tagged capability words, one codec per category, and the
//!   aggregate [`KernelCapabilityArray`]
//! - [`access`]: subset validation of a declaration against its signed
//!   descriptor
//! - [`config`]: named-field descriptor configuration for synthesis tooling
//!
//! # Security Properties
//! - Unknown tags, reserved bits and misaligned buffers are rejected
//! - Fields are range-checked when built, so encoding cannot fail
//! - Validation reports every excess grant, never just the first
//!
//! # Example
//! ```
//! use kcap::{AccessControlValidator, KernelCapabilityArray};
//!
//! let mut permitted = KernelCapabilityArray::new();
//! permitted.system_calls_mut().set_block(0, 0b001).unwrap();
//!
//! let mut declared = KernelCapabilityArray::new();
//! declared.system_calls_mut().set_block(0, 0b101).unwrap();
//!
//! let bytes = declared.encode();
//! let declared = KernelCapabilityArray::from_bytes(&bytes).unwrap();
//! let violations = AccessControlValidator::check(&declared, &permitted);
//! assert_eq!(violations.len(), 1);
//! ```

#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod access;
pub mod config;
pub mod error;
pub mod kc;

pub use access::{AccessControlValidator, Violation, ViolationDetail};
pub use config::CapabilityConfig;
pub use error::{KcError, KcResult};
pub use kc::{CapabilityEntry, Category, KernelCapabilityArray};
