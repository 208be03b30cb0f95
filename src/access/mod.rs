//! Access Control
//!
//! Checks a process's declared kernel capabilities against the bounds of
//! its signed access-control descriptor.
//!
//! # Security Model
//! - The descriptor is the upper bound; the declaration must be a subset
//! - Findings are collected exhaustively as [`Violation`] values
//! - Signature checking is delegated to a caller-supplied verifier

pub mod descriptor;
pub mod validate;
pub mod violation;

pub use descriptor::{audit, AuditReport, CapabilitySource, SignatureVerifier, SignedDescriptor};
pub use validate::AccessControlValidator;
pub use violation::{Violation, ViolationDetail};
