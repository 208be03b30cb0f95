//! Descriptor Audit
//!
//! Combines signature verification of an access-control descriptor with
//! the subset check of a process's declared capabilities against it.
//!
//! Cryptography is supplied by the caller through [`SignatureVerifier`];
//! this crate never implements a signature scheme itself.

use alloc::vec::Vec;

use log::{debug, warn};

use super::validate::AccessControlValidator;
use super::violation::Violation;
use crate::error::KcResult;
use crate::kc::KernelCapabilityArray;

/// Black-box signature check.
pub trait SignatureVerifier {
    /// Public key type understood by this verifier.
    type Key: ?Sized;

    /// Return whether `signature` over `data` is valid under `key`.
    fn verify(&self, data: &[u8], signature: &[u8], key: &Self::Key) -> bool;
}

/// Anything that can hand out the raw capability array bytes of its
/// enclosing metadata container.
pub trait CapabilitySource {
    /// The exact capability array byte range.
    fn capability_blob(&self) -> &[u8];
}

impl<T: AsRef<[u8]> + ?Sized> CapabilitySource for T {
    fn capability_blob(&self) -> &[u8] {
        self.as_ref()
    }
}

/// A signed access-control descriptor.
#[derive(Clone, Copy, Debug)]
pub struct SignedDescriptor<'a> {
    /// The bytes covered by the signature.
    pub signed_data: &'a [u8],
    /// The signature over `signed_data`.
    pub signature: &'a [u8],
    /// The permitted capability array inside `signed_data`.
    pub capabilities: &'a [u8],
}

/// Outcome of [`audit`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditReport {
    /// The process's decoded declaration.
    pub declared: KernelCapabilityArray,
    /// The descriptor's decoded bounds.
    pub permitted: KernelCapabilityArray,
    /// Whether the descriptor signature verified.
    pub signature_valid: bool,
    /// Every non-conformance of `declared` against `permitted`.
    pub violations: Vec<Violation>,
}

impl AuditReport {
    /// Signature valid and no violations.
    #[inline]
    pub fn is_conformant(&self) -> bool {
        self.signature_valid && self.violations.is_empty()
    }
}

/// Verify a descriptor and check a declaration against it.
///
/// A bad signature does not stop the subset check, so the report always
/// lists every finding.
///
/// # Errors
/// Any decode error from either capability array.
pub fn audit<S, V>(
    declared: &S,
    descriptor: &SignedDescriptor<'_>,
    verifier: &V,
    key: &V::Key,
) -> KcResult<AuditReport>
where
    S: CapabilitySource + ?Sized,
    V: SignatureVerifier,
{
    let declared = KernelCapabilityArray::from_bytes(declared.capability_blob())?;
    let permitted = KernelCapabilityArray::from_bytes(descriptor.capabilities)?;

    let signature_valid = verifier.verify(descriptor.signed_data, descriptor.signature, key);
    if !signature_valid {
        warn!("[ACCESS] descriptor signature is invalid");
    }

    let violations = AccessControlValidator::check(&declared, &permitted);
    debug!(
        "[ACCESS] audit complete: signature {}, {} violation(s)",
        if signature_valid { "valid" } else { "invalid" },
        violations.len()
    );

    Ok(AuditReport {
        declared,
        permitted,
        signature_valid,
        violations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KcError;
    use crate::kc::{Category, ThreadInfo};

    /// Accepts a signature equal to the wrapping byte sum of data and key.
    struct SumVerifier;

    impl SignatureVerifier for SumVerifier {
        type Key = [u8];

        fn verify(&self, data: &[u8], signature: &[u8], key: &[u8]) -> bool {
            let sum = data
                .iter()
                .chain(key.iter())
                .fold(0u8, |acc, &b| acc.wrapping_add(b));
            signature == [sum]
        }
    }

    fn sign(data: &[u8], key: &[u8]) -> u8 {
        data.iter().chain(key.iter()).fold(0u8, |acc, &b| acc.wrapping_add(b))
    }

    fn thread_info_bytes(lowest: u8, highest: u8) -> Vec<u8> {
        let mut kc = KernelCapabilityArray::new();
        kc.thread_info_mut()
            .set(ThreadInfo::new(lowest, highest, 0, 3).unwrap())
            .unwrap();
        kc.encode()
    }

    #[test]
    fn test_conformant() {
        let key = [0x11u8, 0x22];
        let permitted = thread_info_bytes(59, 24);
        let signature = [sign(&permitted, &key)];
        let descriptor = SignedDescriptor {
            signed_data: &permitted,
            signature: &signature,
            capabilities: &permitted,
        };

        let declared = thread_info_bytes(44, 28);
        let report = audit(&declared, &descriptor, &SumVerifier, &key[..]).unwrap();
        assert!(report.signature_valid);
        assert!(report.is_conformant());
        assert_eq!(report.declared.thread_info().get().map(|t| t.lowest_priority()), Some(44));
    }

    #[test]
    fn test_bad_signature_still_checks() {
        let key = [0x11u8];
        let permitted = thread_info_bytes(40, 30);
        let signature = [sign(&permitted, &key).wrapping_add(1)];
        let descriptor = SignedDescriptor {
            signed_data: &permitted,
            signature: &signature,
            capabilities: &permitted,
        };

        let declared = thread_info_bytes(59, 24);
        let report = audit(declared.as_slice(), &descriptor, &SumVerifier, &key[..]).unwrap();
        assert!(!report.signature_valid);
        assert!(!report.is_conformant());
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].category, Category::ThreadInfo);
    }

    #[test]
    fn test_decode_error_surfaces() {
        let descriptor = SignedDescriptor {
            signed_data: &[],
            signature: &[],
            capabilities: &[0x07, 0x00],
        };
        assert_eq!(
            audit(&[0u8; 0][..], &descriptor, &SumVerifier, &[][..]),
            Err(KcError::Alignment { len: 2 })
        );
    }
}
