//! Access Control Validation
//!
//! Checks that a process's declared capabilities lie within the bounds of
//! its access-control descriptor.
//!
//! # Security Principles
//! - Deny by default: a bound the descriptor does not state grants nothing
//! - Report everything: every offending value is recorded, the check
//!   never stops at the first finding
//! - Neither input is modified

use alloc::vec::Vec;

use log::warn;

use super::violation::{Violation, ViolationDetail};
use crate::kc::{Category, KernelCapabilityArray, MiscFlags};

/// Subset checker for kernel capability arrays.
#[derive(Clone, Copy, Debug, Default)]
pub struct AccessControlValidator;

impl AccessControlValidator {
    /// Check `declared` against `permitted`.
    ///
    /// # Returns
    /// Every violation, grouped in canonical category order. An empty list
    /// means the declaration conforms.
    pub fn check(
        declared: &KernelCapabilityArray,
        permitted: &KernelCapabilityArray,
    ) -> Vec<Violation> {
        let mut findings = Findings::default();
        check_thread_info(&mut findings, declared, permitted);
        check_system_calls(&mut findings, declared, permitted);
        check_memory_map(&mut findings, declared, permitted);
        check_interrupts(&mut findings, declared, permitted);
        check_misc_params(&mut findings, declared, permitted);
        check_kernel_version(&mut findings, declared, permitted);
        check_handle_table_size(&mut findings, declared, permitted);
        check_misc_flags(&mut findings, declared, permitted);
        findings.0
    }
}

#[derive(Default)]
struct Findings(Vec<Violation>);

impl Findings {
    fn record(&mut self, category: Category, detail: ViolationDetail) {
        let violation = Violation::new(category, detail);
        warn!("[ACCESS] {}", violation);
        self.0.push(violation);
    }
}

/// Closed interval containment.
fn within(inner: (u8, u8), outer: (u8, u8)) -> bool {
    inner.0 >= outer.0 && inner.1 <= outer.1
}

fn check_thread_info(
    out: &mut Findings,
    declared: &KernelCapabilityArray,
    permitted: &KernelCapabilityArray,
) {
    let Some(decl) = declared.thread_info().get() else {
        return;
    };
    let Some(perm) = permitted.thread_info().get() else {
        out.record(Category::ThreadInfo, ViolationDetail::NotPermitted);
        return;
    };

    if !within(decl.priority_range(), perm.priority_range()) {
        out.record(
            Category::ThreadInfo,
            ViolationDetail::PriorityRange {
                declared: decl.priority_range(),
                permitted: perm.priority_range(),
            },
        );
    }
    if !within(decl.core_range(), perm.core_range()) {
        out.record(
            Category::ThreadInfo,
            ViolationDetail::CoreRange {
                declared: decl.core_range(),
                permitted: perm.core_range(),
            },
        );
    }
}

fn check_system_calls(
    out: &mut Findings,
    declared: &KernelCapabilityArray,
    permitted: &KernelCapabilityArray,
) {
    for (block, mask) in declared.system_calls().blocks() {
        let allowed = permitted.system_calls().block(block).unwrap_or(0);
        let excess = mask & !allowed;
        if excess != 0 {
            out.record(
                Category::SystemCalls,
                ViolationDetail::SystemCalls { block, excess },
            );
        }
    }
}

fn check_memory_map(
    out: &mut Findings,
    declared: &KernelCapabilityArray,
    permitted: &KernelCapabilityArray,
) {
    for mapping in declared.memory_map().mappings() {
        let granted = permitted
            .memory_map()
            .mappings()
            .any(|bound| bound.permits(mapping));
        if !granted {
            out.record(
                Category::MemoryMap,
                ViolationDetail::Mapping { mapping: *mapping },
            );
        }
    }
}

fn check_interrupts(
    out: &mut Findings,
    declared: &KernelCapabilityArray,
    permitted: &KernelCapabilityArray,
) {
    for irq in declared.interrupts().iter() {
        if !permitted.interrupts().contains(irq) {
            out.record(Category::Interrupts, ViolationDetail::Interrupt { irq });
        }
    }
}

fn check_misc_params(
    out: &mut Findings,
    declared: &KernelCapabilityArray,
    permitted: &KernelCapabilityArray,
) {
    // Absent means the kernel default on both sides
    let decl = declared.misc_params().get().copied().unwrap_or_default();
    let perm = permitted.misc_params().get().copied().unwrap_or_default();
    if decl != perm {
        out.record(
            Category::MiscParams,
            ViolationDetail::ProgramType {
                declared: decl,
                permitted: perm,
            },
        );
    }
}

fn check_kernel_version(
    out: &mut Findings,
    declared: &KernelCapabilityArray,
    permitted: &KernelCapabilityArray,
) {
    let Some(&perm) = permitted.kernel_version().get() else {
        return;
    };
    // No declared floor is floor 0.0
    let decl = declared.kernel_version().get().copied().unwrap_or_default();
    if decl < perm {
        out.record(
            Category::KernelVersion,
            ViolationDetail::KernelVersion {
                declared: decl,
                permitted: perm,
            },
        );
    }
}

fn check_handle_table_size(
    out: &mut Findings,
    declared: &KernelCapabilityArray,
    permitted: &KernelCapabilityArray,
) {
    let Some(decl) = declared.handle_table_size().get() else {
        return;
    };
    match permitted.handle_table_size().get() {
        None => out.record(Category::HandleTableSize, ViolationDetail::NotPermitted),
        Some(perm) if decl > perm => out.record(
            Category::HandleTableSize,
            ViolationDetail::HandleTableSize {
                declared: decl.get(),
                permitted: perm.get(),
            },
        ),
        Some(_) => {}
    }
}

fn check_misc_flags(
    out: &mut Findings,
    declared: &KernelCapabilityArray,
    permitted: &KernelCapabilityArray,
) {
    let Some(&decl) = declared.misc_flags().get() else {
        return;
    };
    let perm = permitted
        .misc_flags()
        .get()
        .copied()
        .unwrap_or(MiscFlags::empty());
    let excess = decl.difference(perm);
    if !excess.is_empty() {
        out.record(Category::MiscFlags, ViolationDetail::MiscFlags { excess });
    }
}
