//! Single-flight request gate
//!
//! Both request kinds share one gate, so at most one outbound request is in
//! flight. Attempts made while busy are dropped, never queued.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct RequestGate {
    busy: AtomicBool,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the gate busy. Returns false, changing nothing, if it already was.
    pub fn try_acquire(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Clear the busy flag. Idempotent.
    pub fn release(&self) {
        self.busy.store(false, Ordering::Release);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Acquire the gate for the lifetime of the returned guard.
    ///
    /// The guard releases on drop, so the gate is freed on every exit path of
    /// the holder, including early returns and unwinding.
    pub fn acquire(&self) -> Option<GateGuard<'_>> {
        self.try_acquire().then(|| GateGuard { gate: self })
    }
}

pub struct GateGuard<'a> {
    gate: &'a RequestGate,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}
