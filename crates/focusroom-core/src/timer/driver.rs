//! Periodic tick source seam.
//!
//! The engine arms its driver when it enters Running and disarms it on every
//! exit, so at most one decrement stream exists per engine. Both operations
//! must be idempotent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub trait TickDriver: Send {
    fn arm(&mut self);
    fn disarm(&mut self);
    fn is_armed(&self) -> bool;
}

/// Driver for hosts that pump `tick()` themselves.
///
/// It only records whether ticks are expected. Clones share the flag, which
/// lets a host loop observe arming without owning the engine.
#[derive(Debug, Clone, Default)]
pub struct ManualDriver {
    armed: Arc<AtomicBool>,
}

impl ManualDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TickDriver for ManualDriver {
    fn arm(&mut self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    fn disarm(&mut self) {
        self.armed.store(false, Ordering::SeqCst);
    }

    fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_armed_flag() {
        let mut driver = ManualDriver::new();
        let observer = driver.clone();
        assert!(!observer.is_armed());
        driver.arm();
        driver.arm();
        assert!(observer.is_armed());
        driver.disarm();
        assert!(!observer.is_armed());
    }
}
