//! Cooperative cancellation.
//!
//! The scheduler polls a [`StopSignal`] between reference points only, so an
//! in-flight neighbor query always completes and the accumulators are left
//! in a reportable state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable stop flag shared between the caller and running scans.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
}

impl StopSignal {
    /// Create a signal in the "keep running" state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request every scan observing this signal to stop.
    pub fn stop(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Returns `true` once [`stop`](Self::stop) has been called.
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let a = StopSignal::new();
        let b = a.clone();
        assert!(!b.is_stopped());
        a.stop();
        assert!(b.is_stopped());
    }
}
