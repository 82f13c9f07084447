//! Cross-thread emergency request flag.
//!
//! The background thermal thread must be able to demand an emergency purge
//! when temperature crosses a critical level, independent of memory pressure.
//! Rather than letting it call into shared mutable controller state, the
//! request is a single atomic flag consumed at the controller's next
//! `tick_frame`. Repeated requests before consumption coalesce into one purge.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct EmergencySignal {
    flag: Arc<AtomicBool>,
}

impl EmergencySignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request an emergency purge. Safe from any thread.
    pub fn request(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// True if a request is waiting to be consumed.
    pub fn is_pending(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Consume the flag, returning whether a request was pending.
    pub(crate) fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }
}
