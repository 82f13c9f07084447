//! Remediation hook traits implemented by the host renderer.
//!
//! The budget controller owns registered hooks and invokes them synchronously
//! on the render thread when a threshold is crossed. The host typically wires
//! a [`CleanupHook`] that asks the eviction engine for purge candidates and
//! destroys them, and an [`EmergencyHook`] for last-resort action (dropping
//! whole caches, forcing a GPU flush, ...).
//!
//! Caller contract: a hook must not call back into the controller's
//! `update_usage` synchronously. Doing so would recompute pressure mid-hook
//! and could trigger nested remediation; the cooldown gates bound the damage
//! but the discipline is on the caller.

/// Frees memory on request. Returns the number of bytes freed so the
/// controller can account for them.
pub trait CleanupHook {
    fn reclaim(&mut self) -> u64;
}

/// Last-resort purge action. No return value; the next usage update reflects
/// whatever was freed.
pub trait EmergencyHook {
    fn purge(&mut self);
}

impl<F> CleanupHook for F
where
    F: FnMut() -> u64,
{
    fn reclaim(&mut self) -> u64 {
        self()
    }
}

impl<F> EmergencyHook for F
where
    F: FnMut(),
{
    fn purge(&mut self) {
        self()
    }
}
