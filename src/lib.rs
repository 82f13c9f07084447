#![forbid(unsafe_code)]
//! vramgov: resource-governance core for a hardware-accelerated emulation
//! renderer on memory-constrained mobile hosts.
//!
//! Facade over the member crates. The host renderer wires the three
//! components together once per frame: feed measured usage to the
//! [`BudgetController`], register a cleanup hook that asks the
//! [`EvictionEngine`] for purge candidates and destroys them, and record
//! commands through [`CommandPool`] buffers.

pub use vramgov_budget::{detect_device_tier, BudgetController, BudgetStats, EmergencySignal};
pub use vramgov_core::prelude::*;
pub use vramgov_gc::{EvictionEngine, EvictionStats, TrackedResource};
pub use vramgov_pool::{BufferOrigin, CommandBuffer, CommandPool, PoolStats};
