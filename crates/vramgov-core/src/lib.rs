#![forbid(unsafe_code)]
//! vramgov-core: shared types for the renderer memory-governance crates.
//!
//! This crate holds only pure data: configuration structs with device-tier
//! presets, pressure-level classification, strongly-typed identifiers, and
//! the remediation hook traits implemented by the host renderer. The policy
//! logic lives in `vramgov-budget`, `vramgov-gc`, and `vramgov-pool`.
//!
//! No I/O, no locking, and no logging here so any crate can depend on the
//! API without pulling in the governance machinery.

pub mod config;
pub mod error;
pub mod hooks;
pub mod id;
pub mod prelude;
pub mod pressure;

pub use config::{BudgetConfig, DeviceTier, EvictionConfig, GovernorConfig, PoolConfig};
pub use error::{Error, Result};
pub use hooks::{CleanupHook, EmergencyHook};
pub use id::{BufferId, ResourceId};
pub use pressure::{PressureLevel, PressureThresholds};
