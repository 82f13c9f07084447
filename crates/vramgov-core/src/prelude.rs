//! Convenient re-exports for downstream crates.

pub use crate::config::{BudgetConfig, DeviceTier, EvictionConfig, GovernorConfig, PoolConfig};
pub use crate::error::{Error, Result};
pub use crate::hooks::{CleanupHook, EmergencyHook};
pub use crate::id::{BufferId, ResourceId};
pub use crate::pressure::{PressureLevel, PressureThresholds};
