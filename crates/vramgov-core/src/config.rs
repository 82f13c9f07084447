//! Governor configuration that downstream crates can serialize/deserialize.
//!
//! Defaults match the `Balanced` device tier (4 GB-class devices). The tier
//! presets scale the cap and loosen the pressure ratios as physical memory
//! grows; detection of the actual tier from system RAM lives in
//! `vramgov-budget::tier` (core does no I/O).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pressure::PressureThresholds;

const MIB: u64 = 1024 * 1024;

/// Device class derived from total system RAM.
///
/// Each tier gets a progressively larger VRAM cap and looser pressure
/// thresholds: a device with more physical memory tolerates a higher
/// fraction of its cap in use before remediation is warranted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceTier {
    /// ~3 GB devices, very conservative (1 GiB cap).
    Constrained,
    /// ~4 GB devices, the default (1.5 GiB cap).
    Balanced,
    /// ~6 GB devices (2 GiB cap).
    Ample,
    /// 8 GB+ devices (3 GiB cap).
    Maximal,
}

impl DeviceTier {
    /// Classify a device by total system RAM in MiB. Pure; the `/proc/meminfo`
    /// read that feeds this lives in the budget crate.
    pub fn for_total_ram_mb(total_mb: u64) -> Self {
        if total_mb <= 3072 {
            DeviceTier::Constrained
        } else if total_mb <= 4608 {
            DeviceTier::Balanced
        } else if total_mb <= 6656 {
            DeviceTier::Ample
        } else {
            DeviceTier::Maximal
        }
    }
}

/// Budget controller configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Hard VRAM cap in bytes. Exceeding it risks the host OS killing the
    /// process, so everything here exists to keep usage below this number.
    pub vram_cap_bytes: u64,

    /// Tier this config was derived from (informational once constructed).
    pub device_tier: DeviceTier,

    /// Pressure ratio thresholds (fractions of the cap).
    pub thresholds: PressureThresholds,

    /// Absolute usage at which a gated cleanup pass is requested.
    pub cleanup_threshold_bytes: u64,

    /// Absolute usage at which a gated emergency purge is requested.
    pub emergency_threshold_bytes: u64,

    /// Minimum frames between automatic cleanup passes. A hook that frees too
    /// little must not be re-invoked every frame while usage stays high.
    pub cleanup_min_interval_frames: u64,

    /// Minimum frames between automatic emergency purges.
    pub emergency_min_interval_frames: u64,

    /// Master switch for automatic (gated or pressure-driven) cleanup.
    /// Manual `request_cleanup` ignores it.
    pub enable_auto_cleanup: bool,

    /// Master switch for automatic emergency purge. Manual
    /// `force_emergency_purge` ignores it.
    pub enable_emergency_purge: bool,

    /// Periodic diagnostics interval for `tick_frame` (frames).
    pub log_interval_frames: u64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self::recommended(DeviceTier::Balanced)
    }
}

impl BudgetConfig {
    /// Built-in preset for a device tier.
    pub fn recommended(tier: DeviceTier) -> Self {
        let (cap, cleanup, emergency, thresholds) = match tier {
            DeviceTier::Constrained => (
                1024 * MIB,
                870 * MIB,
                970 * MIB,
                PressureThresholds {
                    low: 0.50,
                    medium: 0.65,
                    high: 0.80,
                    critical: 0.90,
                },
            ),
            DeviceTier::Balanced => (
                1536 * MIB,
                1280 * MIB,
                1460 * MIB,
                PressureThresholds {
                    low: 0.60,
                    medium: 0.75,
                    high: 0.85,
                    critical: 0.95,
                },
            ),
            DeviceTier::Ample => (
                2048 * MIB,
                1740 * MIB,
                1940 * MIB,
                PressureThresholds {
                    low: 0.65,
                    medium: 0.80,
                    high: 0.90,
                    critical: 0.95,
                },
            ),
            DeviceTier::Maximal => (
                3072 * MIB,
                2600 * MIB,
                2900 * MIB,
                PressureThresholds {
                    low: 0.70,
                    medium: 0.85,
                    high: 0.92,
                    critical: 0.95,
                },
            ),
        };

        Self {
            vram_cap_bytes: cap,
            device_tier: tier,
            thresholds,
            cleanup_threshold_bytes: cleanup,
            emergency_threshold_bytes: emergency,
            cleanup_min_interval_frames: 60,
            emergency_min_interval_frames: 120,
            enable_auto_cleanup: true,
            enable_emergency_purge: true,
            log_interval_frames: 300,
        }
    }

    /// Construction-time validation. The controller itself does not defend
    /// against a self-inconsistent config beyond producing a trivially
    /// permissive or restrictive outcome.
    pub fn validate(&self) -> Result<()> {
        if self.vram_cap_bytes == 0 {
            return Err(Error::Config("vram_cap_bytes must be non-zero".into()));
        }
        let t = self.thresholds;
        let ratios = [t.low, t.medium, t.high, t.critical];
        if ratios.iter().any(|r| *r <= 0.0 || *r > 1.0) {
            return Err(Error::Config(
                "pressure thresholds must lie in (0, 1]".into(),
            ));
        }
        if !(t.low < t.medium && t.medium < t.high && t.high < t.critical) {
            return Err(Error::Config(
                "pressure thresholds must be strictly increasing".into(),
            ));
        }
        if self.cleanup_threshold_bytes > self.emergency_threshold_bytes {
            return Err(Error::Config(
                "cleanup threshold must not exceed emergency threshold".into(),
            ));
        }
        Ok(())
    }
}

/// Eviction engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvictionConfig {
    /// Frames a resource must go unused before it becomes a purge candidate.
    pub unused_frame_threshold: u64,

    /// Switch to the shorter threshold while the pressure predicate holds.
    pub aggressive_mode: bool,

    /// Shorter threshold used under pressure (frames).
    pub aggressive_threshold: u64,

    /// Estimated-usage level defining the pressure predicate (bytes).
    pub pressure_threshold_bytes: u64,

    /// Target ceiling for the engine's VRAM estimate (bytes).
    pub max_target_bytes: u64,
}

impl Default for EvictionConfig {
    fn default() -> Self {
        Self {
            unused_frame_threshold: 60,
            aggressive_mode: true,
            aggressive_threshold: 30,
            pressure_threshold_bytes: 512 * MIB,
            max_target_bytes: 1024 * MIB,
        }
    }
}

impl EvictionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.unused_frame_threshold == 0 {
            return Err(Error::Config("unused_frame_threshold must be non-zero".into()));
        }
        if self.aggressive_threshold > self.unused_frame_threshold {
            return Err(Error::Config(
                "aggressive_threshold must not exceed unused_frame_threshold".into(),
            ));
        }
        Ok(())
    }
}

/// Command-buffer pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Buffers pre-allocated at construction.
    pub initial_pool_size: usize,

    /// Ceiling for the tracked total. Past it the pool hands out untracked
    /// overflow buffers rather than blocking the frame.
    pub max_pool_size: usize,

    /// Nominal size of each buffer in bytes.
    pub buffer_size: usize,

    /// Allocate new tracked buffers on exhaustion (up to `max_pool_size`).
    pub auto_expand: bool,

    /// Return excess available buffers to the system from `tick_frame`.
    pub auto_shrink: bool,

    /// Minimum frames between automatic shrinks (prevents expand/shrink
    /// oscillation).
    pub shrink_delay_frames: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_pool_size: 16,
            max_pool_size: 64,
            buffer_size: MIB as usize,
            auto_expand: true,
            auto_shrink: true,
            shrink_delay_frames: 300,
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(Error::Config("buffer_size must be non-zero".into()));
        }
        if self.initial_pool_size > self.max_pool_size {
            return Err(Error::Config(
                "initial_pool_size must not exceed max_pool_size".into(),
            ));
        }
        Ok(())
    }
}

/// Aggregate configuration for the three governance components.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GovernorConfig {
    pub budget: BudgetConfig,
    pub eviction: EvictionConfig,
    pub pool: PoolConfig,
}

impl GovernorConfig {
    /// Preset for a device tier; eviction and pool keep their defaults.
    pub fn recommended(tier: DeviceTier) -> Self {
        Self {
            budget: BudgetConfig::recommended(tier),
            ..Default::default()
        }
    }

    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `VRAMGOV_DEVICE_TIER`: `constrained` | `balanced` | `ample` | `maximal`
    /// - `VRAMGOV_VRAM_CAP_BYTES`: override the VRAM cap
    /// - `VRAMGOV_POOL_INITIAL`: initial pool size (buffers)
    /// - `VRAMGOV_POOL_MAX`: maximum pool size (buffers)
    /// - `VRAMGOV_POOL_BUFFER_BYTES`: per-buffer size
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("VRAMGOV_DEVICE_TIER") {
            let tier = match s.as_str() {
                "constrained" => Some(DeviceTier::Constrained),
                "balanced" => Some(DeviceTier::Balanced),
                "ample" => Some(DeviceTier::Ample),
                "maximal" => Some(DeviceTier::Maximal),
                _ => None,
            };
            if let Some(tier) = tier {
                cfg.budget = BudgetConfig::recommended(tier);
            }
        }

        if let Ok(s) = std::env::var("VRAMGOV_VRAM_CAP_BYTES") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.budget.vram_cap_bytes = v;
            }
        }

        if let Ok(s) = std::env::var("VRAMGOV_POOL_INITIAL") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.pool.initial_pool_size = v;
            }
        }

        if let Ok(s) = std::env::var("VRAMGOV_POOL_MAX") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.pool.max_pool_size = v;
            }
        }

        if let Ok(s) = std::env::var("VRAMGOV_POOL_BUFFER_BYTES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.pool.buffer_size = v;
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<()> {
        self.budget.validate()?;
        self.eviction.validate()?;
        self.pool.validate()
    }
}
