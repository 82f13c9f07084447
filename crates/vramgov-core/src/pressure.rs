//! Memory pressure classification.
//!
//! A pure function of `current_usage / cap` against four strictly-increasing
//! ratio thresholds. Monotonic non-decreasing in usage for a fixed config.

use serde::{Deserialize, Serialize};

/// Discrete classification of usage-vs-cap driving escalating remediation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl PressureLevel {
    /// Name used in log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            PressureLevel::None => "None",
            PressureLevel::Low => "Low",
            PressureLevel::Medium => "Medium",
            PressureLevel::High => "High",
            PressureLevel::Critical => "Critical",
        }
    }
}

/// Ratio thresholds for computing a [`PressureLevel`].
///
/// Each value is a fraction of the VRAM cap in `(0, 1]` and they must be
/// strictly increasing. Validation is the caller's responsibility
/// ([`crate::config::BudgetConfig::validate`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressureThresholds {
    /// Enter `Low` when `usage / cap >= low`.
    pub low: f32,
    /// Enter `Medium` when `usage / cap >= medium`.
    pub medium: f32,
    /// Enter `High` when `usage / cap >= high`.
    pub high: f32,
    /// Enter `Critical` when `usage / cap >= critical`.
    pub critical: f32,
}

impl Default for PressureThresholds {
    fn default() -> Self {
        Self {
            low: 0.60,
            medium: 0.75,
            high: 0.85,
            critical: 0.95,
        }
    }
}

impl PressureThresholds {
    pub fn level_for_ratio(self, ratio: f32) -> PressureLevel {
        if ratio >= self.critical {
            PressureLevel::Critical
        } else if ratio >= self.high {
            PressureLevel::High
        } else if ratio >= self.medium {
            PressureLevel::Medium
        } else if ratio >= self.low {
            PressureLevel::Low
        } else {
            PressureLevel::None
        }
    }
}
