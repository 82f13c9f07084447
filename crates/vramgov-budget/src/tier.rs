//! Device-tier detection from total system memory.
//!
//! Reads `MemTotal` from `/proc/meminfo` and maps it through the pure
//! classifier in core. This is configuration, not policy: the host may ignore
//! the detected tier and pass any [`BudgetConfig`] it likes.
//!
//! [`BudgetConfig`]: vramgov_core::BudgetConfig

use tracing::{info, warn};
use vramgov_core::DeviceTier;

/// Detect the device tier, falling back to `Balanced` when the total RAM
/// cannot be determined.
pub fn detect_device_tier() -> DeviceTier {
    match read_mem_total_kb("/proc/meminfo") {
        Some(kb) => {
            let mb = kb / 1024;
            let tier = DeviceTier::for_total_ram_mb(mb);
            info!(total_ram_mb = mb, ?tier, "detected system RAM");
            tier
        }
        None => {
            warn!("could not read /proc/meminfo, defaulting to Balanced tier");
            DeviceTier::Balanced
        }
    }
}

fn read_mem_total_kb(path: &str) -> Option<u64> {
    let contents = std::fs::read_to_string(path).ok()?;
    parse_mem_total_kb(&contents)
}

fn parse_mem_total_kb(meminfo: &str) -> Option<u64> {
    meminfo
        .lines()
        .find(|line| line.starts_with("MemTotal:"))?
        .split_whitespace()
        .nth(1)?
        .parse()
        .ok()
}
