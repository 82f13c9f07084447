//! Budget controller: pressure state machine and remediation dispatch.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use vramgov_core::{BudgetConfig, CleanupHook, EmergencyHook, PressureLevel};

use crate::signal::EmergencySignal;

/// Point-in-time statistics snapshot. Intended for periodic (not per-frame)
/// logging; field names are the stable observability contract.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BudgetStats {
    pub current_usage_bytes: u64,
    pub vram_cap_bytes: u64,
    pub usage_percentage: f32,
    pub pressure: PressureLevel,
    pub cleanup_count: u64,
    pub emergency_purge_count: u64,
    pub total_bytes_freed: u64,
    pub current_frame: u64,
}

/// Owns the usage-vs-cap relationship and the pressure state machine.
///
/// Single-threaded: `update_usage` and `tick_frame` must be called from the
/// render thread, once per frame. The only cross-thread entry point is the
/// [`EmergencySignal`] handle, consumed at the next `tick_frame`.
pub struct BudgetController {
    config: BudgetConfig,

    current_usage: u64,
    peak_usage: u64,
    current_frame: u64,

    last_pressure: PressureLevel,
    // None until the first pass runs; the interval gates pass unconditionally
    // before that, so a cold start can remediate immediately.
    last_cleanup_frame: Option<u64>,
    last_emergency_frame: Option<u64>,

    cleanup_count: u64,
    emergency_purge_count: u64,
    total_bytes_freed: u64,

    cleanup_hooks: Vec<Box<dyn CleanupHook>>,
    emergency_hooks: Vec<Box<dyn EmergencyHook>>,

    emergency_signal: EmergencySignal,
}

impl BudgetController {
    pub fn new(config: BudgetConfig) -> Self {
        info!(
            vram_cap_mb = config.vram_cap_bytes / 1024 / 1024,
            tier = ?config.device_tier,
            auto_cleanup = config.enable_auto_cleanup,
            emergency_purge = config.enable_emergency_purge,
            "budget controller initialized"
        );
        Self {
            config,
            current_usage: 0,
            peak_usage: 0,
            current_frame: 0,
            last_pressure: PressureLevel::None,
            last_cleanup_frame: None,
            last_emergency_frame: None,
            cleanup_count: 0,
            emergency_purge_count: 0,
            total_bytes_freed: 0,
            cleanup_hooks: Vec::new(),
            emergency_hooks: Vec::new(),
            emergency_signal: EmergencySignal::new(),
        }
    }

    /// Handle the thermal loop clones to request purges from its own thread.
    pub fn emergency_signal(&self) -> EmergencySignal {
        self.emergency_signal.clone()
    }

    pub fn register_cleanup_hook(&mut self, hook: Box<dyn CleanupHook>) {
        self.cleanup_hooks.push(hook);
    }

    pub fn register_emergency_hook(&mut self, hook: Box<dyn EmergencyHook>) {
        self.emergency_hooks.push(hook);
    }

    /// Feed the host's own VRAM accounting for this frame. Recomputes the
    /// pressure level and dispatches any remediation that is due.
    pub fn update_usage(&mut self, current_vram_bytes: u64) {
        self.current_usage = current_vram_bytes;
        if self.current_usage > self.peak_usage {
            self.peak_usage = self.current_usage;
        }

        let new_pressure = self.pressure();
        if new_pressure != self.last_pressure {
            self.handle_pressure_change(new_pressure);
            self.last_pressure = new_pressure;
        }

        // The gated conditions are evaluated every call, independent of
        // whether the level changed this tick.
        if self.should_cleanup() {
            self.run_cleanup_pass();
        }
        if self.should_emergency_purge() {
            self.run_emergency_purge();
        }
    }

    /// Manual, ungated cleanup pass.
    pub fn request_cleanup(&mut self) {
        self.run_cleanup_pass();
    }

    /// Manual, ungated emergency purge. Same-thread variant of the signal.
    pub fn force_emergency_purge(&mut self) {
        self.run_emergency_purge();
    }

    /// Advance the frame counter, consume a pending thermal request, and emit
    /// periodic diagnostics.
    pub fn tick_frame(&mut self) {
        self.current_frame += 1;

        if self.emergency_signal.take() {
            warn!("emergency purge requested by external signal");
            self.run_emergency_purge();
        }

        if self.config.log_interval_frames > 0
            && self.current_frame % self.config.log_interval_frames == 0
        {
            let stats = self.stats();
            debug!(
                usage_mb = stats.current_usage_bytes / 1024 / 1024,
                cap_mb = stats.vram_cap_bytes / 1024 / 1024,
                usage_pct = stats.usage_percentage * 100.0,
                pressure = stats.pressure.as_str(),
                available_mb = self.available_bytes() / 1024 / 1024,
                "vram usage"
            );
        }
    }

    // ----- queries -----

    pub fn current_usage(&self) -> u64 {
        self.current_usage
    }

    pub fn peak_usage(&self) -> u64 {
        self.peak_usage
    }

    pub fn vram_cap(&self) -> u64 {
        self.config.vram_cap_bytes
    }

    pub fn usage_percentage(&self) -> f32 {
        if self.config.vram_cap_bytes == 0 {
            return 0.0;
        }
        self.current_usage as f32 / self.config.vram_cap_bytes as f32
    }

    pub fn pressure(&self) -> PressureLevel {
        self.config.thresholds.level_for_ratio(self.usage_percentage())
    }

    pub fn is_over_limit(&self) -> bool {
        self.current_usage > self.config.vram_cap_bytes
    }

    pub fn available_bytes(&self) -> u64 {
        self.config.vram_cap_bytes.saturating_sub(self.current_usage)
    }

    /// Pure query; does not reserve. The caller must re-check after actually
    /// allocating.
    pub fn can_allocate(&self, size_bytes: u64) -> bool {
        self.current_usage.saturating_add(size_bytes) <= self.config.vram_cap_bytes
    }

    pub fn stats(&self) -> BudgetStats {
        BudgetStats {
            current_usage_bytes: self.current_usage,
            vram_cap_bytes: self.config.vram_cap_bytes,
            usage_percentage: self.usage_percentage(),
            pressure: self.pressure(),
            cleanup_count: self.cleanup_count,
            emergency_purge_count: self.emergency_purge_count,
            total_bytes_freed: self.total_bytes_freed,
            current_frame: self.current_frame,
        }
    }

    // ----- internals -----

    fn handle_pressure_change(&mut self, new_pressure: PressureLevel) {
        info!(
            from = self.last_pressure.as_str(),
            to = new_pressure.as_str(),
            usage_pct = self.usage_percentage() * 100.0,
            "memory pressure changed"
        );

        if new_pressure >= PressureLevel::High
            && self.config.enable_auto_cleanup
            && self.cleanup_gate_open()
        {
            warn!("high memory pressure, requesting cleanup");
            self.run_cleanup_pass();
        }

        if new_pressure == PressureLevel::Critical
            && self.config.enable_emergency_purge
            && self.emergency_gate_open()
        {
            error!("critical memory pressure, executing emergency purge");
            self.run_emergency_purge();
        }
    }

    fn should_cleanup(&self) -> bool {
        self.config.enable_auto_cleanup
            && self.current_usage >= self.config.cleanup_threshold_bytes
            && self.cleanup_gate_open()
    }

    fn should_emergency_purge(&self) -> bool {
        self.config.enable_emergency_purge
            && self.current_usage >= self.config.emergency_threshold_bytes
            && self.emergency_gate_open()
    }

    fn cleanup_gate_open(&self) -> bool {
        gate_open(
            self.last_cleanup_frame,
            self.current_frame,
            self.config.cleanup_min_interval_frames,
        )
    }

    fn emergency_gate_open(&self) -> bool {
        gate_open(
            self.last_emergency_frame,
            self.current_frame,
            self.config.emergency_min_interval_frames,
        )
    }

    fn run_cleanup_pass(&mut self) -> u64 {
        info!(
            usage_mb = self.current_usage / 1024 / 1024,
            cap_mb = self.config.vram_cap_bytes / 1024 / 1024,
            "executing vram cleanup"
        );

        let mut total_freed: u64 = 0;
        for hook in &mut self.cleanup_hooks {
            let freed = hook.reclaim();
            total_freed = total_freed.saturating_add(freed);
            debug!(freed_mb = freed / 1024 / 1024, "cleanup hook ran");
        }

        self.cleanup_count += 1;
        self.total_bytes_freed = self.total_bytes_freed.saturating_add(total_freed);
        self.last_cleanup_frame = Some(self.current_frame);

        info!(freed_mb = total_freed / 1024 / 1024, "cleanup completed");
        total_freed
    }

    fn run_emergency_purge(&mut self) {
        error!(
            usage_mb = self.current_usage / 1024 / 1024,
            cap_mb = self.config.vram_cap_bytes / 1024 / 1024,
            usage_pct = self.usage_percentage() * 100.0,
            "emergency vram purge"
        );

        if self.emergency_hooks.is_empty() {
            warn!("no emergency hooks registered, falling back to cleanup only");
        }
        for hook in &mut self.emergency_hooks {
            hook.purge();
        }

        // The follow-up cleanup is unconditional and observes fresh state:
        // cleanup hooks run after the emergency hooks have already freed
        // whatever they could.
        self.run_cleanup_pass();

        self.emergency_purge_count += 1;
        self.last_emergency_frame = Some(self.current_frame);

        warn!("emergency purge completed");
    }
}

fn gate_open(last: Option<u64>, now: u64, min_interval: u64) -> bool {
    match last {
        None => true,
        Some(frame) => now.saturating_sub(frame) >= min_interval,
    }
}

#[cfg(test)]
mod tests {
    use super::gate_open;

    #[test]
    fn gate_is_unarmed_before_first_pass() {
        assert!(gate_open(None, 0, 60));
        assert!(gate_open(None, 10, 60));
    }

    #[test]
    fn gate_respects_interval() {
        assert!(!gate_open(Some(5), 6, 60));
        assert!(!gate_open(Some(5), 64, 60));
        assert!(gate_open(Some(5), 65, 60));
    }
}
