//! Eviction engine: registry, candidate selection, and forced reclamation.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, trace};

use vramgov_core::{EvictionConfig, ResourceId};

/// Frames a resource must have gone unused before `force_cleanup` may free it.
const FORCE_CLEANUP_MIN_UNUSED_FRAMES: u64 = 10;

/// Use count past which a resource is considered hot and earns extra grace.
const HOT_USE_COUNT: u64 = 100;

/// Cap on the candidate list under pressure, bounding per-frame host work.
const PRESSURE_CANDIDATE_CAP: usize = 50;

const LOG_INTERVAL_FRAMES: u64 = 300;

/// Metadata for one tracked graphics resource. Owned exclusively by the
/// engine: created on register, updated on mark-used, destroyed on unregister
/// or a successful forced purge.
#[derive(Debug, Clone, Copy)]
pub struct TrackedResource {
    pub size_bytes: u64,
    pub last_used_frame: u64,
    pub use_count: u64,
    /// Render targets and similar recreate-expensive resources get double
    /// grace before eviction.
    pub pinned: bool,
}

/// Point-in-time statistics snapshot.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EvictionStats {
    pub tracked_resources: u64,
    pub estimated_vram_bytes: u64,
    pub resources_purged: u64,
    pub vram_freed_bytes: u64,
    pub current_frame: u64,
}

/// Registry of tracked resources plus the purge policy.
///
/// Single-threaded: all calls must come from the render thread, in the
/// per-frame order usage-update, candidate query, destroy, unregister.
pub struct EvictionEngine {
    config: EvictionConfig,
    current_frame: u64,
    estimated_vram_bytes: u64,
    tracked: HashMap<ResourceId, TrackedResource>,

    resources_purged: u64,
    vram_freed_bytes: u64,
}

impl EvictionEngine {
    pub fn new(config: EvictionConfig) -> Self {
        info!(
            threshold_frames = config.unused_frame_threshold,
            aggressive = config.aggressive_mode,
            "eviction engine initialized"
        );
        Self {
            config,
            current_frame: 0,
            estimated_vram_bytes: 0,
            tracked: HashMap::new(),
            resources_purged: 0,
            vram_freed_bytes: 0,
        }
    }

    /// Track a new resource. Re-registering an id overwrites it (last write
    /// wins) and keeps the running estimate exact.
    pub fn register_resource(&mut self, id: ResourceId, size_bytes: u64, pinned: bool) {
        let info = TrackedResource {
            size_bytes,
            last_used_frame: self.current_frame,
            use_count: 1,
            pinned,
        };
        if let Some(previous) = self.tracked.insert(id, info) {
            self.estimated_vram_bytes = self.estimated_vram_bytes.saturating_sub(previous.size_bytes);
        }
        self.estimated_vram_bytes = self.estimated_vram_bytes.saturating_add(size_bytes);

        trace!(%id, size_kb = size_bytes / 1024, pinned, "registered resource");
    }

    /// Record that a resource was referenced this frame. No-op for unknown
    /// ids. A resource not marked for long enough becomes a purge candidate.
    pub fn mark_used(&mut self, id: ResourceId) {
        if let Some(info) = self.tracked.get_mut(&id) {
            info.last_used_frame = self.current_frame;
            info.use_count += 1;
        }
    }

    /// Drop tracking for a resource the host destroyed through its own path.
    pub fn unregister_resource(&mut self, id: ResourceId) {
        if let Some(info) = self.tracked.remove(&id) {
            self.estimated_vram_bytes = self.estimated_vram_bytes.saturating_sub(info.size_bytes);
        }
    }

    /// Override the running estimate with the host's own accounting.
    pub fn update_memory_usage(&mut self, current_vram_bytes: u64) {
        self.estimated_vram_bytes = current_vram_bytes;
    }

    /// Resources it is safe and worthwhile to reclaim now, highest priority
    /// first. Advisory: tracked state is not mutated beyond the purge
    /// statistics; removal happens when the host calls `unregister_resource`.
    pub fn list_purge_candidates(&mut self) -> Vec<ResourceId> {
        let threshold = self.effective_threshold();
        let under_pressure = self.is_memory_pressure_high();

        let mut candidates: Vec<ResourceId> = self
            .tracked
            .iter()
            .filter(|(_, info)| {
                let frames_unused = self.current_frame - info.last_used_frame;
                should_purge(info, frames_unused, threshold, under_pressure)
            })
            .map(|(id, _)| *id)
            .collect();

        // Non-pinned before pinned, then larger first (frees more per
        // eviction), then colder first; id as the final key keeps repeated
        // queries identical.
        candidates.sort_unstable_by(|a, b| {
            let ia = &self.tracked[a];
            let ib = &self.tracked[b];
            ia.pinned
                .cmp(&ib.pinned)
                .then(ib.size_bytes.cmp(&ia.size_bytes))
                .then(ia.use_count.cmp(&ib.use_count))
                .then(a.cmp(b))
        });

        if under_pressure {
            candidates.truncate(PRESSURE_CANDIDATE_CAP);
        }

        if !candidates.is_empty() {
            debug!(
                count = candidates.len(),
                threshold_frames = threshold,
                "marked resources for purge"
            );
        }

        for id in &candidates {
            if let Some(info) = self.tracked.get(id) {
                self.resources_purged += 1;
                self.vram_freed_bytes = self.vram_freed_bytes.saturating_add(info.size_bytes);
            }
        }

        candidates
    }

    /// Emergency variant: synchronously unregister non-pinned resources,
    /// oldest-unused first (larger first among equally old), until at least
    /// `target_free_bytes` have been freed or candidates run out. Returns the
    /// bytes freed.
    pub fn force_cleanup(&mut self, target_free_bytes: u64) -> u64 {
        info!(target_mb = target_free_bytes / 1024 / 1024, "force cleanup requested");

        let mut candidates: Vec<(ResourceId, u64, u64)> = self
            .tracked
            .iter()
            .filter(|(_, info)| !info.pinned)
            .map(|(id, info)| {
                (*id, self.current_frame - info.last_used_frame, info.size_bytes)
            })
            .filter(|(_, frames_unused, _)| *frames_unused > FORCE_CLEANUP_MIN_UNUSED_FRAMES)
            .collect();

        candidates.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(b.2.cmp(&a.2)).then(a.0.cmp(&b.0)));

        let mut freed: u64 = 0;
        for (id, _, size) in candidates {
            if freed >= target_free_bytes {
                break;
            }
            freed = freed.saturating_add(size);
            self.unregister_resource(id);
            self.resources_purged += 1;
            self.vram_freed_bytes = self.vram_freed_bytes.saturating_add(size);
        }

        info!(freed_mb = freed / 1024 / 1024, "force cleanup completed");
        freed
    }

    /// Advance the frame counter and periodically emit diagnostics.
    pub fn tick_frame(&mut self) {
        self.current_frame += 1;

        if self.current_frame % LOG_INTERVAL_FRAMES == 0 {
            let stats = self.stats();
            debug!(
                tracked = stats.tracked_resources,
                vram_mb = stats.estimated_vram_bytes / 1024 / 1024,
                purged = stats.resources_purged,
                freed_mb = stats.vram_freed_bytes / 1024 / 1024,
                "eviction stats"
            );
        }
    }

    pub fn is_memory_pressure_high(&self) -> bool {
        self.estimated_vram_bytes > self.config.pressure_threshold_bytes
            || self.estimated_vram_bytes > self.config.max_target_bytes
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    pub fn estimated_vram_bytes(&self) -> u64 {
        self.estimated_vram_bytes
    }

    pub fn stats(&self) -> EvictionStats {
        EvictionStats {
            tracked_resources: self.tracked.len() as u64,
            estimated_vram_bytes: self.estimated_vram_bytes,
            resources_purged: self.resources_purged,
            vram_freed_bytes: self.vram_freed_bytes,
            current_frame: self.current_frame,
        }
    }

    fn effective_threshold(&self) -> u64 {
        if self.config.aggressive_mode && self.is_memory_pressure_high() {
            self.config.aggressive_threshold
        } else {
            self.config.unused_frame_threshold
        }
    }
}

fn should_purge(
    info: &TrackedResource,
    frames_unused: u64,
    threshold: u64,
    under_pressure: bool,
) -> bool {
    // Pinned resources (render targets) get double grace.
    if info.pinned {
        return frames_unused > threshold * 2;
    }

    // Hot resources get extra grace; recreating them is wasteful.
    if info.use_count > HOT_USE_COUNT {
        return frames_unused > threshold + 30;
    }

    // Under pressure, reclaim everything else more aggressively.
    if under_pressure {
        return frames_unused > threshold / 2;
    }

    frames_unused >= threshold
}
