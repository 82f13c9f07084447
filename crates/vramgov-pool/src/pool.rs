//! Command pool: acquire/release with auto expand/shrink.
//!
//! The one component here that needs internal mutual exclusion: recording may
//! run on more than one logical producer concurrently with frame-boundary
//! maintenance. A single pool-wide mutex guards bookkeeping only.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, info, warn};

use vramgov_core::{BufferId, PoolConfig};

use crate::buffer::{BufferOrigin, CommandBuffer};

const LOG_INTERVAL_FRAMES: u64 = 300;

/// Shrink only when more than this fraction of tracked buffers sit idle.
const SHRINK_AVAILABLE_NUM: usize = 3;
const SHRINK_AVAILABLE_DEN: usize = 4;

/// Point-in-time statistics snapshot, taken under the pool lock.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PoolStats {
    pub total_buffers: usize,
    pub available_buffers: usize,
    pub active_buffers: usize,
    pub total_memory_bytes: u64,
    pub total_acquisitions: u64,
    pub total_releases: u64,
    pub pool_expansions: u64,
    pub pool_shrinks: u64,
    pub current_frame: u64,
}

struct PoolInner {
    available: Vec<CommandBuffer>,
    tracked_total: usize,
    active: usize,
    next_alloc_id: u64,

    total_acquisitions: u64,
    total_releases: u64,
    pool_expansions: u64,
    pool_shrinks: u64,
    current_frame: u64,
    last_shrink_frame: u64,
}

/// Thread-safe pool of reusable command buffers.
pub struct CommandPool {
    config: PoolConfig,
    inner: Mutex<PoolInner>,
}

impl CommandPool {
    pub fn new(config: PoolConfig) -> Self {
        info!(
            buffer_kb = config.buffer_size / 1024,
            initial = config.initial_pool_size,
            max = config.max_pool_size,
            "command pool initialized"
        );

        let mut inner = PoolInner {
            available: Vec::with_capacity(config.initial_pool_size),
            tracked_total: 0,
            active: 0,
            next_alloc_id: 0,
            total_acquisitions: 0,
            total_releases: 0,
            pool_expansions: 0,
            pool_shrinks: 0,
            current_frame: 0,
            last_shrink_frame: 0,
        };
        for _ in 0..config.initial_pool_size {
            let buf = create_tracked(&mut inner, config.buffer_size);
            inner.available.push(buf);
            inner.tracked_total += 1;
        }

        Self {
            config,
            inner: Mutex::new(inner),
        }
    }

    /// Pop a buffer for recording. Prefers a pooled buffer; expands the pool
    /// if allowed; past the maximum, degrades to an untracked overflow buffer
    /// rather than blocking the frame.
    pub fn acquire_buffer(&self) -> CommandBuffer {
        let mut inner = self.lock();
        inner.total_acquisitions += 1;

        if let Some(mut buf) = inner.available.pop() {
            buf.reset();
            inner.active += 1;
            return buf;
        }

        if self.config.auto_expand && inner.tracked_total < self.config.max_pool_size {
            let buf = create_tracked(&mut inner, self.config.buffer_size);
            inner.tracked_total += 1;
            inner.pool_expansions += 1;
            inner.active += 1;
            debug!(total = inner.tracked_total, "pool expanded");
            return buf;
        }

        warn!(
            max = self.config.max_pool_size,
            "pool exhausted, allocating temporary overflow buffer"
        );
        CommandBuffer::with_capacity(self.config.buffer_size, BufferOrigin::Overflow)
    }

    /// Return a buffer. Tracked buffers rejoin the available set; overflow
    /// buffers are simply dropped.
    pub fn release_buffer(&self, mut buffer: CommandBuffer) {
        let mut inner = self.lock();
        inner.total_releases += 1;

        match buffer.origin() {
            BufferOrigin::Tracked { .. } => {
                buffer.reset();
                inner.available.push(buffer);
                inner.active = inner.active.saturating_sub(1);
            }
            BufferOrigin::Overflow => {
                // Dropped at end of scope.
            }
        }
    }

    /// Advance the frame counter, run the auto-shrink policy, and emit
    /// periodic diagnostics.
    pub fn tick_frame(&self) {
        let mut inner = self.lock();
        inner.current_frame += 1;

        if self.config.auto_shrink && self.should_shrink(&inner) {
            self.shrink_locked(&mut inner);
        }

        if inner.current_frame % LOG_INTERVAL_FRAMES == 0 {
            let stats = stats_locked(&inner, &self.config);
            debug!(
                total = stats.total_buffers,
                available = stats.available_buffers,
                active = stats.active_buffers,
                memory_mb = stats.total_memory_bytes / 1024 / 1024,
                "command pool stats"
            );
        }
    }

    /// Manually grow the tracked pool by up to `count` buffers (clamped to
    /// the configured maximum).
    pub fn expand_pool(&self, count: usize) {
        let mut inner = self.lock();
        let count = count.min(self.config.max_pool_size.saturating_sub(inner.tracked_total));
        if count == 0 {
            return;
        }
        for _ in 0..count {
            let buf = create_tracked(&mut inner, self.config.buffer_size);
            inner.available.push(buf);
            inner.tracked_total += 1;
        }
        inner.pool_expansions += 1;
        info!(added = count, total = inner.tracked_total, "pool manually expanded");
    }

    /// Manual, ungated shrink.
    pub fn shrink_pool(&self) {
        let mut inner = self.lock();
        self.shrink_locked(&mut inner);
    }

    pub fn stats(&self) -> PoolStats {
        let inner = self.lock();
        stats_locked(&inner, &self.config)
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    // ----- internals -----

    fn lock(&self) -> std::sync::MutexGuard<'_, PoolInner> {
        // A panicked writer cannot corrupt the bookkeeping (buffers move by
        // value), so recover rather than propagate poisoning.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn should_shrink(&self, inner: &PoolInner) -> bool {
        if inner.current_frame - inner.last_shrink_frame < self.config.shrink_delay_frames {
            return false;
        }
        inner.tracked_total > self.config.initial_pool_size
            && inner.available.len() * SHRINK_AVAILABLE_DEN > inner.tracked_total * SHRINK_AVAILABLE_NUM
    }

    /// Drop half of the excess over the initial size, bounded by what is
    /// actually available, never going below the initial size.
    fn shrink_locked(&self, inner: &mut PoolInner) {
        let excess = inner.tracked_total.saturating_sub(self.config.initial_pool_size);
        let removable = excess.min(inner.available.len());
        let to_remove = removable.div_ceil(2);
        if to_remove == 0 {
            return;
        }

        for _ in 0..to_remove {
            drop(inner.available.pop());
            inner.tracked_total -= 1;
        }

        inner.pool_shrinks += 1;
        inner.last_shrink_frame = inner.current_frame;
        info!(removed = to_remove, total = inner.tracked_total, "pool shrunk");
    }
}

fn create_tracked(inner: &mut PoolInner, size: usize) -> CommandBuffer {
    let alloc_id = BufferId::new(inner.next_alloc_id);
    inner.next_alloc_id += 1;
    CommandBuffer::with_capacity(size, BufferOrigin::Tracked { alloc_id })
}

fn stats_locked(inner: &PoolInner, config: &PoolConfig) -> PoolStats {
    PoolStats {
        total_buffers: inner.tracked_total,
        available_buffers: inner.available.len(),
        active_buffers: inner.active,
        total_memory_bytes: (inner.tracked_total * config.buffer_size) as u64,
        total_acquisitions: inner.total_acquisitions,
        total_releases: inner.total_releases,
        pool_expansions: inner.pool_expansions,
        pool_shrinks: inner.pool_shrinks,
        current_frame: inner.current_frame,
    }
}
