#![forbid(unsafe_code)]
//! vramgov-gc: decides which tracked graphics resources are safe and
//! worthwhile to reclaim, in priority order.
//!
//! Naive LRU would repeatedly discard and recreate render targets (expensive)
//! and frequently-reused textures (wasteful). The layered grace periods here
//! bias eviction toward large, cold, disposable resources first while still
//! allowing aggressive reclamation once true pressure is detected.
//!
//! The engine is advisory: `list_purge_candidates` never destroys anything.
//! The host translates the returned ids into graphics-API destruction and
//! reports back via `unregister_resource`. Only `force_cleanup` removes
//! tracking synchronously.

pub mod engine;

pub use engine::{EvictionEngine, EvictionStats, TrackedResource};
