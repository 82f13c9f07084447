#![forbid(unsafe_code)]
//! vramgov-pool: reusable command buffers for the recording path.
//!
//! Steady-state command recording must not allocate: buffers are acquired
//! from a pre-allocated pool, written, submitted, and released back. The pool
//! expands up to a configured maximum; past it, it hands out untracked
//! overflow buffers rather than blocking or failing the frame, trading one
//! transient allocation for never stalling.
//!
//! Buffers move by value and carry their origin tag, so "which set does this
//! buffer belong to" is a property of the value, not of how many owners point
//! to it. The pool lock covers only bookkeeping; writes happen outside it.

pub mod buffer;
pub mod pool;

pub use buffer::{BufferOrigin, CommandBuffer};
pub use pool::{CommandPool, PoolStats};
