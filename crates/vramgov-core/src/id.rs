//! Strongly-typed identifiers used across the governance crates.
//!
//! Downstream crates (budget, gc, pool) should *not* use raw integers for IDs.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! new_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(v: u64) -> Self {
                Self(v)
            }
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

/// Opaque handle for a tracked graphics resource (texture, render target, ...).
/// The eviction engine never interprets the value; the host assigns it.
new_id!(ResourceId);

/// Allocation id stamped on tracked pool buffers.
new_id!(BufferId);
