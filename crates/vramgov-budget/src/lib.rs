#![forbid(unsafe_code)]
//! vramgov-budget: the single source of truth for "how much VRAM is in use
//! versus how much is allowed", and the trigger point for remediation.
//!
//! Responsibilities:
//! - Classify usage into a [`PressureLevel`] and log transitions.
//! - Escalate on High (cleanup) and Critical (emergency purge) pressure.
//! - Enforce the absolute cleanup/emergency byte thresholds behind frame-gap
//!   gates so a hook that frees too little is not re-invoked every frame.
//! - Expose [`EmergencySignal`] so the thermal loop can request a purge from
//!   its own thread without touching controller state directly.
//!
//! The controller is single-threaded by design (`&mut self`, render thread
//! only); the signal is the one cross-thread surface.
//!
//! [`PressureLevel`]: vramgov_core::PressureLevel

pub mod controller;
pub mod signal;
pub mod tier;

pub use controller::{BudgetController, BudgetStats};
pub use signal::EmergencySignal;
pub use tier::detect_device_tier;
