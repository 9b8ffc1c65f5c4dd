//! Hardware-independent core library for ferraris
//!
//! This crate contains all platform-agnostic logic for the ferraris optical
//! energy meter: the per-tick edge detector, the instantaneous usage
//! estimator, the per-minute rotation aggregator, the 120 minute history
//! store, the shared-state wrapper that hands consistent snapshots to
//! readers, and the request router that renders the meter's pages.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets (ESP32-S3) and desktop hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod app_state;
pub mod config;
pub mod engine;
pub mod pages;
pub mod sensor;
pub mod storage;

pub use app_state::SharedMeter;
pub use config::{ConfigError, MarkingPolarity, MeterConfig};
pub use engine::{MeterEngine, MeterSnapshot, TickOutcome};
