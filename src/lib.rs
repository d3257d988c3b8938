//! CO monitor firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(all(target_os = "espidf", feature = "espidf"))]` within each module.

#![deny(unused_must_use)]

pub mod alarm;
pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod pins;
pub mod scheduler;

// The hardware-facing modules compile on every target; their ESP-IDF
// implementations are guarded by cfg attributes inside.
pub mod adapters;
pub mod drivers;
pub mod sensors;
