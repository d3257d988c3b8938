//! Application core: pure domain logic, zero I/O.
//!
//! This module wires the CO sensing pipeline, calibration engine, alarm
//! classifier and buzzer pattern into one owned [`service::MonitorService`].
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
