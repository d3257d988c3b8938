//! Inbound commands to the monitor service.
//!
//! These represent operator actions (serial console today) that the
//! [`MonitorService`](super::service::MonitorService) interprets and acts
//! upon.  Both run out of band and may block the control loop.

use crate::events::Event;

/// Commands that external adapters can send into the monitor core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorCommand {
    /// Calibrate R0 with the configured default sample count.
    Calibrate,

    /// Calibrate R0 with an explicit sample count (validated by the engine).
    CalibrateWith(u8),

    /// Forget R0 and fall back to the default baseline.
    ResetCalibration,
}

impl MonitorCommand {
    /// Single-byte console protocol: `c` calibrates, `r` resets.
    /// Anything else (including line endings) is ignored.
    pub fn from_console_byte(byte: u8) -> Option<Self> {
        match byte {
            b'c' | b'C' => Some(Self::Calibrate),
            b'r' | b'R' => Some(Self::ResetCalibration),
            _ => None,
        }
    }
}

impl From<Event> for MonitorCommand {
    fn from(event: Event) -> Self {
        match event {
            Event::CalibrateRequested => Self::Calibrate,
            Event::ResetRequested => Self::ResetCalibration,
        }
    }
}
