//! Serial console adapter.
//!
//! Reads single-byte operator commands from stdin (the UART console on
//! ESP-IDF) on a dedicated thread and forwards them to the lock-free
//! [`events`](crate::events) queue.  The console thread never touches the
//! monitor state itself.
//!
//! | Byte | Request               |
//! |------|-----------------------|
//! | `c`  | calibrate (default n) |
//! | `r`  | reset calibration     |

use std::io::{ErrorKind, Read};
use std::thread::JoinHandle;

use log::{debug, warn};

use crate::app::commands::MonitorCommand;
use crate::events::{push_event, Event};

const CONSOLE_STACK_SIZE: usize = 4096;
#[cfg(all(target_os = "espidf", feature = "espidf"))]
const IDLE_POLL_MS: u64 = 50;

/// Queue request for a console byte, if it is a command.
pub fn event_for_byte(byte: u8) -> Option<Event> {
    match MonitorCommand::from_console_byte(byte)? {
        MonitorCommand::Calibrate | MonitorCommand::CalibrateWith(_) => {
            Some(Event::CalibrateRequested)
        }
        MonitorCommand::ResetCalibration => Some(Event::ResetRequested),
    }
}

/// Pump bytes from `reader` into `push` until end of input.
/// Returns the number of requests accepted by `push`.
pub fn forward_commands(mut reader: impl Read, mut push: impl FnMut(Event) -> bool) -> usize {
    let mut accepted = 0;
    let mut buf = [0u8; 16];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => {
                #[cfg(all(target_os = "espidf", feature = "espidf"))]
                {
                    // The UART VFS reports 0 bytes when idle instead of blocking.
                    std::thread::sleep(std::time::Duration::from_millis(IDLE_POLL_MS));
                    continue;
                }
                #[cfg(not(all(target_os = "espidf", feature = "espidf")))]
                return accepted;
            }
            Ok(n) => {
                for event in buf[..n].iter().filter_map(|b| event_for_byte(*b)) {
                    if push(event) {
                        debug!("console: queued {:?}", event);
                        accepted += 1;
                    } else {
                        warn!("console: request queue full, dropped {:?}", event);
                    }
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted || e.kind() == ErrorKind::WouldBlock => {
                #[cfg(all(target_os = "espidf", feature = "espidf"))]
                std::thread::sleep(std::time::Duration::from_millis(IDLE_POLL_MS));
            }
            Err(e) => {
                warn!("console: read failed ({}), reader stopped", e);
                return accepted;
            }
        }
    }
}

/// Start the console reader thread on stdin.
pub fn spawn_console_reader() -> std::io::Result<JoinHandle<usize>> {
    std::thread::Builder::new()
        .name("console".into())
        .stack_size(CONSOLE_STACK_SIZE)
        .spawn(|| forward_commands(std::io::stdin().lock(), push_event))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_command_bytes_become_requests() {
        assert_eq!(event_for_byte(b'c'), Some(Event::CalibrateRequested));
        assert_eq!(event_for_byte(b'r'), Some(Event::ResetRequested));
        assert_eq!(event_for_byte(b'\r'), None);
        assert_eq!(event_for_byte(b'z'), None);
    }

    #[test]
    fn forwards_until_eof() {
        let mut seen = Vec::new();
        let n = forward_commands(&b"c\r\nxr\nc\n"[..], |e| {
            seen.push(e);
            true
        });
        assert_eq!(n, 3);
        assert_eq!(
            seen,
            vec![Event::CalibrateRequested, Event::ResetRequested, Event::CalibrateRequested]
        );
    }

    #[test]
    fn full_queue_is_not_counted() {
        let n = forward_commands(&b"cc"[..], |_| false);
        assert_eq!(n, 0);
    }
}
