//! Operator request queue.
//!
//! Requests are produced by the console reader (UART / stdin task) and
//! consumed by the main control loop, which turns each one into a
//! [`MonitorCommand`](crate::app::commands::MonitorCommand).  Because only
//! the loop consumes, a calibration can never overlap itself or a
//! sampling pass.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Console RX  │────▶│  Event Queue │────▶│  Main Loop   │
//! │ (producer)  │     │  (lock-free) │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use core::sync::atomic::{AtomicU8, Ordering};

/// Maximum number of pending events.
/// Power of 2 for efficient ring buffer modulo.
const EVENT_QUEUE_CAP: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Event {
    /// Operator asked for a clean-air calibration.
    CalibrateRequested = 0,
    /// Operator asked to forget the stored baseline.
    ResetRequested     = 1,
}

// ── Lock-free SPSC ring buffer ────────────────────────────────
//
// The console task writes (produces), the main loop reads (consumes).
// Uses atomic head/tail indices.  The buffer lives in a static so the
// producer needs no handle.

static EVENT_HEAD: AtomicU8 = AtomicU8::new(0);
static EVENT_TAIL: AtomicU8 = AtomicU8::new(0);
static EVENT_BUFFER: [AtomicU8; EVENT_QUEUE_CAP] = [const { AtomicU8::new(0) }; EVENT_QUEUE_CAP];

/// Push an event into the queue.
/// Returns `false` if the queue is full (event dropped).
pub fn push_event(event: Event) -> bool {
    let head = EVENT_HEAD.load(Ordering::Relaxed);
    let tail = EVENT_TAIL.load(Ordering::Acquire);
    let next_head = (head + 1) % EVENT_QUEUE_CAP as u8;

    if next_head == tail {
        return false; // Full, drop.
    }

    EVENT_BUFFER[head as usize].store(event as u8, Ordering::Relaxed);
    EVENT_HEAD.store(next_head, Ordering::Release);
    true
}

/// Pop the next event from the queue.
/// Called from the main loop (single consumer).
/// Returns `None` if the queue is empty.
pub fn pop_event() -> Option<Event> {
    let tail = EVENT_TAIL.load(Ordering::Relaxed);
    let head = EVENT_HEAD.load(Ordering::Acquire);

    if tail == head {
        return None; // Empty.
    }

    let raw = EVENT_BUFFER[tail as usize].load(Ordering::Relaxed);
    EVENT_TAIL.store((tail + 1) % EVENT_QUEUE_CAP as u8, Ordering::Release);

    event_from_u8(raw)
}

/// Drain all pending events into a callback.
/// Processes events in FIFO order.
pub fn drain_events(mut handler: impl FnMut(Event)) {
    while let Some(event) = pop_event() {
        handler(event);
    }
}

/// Check if the event queue is empty.
pub fn queue_is_empty() -> bool {
    let tail = EVENT_TAIL.load(Ordering::Relaxed);
    let head = EVENT_HEAD.load(Ordering::Acquire);
    tail == head
}

/// Number of pending events.
pub fn queue_len() -> usize {
    let head = EVENT_HEAD.load(Ordering::Relaxed) as usize;
    let tail = EVENT_TAIL.load(Ordering::Relaxed) as usize;
    (head + EVENT_QUEUE_CAP - tail) % EVENT_QUEUE_CAP
}

// ── Internal ──────────────────────────────────────────────────

fn event_from_u8(raw: u8) -> Option<Event> {
    match raw {
        0 => Some(Event::CalibrateRequested),
        1 => Some(Event::ResetRequested),
        _ => None,
    }
}
