//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements            | Connects to                 |
//! |------------|-----------------------|-----------------------------|
//! | `hardware` | AnalogPort + DelayNs  | ESP32 ADC1, delay provider  |
//! |            | BuzzerPort            | GPIO / LEDC tone            |
//! | `log_sink` | EventSink             | Serial log output           |
//! | `nvs`      | BaselineStore         | NVS / in-memory store       |
//! |            | ConfigPort            |                             |
//! | `time`     | (clock)               | ESP32 system timer          |
//! | `console`  | (request producer)    | UART stdin → event queue    |

pub mod console;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
