//! Actuator drivers and hardware initialisation.

pub mod buzzer;
pub mod heater;
pub mod hw_init;
