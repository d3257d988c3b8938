//! CO sensing: the MQ-7 signal pipeline, its warm-up gate and the
//! clean-air baseline calibration.
//!
//! The pipeline reads R0 and the warm-up flag from the calibration engine
//! at sample time; the engine reuses the pipeline's averaging front end so
//! calibration and normal sampling see identical Rs values.

pub mod calibration;
pub mod co;
pub mod warmup;
