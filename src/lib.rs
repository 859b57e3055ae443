//! Telescope control daemon core: motor driver, controller, wire codec, and
//! protocol server. Split into a library so `tests/` can drive the wire
//! codec and controller end to end the way the teacher's
//! `star_adventurer_control` crate is exercised from `tests/integration_test.rs`.

#[cfg(test)]
#[macro_use]
extern crate assert_float_eq;

pub mod astro_math;
pub mod calibration;
pub mod config;
pub mod controller;
pub mod ephemeris;
pub mod error;
pub mod hal;
pub mod motor;
pub mod plugins;
pub mod protocol;
pub mod server;
