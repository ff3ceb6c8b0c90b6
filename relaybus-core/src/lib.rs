//! Board-agnostic core logic for the relay board firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Register map with the published client address layout
//! - Per-relay state machine (idle, armed, timed run)
//! - Cyclic control loop driving the relay outputs
//! - Register service executing Modbus requests against the map
//! - Identity register encoding (version, device name, serial)
//! - Board configuration type definitions
//! - Hardware abstraction traits

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod bus;
pub mod config;
pub mod control;
pub mod identity;
pub mod registers;
pub mod relay;
pub mod traits;
