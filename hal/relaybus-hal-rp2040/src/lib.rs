//! RP2040-specific HAL for the relay board firmware
//!
//! This crate provides RP2040-specific implementations of the shared
//! `relaybus-hal` traits, plus RP2040-specific functionality:
//!
//! - Output pins implementing `relaybus_hal::OutputPin`
//! - Dynamic pin allocation for config-driven setup
//! - UART line configuration for the fieldbus port
//! - Hardware address derived from the flash unique id

#![no_std]

pub mod flash;
pub mod gpio;
pub mod pins;
pub mod uart;

pub use gpio::RpOutput;
pub use pins::{PinBank, PinError, RemainingPeripherals};
