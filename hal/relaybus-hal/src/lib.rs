//! Relaybus Hardware Abstraction Layer
//!
//! This crate defines hardware abstraction traits that chip-specific HALs
//! implement, so relay drivers stay independent of the microcontroller.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (relaybus-firmware)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  relaybus-drivers (relay channels)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  relaybus-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  relaybus-hal-rp2040                    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Contents
//!
//! - [`gpio::OutputPin`] - Digital output
//! - [`uart::UartConfig`] - Serial line settings and RTU timing

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod uart;

// Re-export key items at crate root for convenience
pub use gpio::OutputPin;
pub use uart::UartConfig;
