//! Relay output drivers

pub mod bank;
pub mod gpio;

pub use bank::RelayBank;
pub use gpio::GpioRelay;
