//! Register map
//!
//! The fixed set of coils and holding registers remote clients see. The map
//! owns no behavior: it stores values at published addresses and is shared
//! between the transport and the control loop.
//!
//! ```text
//! Coils                          Holding registers
//! 0..8    manual start           100..108  run duration (ms)
//! 20..28  arm                    500       firmware version
//! 30      global trigger         501..511  device name
//! 40      any relay on (ro)      511       serial high
//! 60      emergency stop         512       serial low
//! ```
//!
//! Eight per-relay slots are always present, whatever the number of wired
//! relays.

mod address;

pub use address::*;

use relaybus_protocol::ExceptionCode;

use crate::identity::{split_serial, Identity, DEVICE_NAME_REGISTERS};

/// Per-relay slots in the register layout
pub const RELAY_SLOTS: usize = 8;

/// Errors from client access by address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccessError {
    /// Address not mapped
    Unmapped(u16),
    /// Entry cannot be written by clients
    ReadOnly(u16),
}

impl From<AccessError> for ExceptionCode {
    fn from(_: AccessError) -> Self {
        ExceptionCode::IllegalDataAddress
    }
}

/// Coil and holding register storage
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterMap {
    manual_start: [bool; RELAY_SLOTS],
    arm: [bool; RELAY_SLOTS],
    global_trigger: bool,
    any_relay_on: bool,
    emergency_stop: bool,
    run_duration: [u16; RELAY_SLOTS],
    firmware_version: u16,
    device_name: [u16; DEVICE_NAME_REGISTERS],
    serial_high: u16,
    serial_low: u16,
}

impl Default for RegisterMap {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterMap {
    /// Create a register map with every entry cleared
    pub const fn new() -> Self {
        Self {
            manual_start: [false; RELAY_SLOTS],
            arm: [false; RELAY_SLOTS],
            global_trigger: false,
            any_relay_on: false,
            emergency_stop: false,
            run_duration: [0; RELAY_SLOTS],
            firmware_version: 0,
            device_name: [0; DEVICE_NAME_REGISTERS],
            serial_high: 0,
            serial_low: 0,
        }
    }

    /// Populate the identity registers
    pub fn provision(&mut self, identity: &Identity) {
        let (high, low) = split_serial(identity.serial);
        self.firmware_version = identity.version.encode();
        self.device_name = identity.device_name;
        self.serial_high = high;
        self.serial_low = low;
    }

    /// Current value of a coil
    ///
    /// Slots past [`RELAY_SLOTS`] read as off.
    pub fn coil(&self, coil: Coil) -> bool {
        match coil {
            Coil::ManualStart(slot) => self.manual_start.get(slot).copied().unwrap_or(false),
            Coil::Arm(slot) => self.arm.get(slot).copied().unwrap_or(false),
            Coil::GlobalTrigger => self.global_trigger,
            Coil::AnyRelayOn => self.any_relay_on,
            Coil::EmergencyStop => self.emergency_stop,
        }
    }

    /// Overwrite a coil
    ///
    /// Slots past [`RELAY_SLOTS`] are ignored.
    pub fn set_coil(&mut self, coil: Coil, value: bool) {
        let entry = match coil {
            Coil::ManualStart(slot) => self.manual_start.get_mut(slot),
            Coil::Arm(slot) => self.arm.get_mut(slot),
            Coil::GlobalTrigger => Some(&mut self.global_trigger),
            Coil::AnyRelayOn => Some(&mut self.any_relay_on),
            Coil::EmergencyStop => Some(&mut self.emergency_stop),
        };
        if let Some(entry) = entry {
            *entry = value;
        }
    }

    /// Current value of a holding register
    pub fn holding(&self, register: Holding) -> u16 {
        match register {
            Holding::RunDuration(slot) => self.run_duration.get(slot).copied().unwrap_or(0),
            Holding::FirmwareVersion => self.firmware_version,
            Holding::DeviceName(index) => self.device_name.get(index).copied().unwrap_or(0),
            Holding::SerialHigh => self.serial_high,
            Holding::SerialLow => self.serial_low,
        }
    }

    /// Overwrite a holding register
    pub fn set_holding(&mut self, register: Holding, value: u16) {
        let entry = match register {
            Holding::RunDuration(slot) => self.run_duration.get_mut(slot),
            Holding::FirmwareVersion => Some(&mut self.firmware_version),
            Holding::DeviceName(index) => self.device_name.get_mut(index),
            Holding::SerialHigh => Some(&mut self.serial_high),
            Holding::SerialLow => Some(&mut self.serial_low),
        };
        if let Some(entry) = entry {
            *entry = value;
        }
    }

    /// Read a coil by client address
    pub fn read_coil(&self, address: u16) -> Result<bool, AccessError> {
        let coil = Coil::from_address(address).ok_or(AccessError::Unmapped(address))?;
        Ok(self.coil(coil))
    }

    /// Resolve a coil address a client may write
    pub fn writable_coil(&self, address: u16) -> Result<Coil, AccessError> {
        let coil = Coil::from_address(address).ok_or(AccessError::Unmapped(address))?;
        if !coil.client_writable() {
            return Err(AccessError::ReadOnly(address));
        }
        Ok(coil)
    }

    /// Write a coil by client address
    pub fn write_coil(&mut self, address: u16, value: bool) -> Result<(), AccessError> {
        let coil = self.writable_coil(address)?;
        self.set_coil(coil, value);
        Ok(())
    }

    /// Read a holding register by client address
    pub fn read_holding(&self, address: u16) -> Result<u16, AccessError> {
        let register = Holding::from_address(address).ok_or(AccessError::Unmapped(address))?;
        Ok(self.holding(register))
    }

    /// Resolve a holding register address a client may write
    pub fn writable_holding(&self, address: u16) -> Result<Holding, AccessError> {
        let register = Holding::from_address(address).ok_or(AccessError::Unmapped(address))?;
        if !register.client_writable() {
            return Err(AccessError::ReadOnly(address));
        }
        Ok(register)
    }

    /// Write a holding register by client address
    pub fn write_holding(&mut self, address: u16, value: u16) -> Result<(), AccessError> {
        let register = self.writable_holding(address)?;
        self.set_holding(register, value);
        Ok(())
    }
}
