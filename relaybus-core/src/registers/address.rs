//! Published register addresses

use super::RELAY_SLOTS;
use crate::identity::DEVICE_NAME_REGISTERS;

/// First manual start coil
pub const MANUAL_START_BASE: u16 = 0;
/// First arm coil
pub const ARM_BASE: u16 = 20;
/// Global trigger coil
pub const GLOBAL_TRIGGER: u16 = 30;
/// Aggregate status coil
pub const ANY_RELAY_ON: u16 = 40;
/// Emergency stop coil
pub const EMERGENCY_STOP: u16 = 60;

/// First run duration register
pub const RUN_DURATION_BASE: u16 = 100;
/// Firmware version register
pub const FIRMWARE_VERSION: u16 = 500;
/// First device name register
pub const DEVICE_NAME_BASE: u16 = 501;
/// Serial number, high half
pub const SERIAL_HIGH: u16 = 511;
/// Serial number, low half
pub const SERIAL_LOW: u16 = 512;

const SLOTS: u16 = RELAY_SLOTS as u16;
const NAME_LEN: u16 = DEVICE_NAME_REGISTERS as u16;

/// A named coil
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Coil {
    /// Level-triggered output request for a slot
    ManualStart(usize),
    /// Self-clearing arm command for a slot
    Arm(usize),
    /// Self-clearing trigger for all armed relays
    GlobalTrigger,
    /// Any output on, maintained by the control loop
    AnyRelayOn,
    /// Self-clearing emergency stop
    EmergencyStop,
}

impl Coil {
    /// Resolve a client address
    pub fn from_address(address: u16) -> Option<Self> {
        match address {
            a if (MANUAL_START_BASE..MANUAL_START_BASE + SLOTS).contains(&a) => {
                Some(Coil::ManualStart((a - MANUAL_START_BASE) as usize))
            }
            a if (ARM_BASE..ARM_BASE + SLOTS).contains(&a) => {
                Some(Coil::Arm((a - ARM_BASE) as usize))
            }
            GLOBAL_TRIGGER => Some(Coil::GlobalTrigger),
            ANY_RELAY_ON => Some(Coil::AnyRelayOn),
            EMERGENCY_STOP => Some(Coil::EmergencyStop),
            _ => None,
        }
    }

    /// Client address of this coil
    pub fn address(self) -> u16 {
        match self {
            Coil::ManualStart(slot) => MANUAL_START_BASE + slot as u16,
            Coil::Arm(slot) => ARM_BASE + slot as u16,
            Coil::GlobalTrigger => GLOBAL_TRIGGER,
            Coil::AnyRelayOn => ANY_RELAY_ON,
            Coil::EmergencyStop => EMERGENCY_STOP,
        }
    }

    /// Whether clients may write this coil
    pub fn client_writable(self) -> bool {
        !matches!(self, Coil::AnyRelayOn)
    }
}

/// A named holding register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Holding {
    /// Timed run length in milliseconds for a slot
    RunDuration(usize),
    /// Encoded firmware version
    FirmwareVersion,
    /// Two bytes of the device name
    DeviceName(usize),
    /// Upper 16 bits of the serial number
    SerialHigh,
    /// Lower 16 bits of the serial number
    SerialLow,
}

impl Holding {
    /// Resolve a client address
    pub fn from_address(address: u16) -> Option<Self> {
        match address {
            a if (RUN_DURATION_BASE..RUN_DURATION_BASE + SLOTS).contains(&a) => {
                Some(Holding::RunDuration((a - RUN_DURATION_BASE) as usize))
            }
            FIRMWARE_VERSION => Some(Holding::FirmwareVersion),
            a if (DEVICE_NAME_BASE..DEVICE_NAME_BASE + NAME_LEN).contains(&a) => {
                Some(Holding::DeviceName((a - DEVICE_NAME_BASE) as usize))
            }
            SERIAL_HIGH => Some(Holding::SerialHigh),
            SERIAL_LOW => Some(Holding::SerialLow),
            _ => None,
        }
    }

    /// Client address of this register
    pub fn address(self) -> u16 {
        match self {
            Holding::RunDuration(slot) => RUN_DURATION_BASE + slot as u16,
            Holding::FirmwareVersion => FIRMWARE_VERSION,
            Holding::DeviceName(index) => DEVICE_NAME_BASE + index as u16,
            Holding::SerialHigh => SERIAL_HIGH,
            Holding::SerialLow => SERIAL_LOW,
        }
    }

    /// Whether clients may write this register
    ///
    /// Identity registers are provisioned at startup and read-only after.
    pub fn client_writable(self) -> bool {
        matches!(self, Holding::RunDuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coil_addresses() {
        assert_eq!(Coil::from_address(0), Some(Coil::ManualStart(0)));
        assert_eq!(Coil::from_address(7), Some(Coil::ManualStart(7)));
        assert_eq!(Coil::from_address(8), None);
        assert_eq!(Coil::from_address(20), Some(Coil::Arm(0)));
        assert_eq!(Coil::from_address(27), Some(Coil::Arm(7)));
        assert_eq!(Coil::from_address(28), None);
        assert_eq!(Coil::from_address(30), Some(Coil::GlobalTrigger));
        assert_eq!(Coil::from_address(40), Some(Coil::AnyRelayOn));
        assert_eq!(Coil::from_address(60), Some(Coil::EmergencyStop));
        assert_eq!(Coil::from_address(0xFFFF), None);
    }

    #[test]
    fn test_holding_addresses() {
        assert_eq!(Holding::from_address(100), Some(Holding::RunDuration(0)));
        assert_eq!(Holding::from_address(107), Some(Holding::RunDuration(7)));
        assert_eq!(Holding::from_address(108), None);
        assert_eq!(Holding::from_address(500), Some(Holding::FirmwareVersion));
        assert_eq!(Holding::from_address(501), Some(Holding::DeviceName(0)));
        assert_eq!(Holding::from_address(510), Some(Holding::DeviceName(9)));
        assert_eq!(Holding::from_address(511), Some(Holding::SerialHigh));
        assert_eq!(Holding::from_address(512), Some(Holding::SerialLow));
        assert_eq!(Holding::from_address(513), None);
    }

    #[test]
    fn test_address_inverse() {
        for address in 0..=u16::MAX {
            if let Some(coil) = Coil::from_address(address) {
                assert_eq!(coil.address(), address);
            }
            if let Some(register) = Holding::from_address(address) {
                assert_eq!(register.address(), address);
            }
        }
    }
}
