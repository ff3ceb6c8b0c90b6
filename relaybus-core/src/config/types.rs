//! Board configuration type definitions

use heapless::{String, Vec};

use super::hardware::{PinConfig, MAX_GPIO};
use crate::identity::MAX_DEVICE_NAME_LEN;
use crate::registers::RELAY_SLOTS;

/// Default control cycle period in milliseconds
pub const DEFAULT_CYCLE_MS: u32 = 10;

/// Longest accepted control cycle period in milliseconds
pub const MAX_CYCLE_MS: u32 = 1000;

/// Highest assignable Modbus unit id
pub const MAX_UNIT_ID: u8 = 247;

/// Serial parity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialParity {
    None,
    #[default]
    Even,
    Odd,
}

/// Fieldbus settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModbusConfig {
    /// Unit id this board answers to (1-247)
    pub unit_id: u8,
    /// Line speed
    pub baudrate: u32,
    /// Parity
    pub parity: SerialParity,
    /// RS-485 driver enable pin, if the transceiver needs one
    pub de_pin: Option<PinConfig>,
}

impl Default for ModbusConfig {
    fn default() -> Self {
        Self {
            unit_id: 1,
            baudrate: 19_200,
            parity: SerialParity::Even,
            de_pin: None,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Relay pin list does not match the built relay count
    RelayCountMismatch { expected: usize, found: usize },
    /// Pin number does not exist on the target
    InvalidPin(u8),
    /// Pin assigned twice
    DuplicatePin(u8),
    /// Pin is taken by a fixed peripheral
    ReservedPin(u8),
    /// Cycle period is zero or too long
    InvalidCycle(u32),
    /// Unit id outside 1-247
    InvalidUnitId(u8),
    /// Baud rate of zero
    InvalidBaudrate,
}

/// Complete board configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardConfig {
    /// Name published in the identity registers
    pub device_name: String<MAX_DEVICE_NAME_LEN>,
    /// Relay output pins, in channel order
    pub relays: Vec<PinConfig, RELAY_SLOTS>,
    /// Control cycle period in milliseconds
    pub cycle_ms: u32,
    /// Status LED mirroring the aggregate status flag
    pub status_led: Option<PinConfig>,
    /// Fieldbus settings
    pub modbus: ModbusConfig,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::default_for(RELAY_SLOTS)
    }
}

impl BoardConfig {
    /// Empty configuration (no relays, default settings)
    pub fn new() -> Self {
        Self {
            device_name: String::new(),
            relays: Vec::new(),
            cycle_ms: DEFAULT_CYCLE_MS,
            status_led: None,
            modbus: ModbusConfig::default(),
        }
    }

    /// Built-in configuration for a board with `relay_count` channels
    ///
    /// Relays on GPIO2 upward, status LED on GPIO25.
    pub fn default_for(relay_count: usize) -> Self {
        let mut config = Self::new();
        let _ = config.device_name.push_str("RP2040 Relay Board");
        for channel in 0..relay_count.min(RELAY_SLOTS) {
            let _ = config.relays.push(PinConfig::new(2 + channel as u8));
        }
        config.status_led = Some(PinConfig::new(25));
        config
    }

    /// Every pin the configuration uses
    pub fn pins(&self) -> impl Iterator<Item = PinConfig> + '_ {
        self.relays
            .iter()
            .copied()
            .chain(self.status_led)
            .chain(self.modbus.de_pin)
    }

    /// Check the configuration against the built firmware
    ///
    /// # Arguments
    /// - `relay_count`: Relay count the firmware was built for
    /// - `reserved`: Pins owned by fixed peripherals (e.g. the UART)
    pub fn validate(&self, relay_count: usize, reserved: &[u8]) -> Result<(), ConfigError> {
        if self.relays.len() != relay_count {
            return Err(ConfigError::RelayCountMismatch {
                expected: relay_count,
                found: self.relays.len(),
            });
        }

        let mut seen = 0u32;
        for pin in self.pins().map(|p| p.pin) {
            if pin > MAX_GPIO {
                return Err(ConfigError::InvalidPin(pin));
            }
            if reserved.contains(&pin) {
                return Err(ConfigError::ReservedPin(pin));
            }
            if seen & (1 << pin) != 0 {
                return Err(ConfigError::DuplicatePin(pin));
            }
            seen |= 1 << pin;
        }

        if self.cycle_ms == 0 || self.cycle_ms > MAX_CYCLE_MS {
            return Err(ConfigError::InvalidCycle(self.cycle_ms));
        }
        if self.modbus.unit_id == 0 || self.modbus.unit_id > MAX_UNIT_ID {
            return Err(ConfigError::InvalidUnitId(self.modbus.unit_id));
        }
        if self.modbus.baudrate == 0 {
            return Err(ConfigError::InvalidBaudrate);
        }

        Ok(())
    }
}
