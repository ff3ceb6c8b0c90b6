//! Dynamic pin allocation for config-driven hardware setup
//!
//! Relay, LED and driver-enable pins come from the board configuration, so
//! GPIOs are handed out by number at runtime. The fieldbus UART pins are
//! fixed and split off before the bank is built.

use embassy_rp::gpio::AnyPin;
use embassy_rp::peripherals::{FLASH, PIN_0, PIN_1, UART0};
use embassy_rp::{Peri, Peripherals};

/// Number of GPIO pins on RP2040
pub const GPIO_COUNT: usize = 30;

/// Pins owned by the fieldbus UART (UART0 TX, RX)
pub const UART_PINS: [u8; 2] = [0, 1];

/// Error when requesting a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin,
    /// Pin already taken
    AlreadyTaken,
    /// Pin reserved for the fieldbus UART
    Reserved,
}

/// Pin bank that holds the free GPIO pins and hands them out by number
pub struct PinBank {
    pins: [Option<Peri<'static, AnyPin>>; GPIO_COUNT],
}

/// Peripherals kept out of the pin bank
pub struct RemainingPeripherals {
    pub flash: Peri<'static, FLASH>,
    pub uart0: Peri<'static, UART0>,
    pub uart0_tx: Peri<'static, PIN_0>,
    pub uart0_rx: Peri<'static, PIN_1>,
}

impl PinBank {
    /// Split Embassy peripherals into the pin bank and everything else
    pub fn from_peripherals(p: Peripherals) -> (Self, RemainingPeripherals) {
        let bank = Self {
            pins: [
                None,
                None,
                Some(p.PIN_2.into()),
                Some(p.PIN_3.into()),
                Some(p.PIN_4.into()),
                Some(p.PIN_5.into()),
                Some(p.PIN_6.into()),
                Some(p.PIN_7.into()),
                Some(p.PIN_8.into()),
                Some(p.PIN_9.into()),
                Some(p.PIN_10.into()),
                Some(p.PIN_11.into()),
                Some(p.PIN_12.into()),
                Some(p.PIN_13.into()),
                Some(p.PIN_14.into()),
                Some(p.PIN_15.into()),
                Some(p.PIN_16.into()),
                Some(p.PIN_17.into()),
                Some(p.PIN_18.into()),
                Some(p.PIN_19.into()),
                Some(p.PIN_20.into()),
                Some(p.PIN_21.into()),
                Some(p.PIN_22.into()),
                Some(p.PIN_23.into()),
                Some(p.PIN_24.into()),
                Some(p.PIN_25.into()),
                Some(p.PIN_26.into()),
                Some(p.PIN_27.into()),
                Some(p.PIN_28.into()),
                Some(p.PIN_29.into()),
            ],
        };
        let remaining = RemainingPeripherals {
            flash: p.FLASH,
            uart0: p.UART0,
            uart0_tx: p.PIN_0,
            uart0_rx: p.PIN_1,
        };
        (bank, remaining)
    }

    /// Take a pin by number
    ///
    /// Returns the pin if available, or an error if:
    /// - Pin number is invalid (>= 30)
    /// - Pin belongs to the fieldbus UART
    /// - Pin was already taken
    pub fn take(&mut self, pin_num: u8) -> Result<Peri<'static, AnyPin>, PinError> {
        if pin_num as usize >= GPIO_COUNT {
            return Err(PinError::InvalidPin);
        }
        if UART_PINS.contains(&pin_num) {
            return Err(PinError::Reserved);
        }
        self.pins[pin_num as usize]
            .take()
            .ok_or(PinError::AlreadyTaken)
    }
}
