//! GPIO output pins
//!
//! Wraps embassy-rp outputs so relay drivers can use them through the
//! shared `OutputPin` trait.

use embassy_rp::gpio::{AnyPin, Level, Output};
use embassy_rp::Peri;

/// Push-pull output implementing [`relaybus_hal::OutputPin`]
pub struct RpOutput {
    pin: Output<'static>,
}

impl RpOutput {
    /// Configure a pin as output at the given initial level
    pub fn new(pin: Peri<'static, AnyPin>, initial_high: bool) -> Self {
        Self {
            pin: Output::new(pin, Level::from(initial_high)),
        }
    }
}

impl relaybus_hal::OutputPin for RpOutput {
    fn set_high(&mut self) {
        self.pin.set_high();
    }

    fn set_low(&mut self) {
        self.pin.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.pin.is_set_high()
    }
}
