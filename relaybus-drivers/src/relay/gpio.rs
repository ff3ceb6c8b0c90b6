//! GPIO relay channel
//!
//! One relay coil (or SSR, or indicator LED) driven from a GPIO pin,
//! directly or through a transistor stage.

use relaybus_hal::OutputPin;

/// GPIO relay output
///
/// The pin can be configured as active-high (default) or active-low, as
/// found on most opto-isolated relay modules.
pub struct GpioRelay<P> {
    pin: P,
    /// If true, relay ON = pin LOW
    inverted: bool,
}

impl<P: OutputPin> GpioRelay<P> {
    /// Create a new GPIO relay output, switched off
    ///
    /// # Arguments
    /// - `pin`: The GPIO pin to control
    /// - `inverted`: If true, relay is ON when pin is LOW
    pub fn new(pin: P, inverted: bool) -> Self {
        let mut relay = Self { pin, inverted };
        relay.set_on(false);
        relay
    }

    /// Switch the relay on or off
    pub fn set_on(&mut self, on: bool) {
        self.pin.set_state(on != self.inverted);
    }

    /// Check if the relay is on, from the pin's output level
    pub fn is_on(&self) -> bool {
        self.pin.is_set_high() != self.inverted
    }
}
