//! Relay bank
//!
//! The set of wired relay channels, in channel order, exposed to the
//! control loop as [`RelayOutputs`].

use heapless::Vec;
use relaybus_core::registers::RELAY_SLOTS;
use relaybus_core::traits::RelayOutputs;
use relaybus_hal::OutputPin;

use super::gpio::GpioRelay;

/// Relay channels driven from GPIO pins
pub struct RelayBank<P> {
    channels: Vec<GpioRelay<P>, RELAY_SLOTS>,
}

impl<P: OutputPin> Default for RelayBank<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: OutputPin> RelayBank<P> {
    /// Create an empty bank
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
        }
    }

    /// Append the next channel
    ///
    /// Returns the channel back if the bank already holds
    /// [`RELAY_SLOTS`] channels.
    pub fn push(&mut self, relay: GpioRelay<P>) -> Result<(), GpioRelay<P>> {
        self.channels.push(relay)
    }

    /// Number of wired channels
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Check if no channels are wired
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl<P: OutputPin> RelayOutputs for RelayBank<P> {
    fn set_output(&mut self, index: usize, on: bool) {
        if let Some(channel) = self.channels.get_mut(index) {
            channel.set_on(on);
        }
    }

    fn output(&self, index: usize) -> bool {
        self.channels
            .get(index)
            .map(GpioRelay::is_on)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mock GPIO pin for testing
    struct MockPin {
        high: bool,
    }

    impl OutputPin for MockPin {
        fn set_high(&mut self) {
            self.high = true;
        }

        fn set_low(&mut self) {
            self.high = false;
        }

        fn is_set_high(&self) -> bool {
            self.high
        }
    }

    fn bank(inverted: &[bool]) -> RelayBank<MockPin> {
        let mut bank = RelayBank::new();
        for &inv in inverted {
            assert!(bank.push(GpioRelay::new(MockPin { high: false }, inv)).is_ok());
        }
        bank
    }

    #[test]
    fn test_bank_outputs() {
        let mut bank = bank(&[false, true, false]);
        assert_eq!(bank.len(), 3);
        assert!((0..3).all(|i| !bank.output(i)));

        bank.set_output(1, true);
        assert!(bank.output(1));
        assert!(!bank.output(0));

        bank.set_output(1, false);
        assert!(!bank.output(1));
    }

    #[test]
    fn test_unwired_index_ignored() {
        let mut bank = bank(&[false; 6]);
        bank.set_output(7, true);
        assert!(!bank.output(7));
        assert!((0..6).all(|i| !bank.output(i)));
    }

    #[test]
    fn test_bank_capacity() {
        let mut bank = bank(&[false; RELAY_SLOTS]);
        assert!(bank.push(GpioRelay::new(MockPin { high: false }, false)).is_err());
    }
}
