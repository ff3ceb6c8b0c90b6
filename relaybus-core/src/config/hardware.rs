//! Hardware configuration types
//!
//! Pin assignments for relay channels and auxiliary outputs.

/// Highest GPIO number on the target (RP2040 has GPIO0-29)
pub const MAX_GPIO: u8 = 29;

/// Pin configuration with optional inversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    /// GPIO pin number
    pub pin: u8,
    /// Pin is active-low (inverted)
    pub inverted: bool,
}

impl PinConfig {
    /// Create an active-high pin
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
        }
    }

    /// Create an inverted (active-low) pin
    pub const fn inverted(pin: u8) -> Self {
        Self {
            pin,
            inverted: true,
        }
    }

    /// Electrical level that switches the load on
    pub const fn active_level(&self) -> bool {
        !self.inverted
    }

    /// Parse a pin string from config
    ///
    /// Supports formats:
    /// - "gpio11" -> GPIO11, active-high
    /// - "!gpio12" -> GPIO12, inverted (active-low)
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (s, inverted) = match s.strip_prefix('!') {
            Some(rest) => (rest, true),
            None => (s, false),
        };

        let pin: u8 = s.strip_prefix("gpio")?.parse().ok()?;
        if pin > MAX_GPIO {
            return None;
        }

        Some(Self { pin, inverted })
    }
}
