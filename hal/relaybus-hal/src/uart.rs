//! UART serial line configuration
//!
//! Chip-independent line settings, plus the character timing RTU framing
//! needs to detect the end of a frame.

/// Above this rate RTU uses fixed inter-frame timing
const FIXED_TIMING_BAUDRATE: u32 = 19_200;

/// Inter-frame silence used above [`FIXED_TIMING_BAUDRATE`]
const FIXED_FRAME_SILENCE_US: u32 = 1_750;

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 115200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl UartConfig {
    /// Line settings for Modbus RTU
    ///
    /// RTU characters are always 11 bits: without parity a second stop bit
    /// takes the parity bit's place.
    pub fn modbus_rtu(baudrate: u32, parity: Parity) -> Self {
        Self {
            baudrate,
            data_bits: DataBits::Eight,
            parity,
            stop_bits: match parity {
                Parity::None => StopBits::Two,
                Parity::Even | Parity::Odd => StopBits::One,
            },
        }
    }

    /// Bits on the wire per character, including start and stop bits
    pub fn bits_per_char(&self) -> u32 {
        let data = match self.data_bits {
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        };
        let parity = match self.parity {
            Parity::None => 0,
            Parity::Even | Parity::Odd => 1,
        };
        let stop = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        1 + data + parity + stop
    }

    /// Time to transmit one character, in microseconds (rounded up)
    pub fn char_time_us(&self) -> u32 {
        let baudrate = self.baudrate.max(1);
        (self.bits_per_char() * 1_000_000).div_ceil(baudrate)
    }

    /// Line silence that ends an RTU frame (3.5 character times)
    pub fn frame_silence_us(&self) -> u32 {
        if self.baudrate > FIXED_TIMING_BAUDRATE {
            FIXED_FRAME_SILENCE_US
        } else {
            (self.char_time_us() * 7).div_ceil(2)
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rtu_character_is_eleven_bits() {
        for parity in [Parity::None, Parity::Even, Parity::Odd] {
            assert_eq!(UartConfig::modbus_rtu(9600, parity).bits_per_char(), 11);
        }
        assert_eq!(
            UartConfig::modbus_rtu(9600, Parity::None).stop_bits,
            StopBits::Two
        );
    }

    #[test]
    fn test_frame_silence() {
        // 11 bits at 9600 baud = 1146us per char, 3.5 chars = 4011us
        let config = UartConfig::modbus_rtu(9600, Parity::Even);
        assert_eq!(config.char_time_us(), 1146);
        assert_eq!(config.frame_silence_us(), 4011);

        let fast = UartConfig::modbus_rtu(115_200, Parity::Even);
        assert_eq!(fast.frame_silence_us(), 1750);
    }
}
