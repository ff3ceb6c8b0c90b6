//! UART line configuration
//!
//! Converts the chip-independent line settings into embassy-rp's UART
//! configuration.

use embassy_rp::uart;
use relaybus_core::config::{ModbusConfig, SerialParity};
use relaybus_hal::uart::{DataBits, Parity, StopBits, UartConfig};

/// Line settings for the fieldbus port
pub fn modbus_line(config: &ModbusConfig) -> UartConfig {
    let parity = match config.parity {
        SerialParity::None => Parity::None,
        SerialParity::Even => Parity::Even,
        SerialParity::Odd => Parity::Odd,
    };
    UartConfig::modbus_rtu(config.baudrate, parity)
}

/// embassy-rp configuration for the given line settings
pub fn to_embassy_config(line: &UartConfig) -> uart::Config {
    let mut config = uart::Config::default();
    config.baudrate = line.baudrate;
    config.data_bits = match line.data_bits {
        DataBits::Seven => uart::DataBits::DataBits7,
        DataBits::Eight => uart::DataBits::DataBits8,
    };
    config.parity = match line.parity {
        Parity::None => uart::Parity::ParityNone,
        Parity::Even => uart::Parity::ParityEven,
        Parity::Odd => uart::Parity::ParityOdd,
    };
    config.stop_bits = match line.stop_bits {
        StopBits::One => uart::StopBits::STOP1,
        StopBits::Two => uart::StopBits::STOP2,
    };
    config
}
