//! Configuration loading and parsing
//!
//! The board description is compiled into the firmware and parsed at
//! startup by a custom no_std parser.

pub mod toml;

pub use toml::parse_config;

use defmt::{info, warn};
use relaybus_core::config::BoardConfig;
use relaybus_hal_rp2040::pins::UART_PINS;

/// Parse and validate the embedded board description
///
/// Falls back to the built-in layout for `relay_count` channels if the
/// description does not parse or does not fit this build.
pub fn load_board_config(input: &str, relay_count: usize) -> BoardConfig {
    let config = match parse_config(input) {
        Ok(config) => config,
        Err(e) => {
            warn!("Board config parse error: {:?}, using defaults", e);
            return BoardConfig::default_for(relay_count);
        }
    };

    match config.validate(relay_count, &UART_PINS) {
        Ok(()) => {
            info!(
                "Board config: {} relays, {}ms cycle, unit {}",
                config.relays.len(),
                config.cycle_ms,
                config.modbus.unit_id
            );
            config
        }
        Err(e) => {
            warn!("Board config rejected: {:?}, using defaults", e);
            BoardConfig::default_for(relay_count)
        }
    }
}
