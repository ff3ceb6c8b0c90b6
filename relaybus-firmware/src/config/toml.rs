//! Minimal TOML parser for the board description
//!
//! Handles only the subset board.toml uses. It does NOT support the full
//! TOML spec.
//!
//! Supported features:
//! - Key = value pairs (string, integer)
//! - [section] headers
//! - Single-line arrays of strings: pins = ["gpio2", "!gpio3"]
//! - Comments (# ...)
//!
//! Unknown keys are ignored so older firmware accepts newer files.

use alloc::vec::Vec;

use relaybus_core::config::{BoardConfig, PinConfig, SerialParity};

/// Parse error
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Invalid or unknown section header
    InvalidSection,
    /// Invalid value type
    InvalidValue,
    /// Too many items (exceeded heapless capacity)
    TooManyItems,
    /// Invalid pin string
    InvalidPin,
    /// Device name longer than the identity registers hold
    NameTooLong,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Device,
    Relays,
    Status,
    Modbus,
}

/// Parse board.toml into a BoardConfig
///
/// Settings the file leaves out keep their [`BoardConfig::new`] defaults.
/// The result is not validated against the built relay count.
pub fn parse_config(input: &str) -> Result<BoardConfig, ParseError> {
    let mut config = BoardConfig::new();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            apply_value(&mut config, section, key, value)?;
        }
    }

    Ok(config)
}

/// Parse section header
fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "device" => Ok(Section::Device),
        "relays" => Ok(Section::Relays),
        "status" => Ok(Section::Status),
        "modbus" => Ok(Section::Modbus),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = if let Some(hash_pos) = value.find('#') {
        // Make sure # is not inside a string
        let quote_count = value[..hash_pos].matches('"').count();
        if quote_count % 2 == 0 {
            value[..hash_pos].trim()
        } else {
            value
        }
    } else {
        value
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> Result<&str, ParseError> {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        Ok(&value[1..value.len() - 1])
    } else {
        // Allow unquoted strings for simple values
        Ok(value)
    }
}

/// Parse an integer value
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue)
}

/// Parse a pin string like "gpio11" or "!gpio12"
fn parse_pin(value: &str) -> Result<PinConfig, ParseError> {
    PinConfig::parse(parse_string(value)?).ok_or(ParseError::InvalidPin)
}

/// Parse a single-line array of strings
fn parse_string_array(value: &str) -> Result<Vec<&str>, ParseError> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or(ParseError::InvalidValue)?
        .trim();

    if inner.is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(str::trim)
        // Trailing comma
        .filter(|item| !item.is_empty())
        .map(parse_string)
        .collect()
}

/// Parse the parity name
fn parse_parity(value: &str) -> Result<SerialParity, ParseError> {
    match parse_string(value)? {
        "none" => Ok(SerialParity::None),
        "even" => Ok(SerialParity::Even),
        "odd" => Ok(SerialParity::Odd),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Apply a key/value pair to the current section
fn apply_value(
    config: &mut BoardConfig,
    section: Section,
    key: &str,
    value: &str,
) -> Result<(), ParseError> {
    match (section, key) {
        (Section::Device, "name") => {
            config.device_name.clear();
            config
                .device_name
                .push_str(parse_string(value)?)
                .map_err(|_| ParseError::NameTooLong)?;
        }
        (Section::Relays, "pins") => {
            config.relays.clear();
            for item in parse_string_array(value)? {
                let pin = PinConfig::parse(item).ok_or(ParseError::InvalidPin)?;
                config
                    .relays
                    .push(pin)
                    .map_err(|_| ParseError::TooManyItems)?;
            }
        }
        (Section::Relays, "cycle_ms") => config.cycle_ms = parse_int(value)?,
        (Section::Status, "led") => config.status_led = Some(parse_pin(value)?),
        (Section::Modbus, "unit_id") => config.modbus.unit_id = parse_int(value)?,
        (Section::Modbus, "baudrate") => config.modbus.baudrate = parse_int(value)?,
        (Section::Modbus, "parity") => config.modbus.parity = parse_parity(value)?,
        (Section::Modbus, "de_pin") => config.modbus.de_pin = Some(parse_pin(value)?),
        _ => {}
    }

    Ok(())
}
