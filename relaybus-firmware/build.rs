//! Build script for relaybus-firmware
//!
//! - Sets up linker search paths and scripts for memory.x
//! - Validates board.toml at compile time

use std::collections::HashSet;
use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// GPIOs owned by the fieldbus UART
const UART_PINS: [i64; 2] = [0, 1];

/// Highest RP2040 GPIO number
const MAX_GPIO: i64 = 29;

/// Longest device name the identity registers hold
const MAX_NAME_LEN: usize = 20;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Relay count selected by cargo features
fn relay_count() -> usize {
    if env::var_os("CARGO_FEATURE_RELAYS_6").is_some() {
        6
    } else {
        8
    }
}

/// Validate board.toml configuration at compile time
fn validate_config() {
    // Re-run if board.toml changes
    println!("cargo:rerun-if-changed=board.toml");

    let config_path = Path::new("board.toml");

    // Check if config file exists
    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: board.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds a board.toml board description.             ║\n\
            ║  Please create one in the relaybus-firmware directory.           ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    // Read the config file
    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read board.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Parse and validate TOML syntax
    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in board.toml                        ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    let mut used_pins = HashSet::new();

    validate_device(&config, &mut errors);
    validate_relays(&config, &mut used_pins, &mut errors);
    validate_status(&config, &mut used_pins, &mut errors);
    validate_modbus(&config, &mut used_pins, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid board configuration                              ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!(
        "cargo:warning=board.toml validated successfully ({} relays)",
        relay_count()
    );
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| format!("║  {:<64} ║", truncate_line(line, 64)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Shorten a line to at most `width` characters, marking the cut with "..."
fn truncate_line(line: &str, width: usize) -> String {
    if line.chars().count() > width {
        let kept: String = line.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        line.to_string()
    }
}

/// Get a section table, recording an error if it is required and missing
fn section<'a>(
    config: &'a toml::Value,
    name: &str,
    required: bool,
    errors: &mut Vec<String>,
) -> Option<&'a toml::value::Table> {
    match config.get(name) {
        Some(toml::Value::Table(t)) => Some(t),
        Some(_) => {
            errors.push(format!("[{}] must be a table", name));
            None
        }
        None => {
            if required {
                errors.push(format!("Missing [{}] section", name));
            }
            None
        }
    }
}

/// Parse a pin string like "gpio11" or "!gpio12"
fn parse_pin(value: &str) -> Option<i64> {
    let value = value.strip_prefix('!').unwrap_or(value);
    let pin: i64 = value.strip_prefix("gpio")?.parse().ok()?;
    (0..=MAX_GPIO).contains(&pin).then_some(pin)
}

/// Check a pin value and record it as used
fn check_pin(
    value: &toml::Value,
    context: &str,
    used_pins: &mut HashSet<i64>,
    errors: &mut Vec<String>,
) {
    let Some(text) = value.as_str() else {
        errors.push(format!("{} must be a pin string", context));
        return;
    };
    let Some(pin) = parse_pin(text) else {
        errors.push(format!("{} '{}' is not gpio0-gpio29", context, text));
        return;
    };
    if UART_PINS.contains(&pin) {
        errors.push(format!("{} gpio{} is the fieldbus UART", context, pin));
    } else if !used_pins.insert(pin) {
        errors.push(format!("{} gpio{} is already used", context, pin));
    }
}

/// Validate the [device] section
fn validate_device(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(device) = section(config, "device", true, errors) else {
        return;
    };

    match device.get("name") {
        Some(toml::Value::String(name)) => {
            if name.len() > MAX_NAME_LEN {
                errors.push(format!("[device] name longer than {} bytes", MAX_NAME_LEN));
            }
            if !name.is_ascii() {
                errors.push("[device] name must be ASCII".to_string());
            }
        }
        Some(_) => errors.push("[device] name must be a string".to_string()),
        None => errors.push("[device] missing 'name'".to_string()),
    }
}

/// Validate the [relays] section
fn validate_relays(config: &toml::Value, used_pins: &mut HashSet<i64>, errors: &mut Vec<String>) {
    let Some(relays) = section(config, "relays", true, errors) else {
        return;
    };

    match relays.get("pins") {
        Some(toml::Value::Array(pins)) => {
            let expected = relay_count();
            if pins.len() != expected {
                errors.push(format!(
                    "[relays] has {} pins, this build drives {}",
                    pins.len(),
                    expected
                ));
            }
            for (i, pin) in pins.iter().enumerate() {
                check_pin(pin, &format!("[relays] pin {}", i), used_pins, errors);
            }
        }
        Some(_) => errors.push("[relays] pins must be an array".to_string()),
        None => errors.push("[relays] missing 'pins'".to_string()),
    }

    if let Some(cycle) = relays.get("cycle_ms") {
        match cycle.as_integer() {
            Some(ms) if (1..=1000).contains(&ms) => {}
            _ => errors.push("[relays] cycle_ms must be 1-1000".to_string()),
        }
    }
}

/// Validate the optional [status] section
fn validate_status(config: &toml::Value, used_pins: &mut HashSet<i64>, errors: &mut Vec<String>) {
    let Some(status) = section(config, "status", false, errors) else {
        return;
    };

    if let Some(led) = status.get("led") {
        check_pin(led, "[status] led", used_pins, errors);
    }
}

/// Validate the [modbus] section
fn validate_modbus(config: &toml::Value, used_pins: &mut HashSet<i64>, errors: &mut Vec<String>) {
    let Some(modbus) = section(config, "modbus", true, errors) else {
        return;
    };

    match modbus.get("unit_id").and_then(|v| v.as_integer()) {
        Some(id) if (1..=247).contains(&id) => {}
        Some(_) => errors.push("[modbus] unit_id must be 1-247".to_string()),
        None => errors.push("[modbus] missing integer 'unit_id'".to_string()),
    }

    if let Some(baud) = modbus.get("baudrate") {
        match baud.as_integer() {
            Some(b) if b > 0 && b <= u32::MAX as i64 => {}
            _ => errors.push("[modbus] baudrate must be a positive integer".to_string()),
        }
    }

    if let Some(parity) = modbus.get("parity") {
        if !matches!(parity.as_str(), Some("none" | "even" | "odd")) {
            errors.push("[modbus] parity must be 'none', 'even', or 'odd'".to_string());
        }
    }

    if let Some(de) = modbus.get("de_pin") {
        check_pin(de, "[modbus] de_pin", used_pins, errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_line_multibyte() {
        // Box characters are three bytes each; byte 61 lands mid-character
        let line = "║".repeat(70);
        let truncated = truncate_line(&line, 64);
        assert_eq!(truncated.chars().count(), 64);
        assert!(truncated.ends_with("..."));

        assert_eq!(truncate_line("short", 64), "short");
    }

    #[test]
    fn test_parse_pin() {
        assert_eq!(parse_pin("gpio2"), Some(2));
        assert_eq!(parse_pin("!gpio29"), Some(29));
        assert_eq!(parse_pin("gpio30"), None);
    }
}
