//! Identity registers
//!
//! Static descriptive values written into the register map once at startup:
//! firmware version, device name and a serial number derived from the
//! board's hardware address. The control loop never touches them.

/// Registers reserved for the device name
pub const DEVICE_NAME_REGISTERS: usize = 10;

/// Maximum device name length in bytes (two per register)
pub const MAX_DEVICE_NAME_LEN: usize = DEVICE_NAME_REGISTERS * 2;

/// Serial numbers are reduced to seven decimal digits
pub const SERIAL_MODULUS: u32 = 10_000_000;

/// Firmware version, encoded as `major * 100 + minor * 10 + patch`
///
/// Minor and patch must stay below 10 for the encoding to be unambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl Version {
    pub const fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Register value for this version
    pub const fn encode(&self) -> u16 {
        self.major as u16 * 100 + self.minor as u16 * 10 + self.patch as u16
    }
}

/// Pack a device name into registers, two ASCII bytes per register
///
/// The first byte goes in the high half. Names longer than
/// [`MAX_DEVICE_NAME_LEN`] bytes are truncated; the rest is null padded.
pub fn pack_device_name(name: &str) -> [u16; DEVICE_NAME_REGISTERS] {
    let mut registers = [0u16; DEVICE_NAME_REGISTERS];
    let bytes = name.as_bytes();
    let bytes = &bytes[..bytes.len().min(MAX_DEVICE_NAME_LEN)];

    for (register, pair) in registers.iter_mut().zip(bytes.chunks(2)) {
        let high = pair[0] as u16;
        let low = pair.get(1).copied().unwrap_or(0) as u16;
        *register = (high << 8) | low;
    }

    registers
}

/// Derive the seven-digit serial number from a 6-byte hardware address
///
/// Bytes 2..6 are read as a big-endian u32 and reduced modulo
/// [`SERIAL_MODULUS`].
pub fn serial_from_hw_address(address: &[u8; 6]) -> u32 {
    u32::from_be_bytes([address[2], address[3], address[4], address[5]]) % SERIAL_MODULUS
}

/// Split a serial number into its (high, low) register pair
pub const fn split_serial(serial: u32) -> (u16, u16) {
    ((serial >> 16) as u16, serial as u16)
}

/// Everything the identity registers hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Identity {
    pub version: Version,
    pub device_name: [u16; DEVICE_NAME_REGISTERS],
    pub serial: u32,
}

impl Identity {
    /// Build the identity for a board
    ///
    /// # Arguments
    /// - `version`: Firmware version
    /// - `name`: Device name (truncated to 20 bytes)
    /// - `hw_address`: 6-byte hardware address the serial is derived from
    pub fn new(version: Version, name: &str, hw_address: &[u8; 6]) -> Self {
        Self {
            version,
            device_name: pack_device_name(name),
            serial: serial_from_hw_address(hw_address),
        }
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            version: Version::new(0, 0, 0),
            device_name: [0; DEVICE_NAME_REGISTERS],
            serial: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_encoding() {
        let version = Version::new(1, 0, 2);
        assert_eq!(version.encode(), 102);
        assert_eq!(Version::new(1, 0, 1).encode(), 101);
        assert_eq!(Version::new(2, 3, 4).encode(), 234);
    }

    #[test]
    fn test_pack_device_name() {
        let registers = pack_device_name("Relay");
        assert_eq!(registers[0], u16::from_be_bytes([b'R', b'e']));
        assert_eq!(registers[1], u16::from_be_bytes([b'l', b'a']));
        // Odd length: last byte in the high half, low half null
        assert_eq!(registers[2], u16::from_be_bytes([b'y', 0]));
        assert!(registers[3..].iter().all(|&r| r == 0));
    }

    #[test]
    fn test_pack_device_name_truncates() {
        let registers = pack_device_name("ABCDEFGHIJKLMNOPQRSTUVWXYZ");
        assert_eq!(registers[0], u16::from_be_bytes([b'A', b'B']));
        assert_eq!(registers[9], u16::from_be_bytes([b'S', b'T']));
    }

    #[test]
    fn test_pack_empty_device_name() {
        assert_eq!(pack_device_name(""), [0; DEVICE_NAME_REGISTERS]);
    }

    #[test]
    fn test_serial_from_hw_address() {
        // 0x12345678 = 305419896 -> 5419896
        let address = [0xAA, 0xBB, 0x12, 0x34, 0x56, 0x78];
        let serial = serial_from_hw_address(&address);
        assert_eq!(serial, 5_419_896);
        assert!(serial < SERIAL_MODULUS);

        // Leading bytes do not contribute
        let other = [0x00, 0x00, 0x12, 0x34, 0x56, 0x78];
        assert_eq!(serial_from_hw_address(&other), serial);
    }

    #[test]
    fn test_split_serial() {
        let (high, low) = split_serial(5_419_896);
        assert_eq!(high, 0x0052);
        assert_eq!(low, 0xB378);
        assert_eq!(((high as u32) << 16) | low as u32, 5_419_896);
    }
}
