//! RTU framing for serial links
//!
//! Frame format:
//! - UNIT (1 byte): addressed unit id, 0 is broadcast
//! - PDU (1-253 bytes): function code and data
//! - CRC (2 bytes): CRC-16/MODBUS over UNIT and PDU, low byte first
//!
//! RTU has no length field. The parser sizes request frames from the
//! function code, and relies on the caller to call [`RtuParser::reset`]
//! when the line goes silent so it can resynchronize after noise.

use crc::{Crc, CRC_16_MODBUS};
use heapless::Vec;

use crate::pdu::{FrameError, MAX_PDU_SIZE};

/// Unit id addressing every server on the line
pub const BROADCAST_UNIT: u8 = 0;

/// Maximum complete frame size (UNIT + MAX_PDU + CRC)
pub const MAX_ADU_SIZE: usize = 1 + MAX_PDU_SIZE + 2;

/// Size of a fixed-length request (functions 0x01..=0x06)
const FIXED_REQUEST_SIZE: usize = 8;

/// Offset of the byte count in a write-multiple request
const BYTE_COUNT_OFFSET: usize = 6;

const MODBUS_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

/// CRC-16/MODBUS checksum
pub fn crc16(bytes: &[u8]) -> u16 {
    MODBUS_CRC.checksum(bytes)
}

/// A parsed or constructed RTU frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RtuFrame {
    /// Unit id
    pub unit: u8,
    /// Protocol data unit
    pub pdu: Vec<u8, MAX_PDU_SIZE>,
}

impl RtuFrame {
    /// Create a new frame for the given unit and PDU
    pub fn new(unit: u8, pdu: &[u8]) -> Result<Self, FrameError> {
        if pdu.is_empty() {
            return Err(FrameError::InvalidFrame);
        }

        let mut pdu_vec = Vec::new();
        pdu_vec
            .extend_from_slice(pdu)
            .map_err(|_| FrameError::PduTooLarge)?;

        Ok(Self { unit, pdu: pdu_vec })
    }

    /// Check if this frame is addressed to every unit
    pub fn is_broadcast(&self) -> bool {
        self.unit == BROADCAST_UNIT
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let body_len = 1 + self.pdu.len();
        let frame_len = body_len + 2;
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        buffer[0] = self.unit;
        buffer[1..body_len].copy_from_slice(&self.pdu);
        let crc = crc16(&buffer[..body_len]);
        buffer[body_len..frame_len].copy_from_slice(&crc.to_le_bytes());

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_ADU_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_ADU_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| FrameError::BufferTooSmall)?;
        Ok(vec)
    }
}

/// State machine for parsing incoming request frames
#[derive(Debug, Clone)]
pub struct RtuParser {
    state: ParseState,
    buffer: Vec<u8, MAX_ADU_SIZE>,
    expected_length: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum ParseState {
    /// Waiting for UNIT
    WaitingForUnit,
    /// Got UNIT, waiting for the function code
    WaitingForFunction,
    /// Write-multiple request, waiting for the byte count
    ReadingHeader,
    /// Frame length known, reading until complete
    ReadingBody,
    /// Unsizable or oversized frame, dropping bytes until reset
    Discarding,
}

impl Default for RtuParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RtuParser {
    /// Create a new frame parser
    pub fn new() -> Self {
        Self {
            state: ParseState::WaitingForUnit,
            buffer: Vec::new(),
            expected_length: 0,
        }
    }

    /// Reset the parser state
    ///
    /// Call this on inter-frame silence.
    pub fn reset(&mut self) {
        self.state = ParseState::WaitingForUnit;
        self.buffer.clear();
        self.expected_length = 0;
    }

    /// Whether the parser is in the middle of a frame
    pub fn is_idle(&self) -> bool {
        self.state == ParseState::WaitingForUnit
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(frame))` when a complete valid frame is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` on parse error.
    pub fn feed(&mut self, byte: u8) -> Result<Option<RtuFrame>, FrameError> {
        if self.state == ParseState::Discarding {
            return Ok(None);
        }

        // Cannot overflow: expected_length is capped at MAX_ADU_SIZE
        let _ = self.buffer.push(byte);

        match self.state {
            ParseState::WaitingForUnit => {
                self.state = ParseState::WaitingForFunction;
                Ok(None)
            }
            ParseState::WaitingForFunction => match byte {
                0x01..=0x06 => {
                    self.expected_length = FIXED_REQUEST_SIZE;
                    self.state = ParseState::ReadingBody;
                    Ok(None)
                }
                0x0F | 0x10 => {
                    self.state = ParseState::ReadingHeader;
                    Ok(None)
                }
                _ => {
                    self.state = ParseState::Discarding;
                    Err(FrameError::UnsupportedFunction)
                }
            },
            ParseState::ReadingHeader => {
                if self.buffer.len() <= BYTE_COUNT_OFFSET {
                    return Ok(None);
                }
                // UNIT + FUNCTION + ADDRESS + QUANTITY + COUNT + data + CRC
                let expected = BYTE_COUNT_OFFSET + 1 + byte as usize + 2;
                if expected > MAX_ADU_SIZE {
                    self.state = ParseState::Discarding;
                    return Err(FrameError::PduTooLarge);
                }
                self.expected_length = expected;
                self.state = ParseState::ReadingBody;
                Ok(None)
            }
            ParseState::ReadingBody => {
                if self.buffer.len() < self.expected_length {
                    return Ok(None);
                }

                let body_len = self.expected_length - 2;
                let received =
                    u16::from_le_bytes([self.buffer[body_len], self.buffer[body_len + 1]]);
                if received != crc16(&self.buffer[..body_len]) {
                    self.reset();
                    return Err(FrameError::InvalidChecksum);
                }

                let frame = RtuFrame::new(self.buffer[0], &self.buffer[1..body_len]);
                self.reset();
                frame.map(Some)
            }
            ParseState::Discarding => Ok(None),
        }
    }

}
