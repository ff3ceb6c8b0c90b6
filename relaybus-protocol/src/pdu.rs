//! Protocol data units
//!
//! The PDU is the transport-independent part of a Modbus message: a function
//! code followed by function-specific data. Multi-byte fields are big-endian.
//!
//! Request PDUs borrow their payload from the receive buffer, so decoding a
//! write of many registers never copies the values.

use heapless::Vec;

/// Maximum PDU size in bytes (256-byte RTU ADU minus unit id and CRC)
pub const MAX_PDU_SIZE: usize = 253;

/// Maximum coils per read request
pub const MAX_READ_COILS: u16 = 2000;

/// Maximum holding registers per read request
pub const MAX_READ_REGISTERS: u16 = 125;

/// Maximum coils per write-multiple request
pub const MAX_WRITE_COILS: u16 = 1968;

/// Maximum holding registers per write-multiple request
pub const MAX_WRITE_REGISTERS: u16 = 123;

/// Packed byte capacity needed for the largest coil read
pub const MAX_COIL_BYTES: usize = (MAX_READ_COILS as usize).div_ceil(8);

/// Wire value for a coil written ON
pub const COIL_ON: u16 = 0xFF00;

/// Wire value for a coil written OFF
pub const COIL_OFF: u16 = 0x0000;

/// Set on the function code of an exception response
pub const EXCEPTION_FLAG: u8 = 0x80;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// PDU exceeds maximum allowed size
    PduTooLarge,
    /// CRC mismatch
    InvalidChecksum,
    /// Invalid frame structure
    InvalidFrame,
    /// Buffer too small for encoding
    BufferTooSmall,
    /// Function code the framing layer cannot size
    UnsupportedFunction,
}

/// Function codes known to the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FunctionCode {
    ReadCoils = 0x01,
    ReadDiscreteInputs = 0x02,
    ReadHoldingRegisters = 0x03,
    ReadInputRegisters = 0x04,
    WriteSingleCoil = 0x05,
    WriteSingleRegister = 0x06,
    WriteMultipleCoils = 0x0F,
    WriteMultipleRegisters = 0x10,
}

impl FunctionCode {
    /// Parse a function code byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::ReadCoils),
            0x02 => Some(Self::ReadDiscreteInputs),
            0x03 => Some(Self::ReadHoldingRegisters),
            0x04 => Some(Self::ReadInputRegisters),
            0x05 => Some(Self::WriteSingleCoil),
            0x06 => Some(Self::WriteSingleRegister),
            0x0F => Some(Self::WriteMultipleCoils),
            0x10 => Some(Self::WriteMultipleRegisters),
            _ => None,
        }
    }

    /// Function code byte
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Whether this function modifies the register map
    pub fn is_write(self) -> bool {
        matches!(
            self,
            Self::WriteSingleCoil
                | Self::WriteSingleRegister
                | Self::WriteMultipleCoils
                | Self::WriteMultipleRegisters
        )
    }
}

/// Modbus exception codes returned to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ExceptionCode {
    /// Function code not supported by this server
    IllegalFunction = 0x01,
    /// Address (or part of the requested range) not mapped
    IllegalDataAddress = 0x02,
    /// Value or quantity out of range, or malformed request data
    IllegalDataValue = 0x03,
    /// Unrecoverable server error
    ServerDeviceFailure = 0x04,
}

impl ExceptionCode {
    /// Parse an exception code byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::IllegalFunction),
            0x02 => Some(Self::IllegalDataAddress),
            0x03 => Some(Self::IllegalDataValue),
            0x04 => Some(Self::ServerDeviceFailure),
            _ => None,
        }
    }

    /// Exception code byte
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// A decoded client request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request<'a> {
    /// Read `quantity` coils starting at `address`
    ReadCoils { address: u16, quantity: u16 },
    /// Read `quantity` holding registers starting at `address`
    ReadHoldingRegisters { address: u16, quantity: u16 },
    /// Write one coil
    WriteSingleCoil { address: u16, value: bool },
    /// Write one holding register
    WriteSingleRegister { address: u16, value: u16 },
    /// Write `quantity` coils, packed LSB-first
    WriteMultipleCoils {
        address: u16,
        quantity: u16,
        packed: &'a [u8],
    },
    /// Write holding registers, raw big-endian pairs
    WriteMultipleRegisters { address: u16, data: &'a [u8] },
}

impl<'a> Request<'a> {
    /// Decode a request PDU
    ///
    /// Errors are the exception code the server should answer with.
    pub fn decode(pdu: &'a [u8]) -> Result<Self, ExceptionCode> {
        let (&code, data) = pdu.split_first().ok_or(ExceptionCode::IllegalFunction)?;
        let function = FunctionCode::from_byte(code).ok_or(ExceptionCode::IllegalFunction)?;

        match function {
            FunctionCode::ReadCoils => {
                let (address, quantity) = fixed_pair(data)?;
                check_quantity(quantity, MAX_READ_COILS)?;
                check_range(address, quantity)?;
                Ok(Request::ReadCoils { address, quantity })
            }
            FunctionCode::ReadHoldingRegisters => {
                let (address, quantity) = fixed_pair(data)?;
                check_quantity(quantity, MAX_READ_REGISTERS)?;
                check_range(address, quantity)?;
                Ok(Request::ReadHoldingRegisters { address, quantity })
            }
            FunctionCode::WriteSingleCoil => {
                let (address, raw) = fixed_pair(data)?;
                let value = match raw {
                    COIL_ON => true,
                    COIL_OFF => false,
                    _ => return Err(ExceptionCode::IllegalDataValue),
                };
                Ok(Request::WriteSingleCoil { address, value })
            }
            FunctionCode::WriteSingleRegister => {
                let (address, value) = fixed_pair(data)?;
                Ok(Request::WriteSingleRegister { address, value })
            }
            FunctionCode::WriteMultipleCoils => {
                let (address, quantity, payload) = counted_payload(data)?;
                check_quantity(quantity, MAX_WRITE_COILS)?;
                if payload.len() != (quantity as usize).div_ceil(8) {
                    return Err(ExceptionCode::IllegalDataValue);
                }
                check_range(address, quantity)?;
                Ok(Request::WriteMultipleCoils {
                    address,
                    quantity,
                    packed: payload,
                })
            }
            FunctionCode::WriteMultipleRegisters => {
                let (address, quantity, payload) = counted_payload(data)?;
                check_quantity(quantity, MAX_WRITE_REGISTERS)?;
                if payload.len() != quantity as usize * 2 {
                    return Err(ExceptionCode::IllegalDataValue);
                }
                check_range(address, quantity)?;
                Ok(Request::WriteMultipleRegisters {
                    address,
                    data: payload,
                })
            }
            // Recognized but the board has no discrete or input registers
            FunctionCode::ReadDiscreteInputs | FunctionCode::ReadInputRegisters => {
                Err(ExceptionCode::IllegalFunction)
            }
        }
    }
}

/// A response produced by the server
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    /// Coil states, packed LSB-first
    ReadCoils { packed: Vec<u8, MAX_COIL_BYTES> },
    /// Holding register values
    ReadHoldingRegisters {
        values: Vec<u16, { MAX_READ_REGISTERS as usize }>,
    },
    /// Echo of a single coil write
    WriteSingleCoil { address: u16, value: bool },
    /// Echo of a single register write
    WriteSingleRegister { address: u16, value: u16 },
    /// Acknowledgement of a multiple coil write
    WriteMultipleCoils { address: u16, quantity: u16 },
    /// Acknowledgement of a multiple register write
    WriteMultipleRegisters { address: u16, quantity: u16 },
    /// Exception for the given function code byte
    Exception { function: u8, code: ExceptionCode },
}

impl Response {
    /// Build a coil read response from individual coil states
    pub fn read_coils<I: IntoIterator<Item = bool>>(bits: I) -> Self {
        Response::ReadCoils {
            packed: pack_coils(bits),
        }
    }

    /// Build an exception response
    pub fn exception(function: u8, code: ExceptionCode) -> Self {
        Response::Exception { function, code }
    }

    /// Check if this is an exception response
    pub fn is_exception(&self) -> bool {
        matches!(self, Response::Exception { .. })
    }

    /// Encode this response into a PDU
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let mut w = PduWriter::new(buffer);

        match self {
            Response::ReadCoils { packed } => {
                w.put_u8(FunctionCode::ReadCoils.to_byte())?;
                w.put_u8(packed.len() as u8)?;
                w.put_slice(packed)?;
            }
            Response::ReadHoldingRegisters { values } => {
                w.put_u8(FunctionCode::ReadHoldingRegisters.to_byte())?;
                w.put_u8((values.len() * 2) as u8)?;
                for &value in values {
                    w.put_u16(value)?;
                }
            }
            Response::WriteSingleCoil { address, value } => {
                w.put_u8(FunctionCode::WriteSingleCoil.to_byte())?;
                w.put_u16(*address)?;
                w.put_u16(if *value { COIL_ON } else { COIL_OFF })?;
            }
            Response::WriteSingleRegister { address, value } => {
                w.put_u8(FunctionCode::WriteSingleRegister.to_byte())?;
                w.put_u16(*address)?;
                w.put_u16(*value)?;
            }
            Response::WriteMultipleCoils { address, quantity } => {
                w.put_u8(FunctionCode::WriteMultipleCoils.to_byte())?;
                w.put_u16(*address)?;
                w.put_u16(*quantity)?;
            }
            Response::WriteMultipleRegisters { address, quantity } => {
                w.put_u8(FunctionCode::WriteMultipleRegisters.to_byte())?;
                w.put_u16(*address)?;
                w.put_u16(*quantity)?;
            }
            Response::Exception { function, code } => {
                w.put_u8(function | EXCEPTION_FLAG)?;
                w.put_u8(code.to_byte())?;
            }
        }

        Ok(w.len())
    }
}

/// Pack coil states LSB-first, eight per byte
///
/// States beyond [`MAX_READ_COILS`] are dropped.
pub fn pack_coils<I: IntoIterator<Item = bool>>(bits: I) -> Vec<u8, MAX_COIL_BYTES> {
    let mut packed = Vec::new();
    for (i, bit) in bits.into_iter().take(MAX_READ_COILS as usize).enumerate() {
        if i % 8 == 0 {
            let _ = packed.push(0);
        }
        if bit {
            if let Some(byte) = packed.last_mut() {
                *byte |= 1 << (i % 8);
            }
        }
    }
    packed
}

/// Unpack `quantity` coil states from LSB-first packed bytes
pub fn unpack_coils(packed: &[u8], quantity: u16) -> impl Iterator<Item = bool> + '_ {
    (0..quantity as usize).map(move |i| {
        packed
            .get(i / 8)
            .map(|byte| byte & (1 << (i % 8)) != 0)
            .unwrap_or(false)
    })
}

/// Iterate the big-endian register values of a write-multiple payload
pub fn register_values(data: &[u8]) -> impl Iterator<Item = u16> + '_ {
    data.chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
}

/// Parse the `address, value-or-quantity` pair of a fixed-size request
fn fixed_pair(data: &[u8]) -> Result<(u16, u16), ExceptionCode> {
    if data.len() != 4 {
        return Err(ExceptionCode::IllegalDataValue);
    }
    Ok((
        u16::from_be_bytes([data[0], data[1]]),
        u16::from_be_bytes([data[2], data[3]]),
    ))
}

/// Parse `address, quantity, byte count, payload` of a write-multiple request
fn counted_payload(data: &[u8]) -> Result<(u16, u16, &[u8]), ExceptionCode> {
    if data.len() < 5 {
        return Err(ExceptionCode::IllegalDataValue);
    }
    let address = u16::from_be_bytes([data[0], data[1]]);
    let quantity = u16::from_be_bytes([data[2], data[3]]);
    let byte_count = data[4] as usize;
    let payload = &data[5..];
    if payload.len() != byte_count {
        return Err(ExceptionCode::IllegalDataValue);
    }
    Ok((address, quantity, payload))
}

fn check_quantity(quantity: u16, max: u16) -> Result<(), ExceptionCode> {
    if quantity == 0 || quantity > max {
        return Err(ExceptionCode::IllegalDataValue);
    }
    Ok(())
}

fn check_range(address: u16, quantity: u16) -> Result<(), ExceptionCode> {
    if address as u32 + quantity as u32 > 0x1_0000 {
        return Err(ExceptionCode::IllegalDataAddress);
    }
    Ok(())
}

/// Bounds-checked big-endian writer over a byte buffer
struct PduWriter<'b> {
    buffer: &'b mut [u8],
    len: usize,
}

impl<'b> PduWriter<'b> {
    fn new(buffer: &'b mut [u8]) -> Self {
        Self { buffer, len: 0 }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn put_slice(&mut self, bytes: &[u8]) -> Result<(), FrameError> {
        let end = self.len + bytes.len();
        if end > MAX_PDU_SIZE {
            return Err(FrameError::PduTooLarge);
        }
        let dest = self
            .buffer
            .get_mut(self.len..end)
            .ok_or(FrameError::BufferTooSmall)?;
        dest.copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }

    fn put_u8(&mut self, byte: u8) -> Result<(), FrameError> {
        self.put_slice(&[byte])
    }

    fn put_u16(&mut self, value: u16) -> Result<(), FrameError> {
        self.put_slice(&value.to_be_bytes())
    }
}
