//! Register service
//!
//! Executes decoded Modbus requests against the register map by address.
//! Writes touching several entries are checked in full before any entry is
//! changed, so a rejected request leaves the map untouched.

use heapless::Vec;
use relaybus_protocol::pdu::{register_values, unpack_coils};
use relaybus_protocol::{ExceptionCode, Request, Response};

use crate::registers::RegisterMap;

/// Addresses covered by a request; decoding guarantees no overflow
fn addresses(start: u16, quantity: u16) -> impl Iterator<Item = u16> {
    (start as u32..start as u32 + quantity as u32).map(|address| address as u16)
}

/// Execute a decoded request
pub fn serve(registers: &mut RegisterMap, request: &Request<'_>) -> Result<Response, ExceptionCode> {
    match *request {
        Request::ReadCoils { address, quantity } => {
            for address in addresses(address, quantity) {
                registers.read_coil(address)?;
            }
            Ok(Response::read_coils(addresses(address, quantity).map(
                |address| registers.read_coil(address).unwrap_or(false),
            )))
        }
        Request::ReadHoldingRegisters { address, quantity } => {
            let mut values = Vec::new();
            for address in addresses(address, quantity) {
                values
                    .push(registers.read_holding(address)?)
                    .map_err(|_| ExceptionCode::ServerDeviceFailure)?;
            }
            Ok(Response::ReadHoldingRegisters { values })
        }
        Request::WriteSingleCoil { address, value } => {
            registers.write_coil(address, value)?;
            Ok(Response::WriteSingleCoil { address, value })
        }
        Request::WriteSingleRegister { address, value } => {
            registers.write_holding(address, value)?;
            Ok(Response::WriteSingleRegister { address, value })
        }
        Request::WriteMultipleCoils {
            address,
            quantity,
            packed,
        } => {
            for target in addresses(address, quantity) {
                registers.writable_coil(target)?;
            }
            for (target, value) in addresses(address, quantity).zip(unpack_coils(packed, quantity)) {
                registers.write_coil(target, value)?;
            }
            Ok(Response::WriteMultipleCoils { address, quantity })
        }
        Request::WriteMultipleRegisters { address, data } => {
            let quantity = (data.len() / 2) as u16;
            for target in addresses(address, quantity) {
                registers.writable_holding(target)?;
            }
            for (target, value) in addresses(address, quantity).zip(register_values(data)) {
                registers.write_holding(target, value)?;
            }
            Ok(Response::WriteMultipleRegisters { address, quantity })
        }
    }
}

/// Decode and execute a request PDU, producing the response to send
///
/// Every failure becomes an exception response for the request's function
/// code.
pub fn handle_pdu(registers: &mut RegisterMap, pdu: &[u8]) -> Response {
    let function = pdu.first().copied().unwrap_or(0);
    Request::decode(pdu)
        .and_then(|request| serve(registers, &request))
        .unwrap_or_else(|code| Response::exception(function, code))
}
