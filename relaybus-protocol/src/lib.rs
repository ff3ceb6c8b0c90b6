//! Modbus protocol for the Relaybus relay board
//!
//! This crate defines the fieldbus protocol remote clients use to read and
//! write the board's register map. It is split into the function-level PDU
//! and the serial RTU framing around it:
//!
//! ```text
//! RTU (serial / RS-485):
//! ┌──────┬───────────────────────┬──────────┐
//! │ UNIT │ PDU                   │ CRC-16   │
//! │ 1B   │ FUNCTION + DATA       │ 2B (LE)  │
//! └──────┴───────────────────────┴──────────┘
//! ```
//!
//! Only the subset of function codes the relay board serves is decoded:
//! coils and holding registers, single and multiple.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod pdu;
pub mod rtu;

pub use pdu::{
    pack_coils, register_values, unpack_coils, ExceptionCode, FrameError, FunctionCode, Request,
    Response, MAX_PDU_SIZE,
};
pub use rtu::{crc16, RtuFrame, RtuParser, BROADCAST_UNIT, MAX_ADU_SIZE};
