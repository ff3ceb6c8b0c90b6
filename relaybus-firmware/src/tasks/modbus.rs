//! Modbus RTU task
//!
//! Reads the RS-485 line, assembles RTU frames, serves them from the
//! register map and writes the reply. Line silence between characters
//! ends any partial frame.

use defmt::*;
use embassy_rp::uart::BufferedUart;
use embassy_time::{with_timeout, Duration};
use embedded_io_async::{Read, Write};

use relaybus_core::bus;
use relaybus_drivers::relay::GpioRelay;
use relaybus_hal_rp2040::RpOutput;
use relaybus_protocol::{FunctionCode, Response, RtuFrame, RtuParser, MAX_PDU_SIZE};

use crate::shared;

/// UART read chunk size
const READ_CHUNK: usize = 32;

/// Modbus task - serve requests addressed to `unit_id` or broadcast
///
/// # Arguments
/// - `uart`: Buffered fieldbus UART
/// - `driver_enable`: RS-485 transmitter enable, if the transceiver has one
/// - `unit_id`: Unit id this board answers to
/// - `silence_us`: Inter-frame silence for the configured line speed
#[embassy_executor::task]
pub async fn modbus_task(
    mut uart: BufferedUart,
    mut driver_enable: Option<GpioRelay<RpOutput>>,
    unit_id: u8,
    silence_us: u32,
) {
    info!("Modbus task started (unit {}, {}us silence)", unit_id, silence_us);

    let mut parser = RtuParser::new();
    let mut buf = [0u8; READ_CHUNK];
    let silence = Duration::from_micros(silence_us as u64);

    loop {
        // Only a partial frame needs the silence timeout
        let read = if parser.is_idle() {
            Ok(uart.read(&mut buf).await)
        } else {
            with_timeout(silence, uart.read(&mut buf)).await
        };

        let n = match read {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                warn!("UART read error: {:?}", e);
                parser.reset();
                continue;
            }
            Err(_) => {
                trace!("Line silent, dropping partial frame");
                parser.reset();
                continue;
            }
        };

        for &byte in &buf[..n] {
            match parser.feed(byte) {
                Ok(Some(frame)) => {
                    handle_frame(&mut uart, driver_enable.as_mut(), unit_id, &frame).await;
                }
                Ok(None) => {}
                Err(e) => debug!("Frame dropped: {:?}", e),
            }
        }
    }
}

/// Serve one complete frame and send the reply
async fn handle_frame(
    uart: &mut BufferedUart,
    driver_enable: Option<&mut GpioRelay<RpOutput>>,
    unit_id: u8,
    frame: &RtuFrame,
) {
    if frame.is_broadcast() {
        // Broadcasts only carry writes and are never answered
        let is_write = frame
            .pdu
            .first()
            .and_then(|&fc| FunctionCode::from_byte(fc))
            .is_some_and(FunctionCode::is_write);
        if is_write {
            let response = shared::with_registers(|registers| bus::handle_pdu(registers, &frame.pdu));
            if let Response::Exception { code, .. } = response {
                debug!("Broadcast write rejected: {:?}", code);
            }
        }
        return;
    }

    if frame.unit != unit_id {
        return;
    }

    let response = shared::with_registers(|registers| bus::handle_pdu(registers, &frame.pdu));
    if let Response::Exception { function, code } = &response {
        debug!("Exception {:?} for function {=u8:#x}", code, *function);
    }

    let mut pdu = [0u8; MAX_PDU_SIZE];
    let reply = response
        .encode(&mut pdu)
        .and_then(|len| RtuFrame::new(unit_id, &pdu[..len]))
        .and_then(|reply| reply.encode_to_vec());
    let reply = match reply {
        Ok(reply) => reply,
        Err(e) => {
            warn!("Reply encode error: {:?}", e);
            return;
        }
    };

    transmit(uart, driver_enable, &reply).await;
}

/// Write a frame with the RS-485 transmitter enabled
async fn transmit(
    uart: &mut BufferedUart,
    mut driver_enable: Option<&mut GpioRelay<RpOutput>>,
    frame: &[u8],
) {
    if let Some(de) = driver_enable.as_deref_mut() {
        de.set_on(true);
    }

    if let Err(e) = uart.write_all(frame).await {
        warn!("UART write error: {:?}", e);
    }
    // Hold the transmitter until the last stop bit is out
    if let Err(e) = uart.flush().await {
        warn!("UART flush error: {:?}", e);
    }

    if let Some(de) = driver_enable {
        de.set_on(false);
    }
}
