//! Flash unique id access
//!
//! The RP2040 has no factory MAC address. The board's 6-byte hardware
//! address is derived from the 64-bit unique id of the external flash chip.

use embassy_rp::flash::{Blocking, Error, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;

/// Flash size on the target board
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Read the board's hardware address
///
/// Takes the low six bytes of the flash unique id and marks the result as a
/// locally administered unicast address.
pub fn hardware_address(flash: Peri<'static, FLASH>) -> Result<[u8; 6], Error> {
    let mut flash = Flash::<_, Blocking, FLASH_SIZE>::new_blocking(flash);
    let mut unique_id = [0u8; 8];
    flash.blocking_unique_id(&mut unique_id)?;

    let mut address = [0u8; 6];
    address.copy_from_slice(&unique_id[2..]);
    address[0] = (address[0] | 0x02) & 0xFE;
    Ok(address)
}
