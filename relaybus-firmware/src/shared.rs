//! State shared between Embassy tasks
//!
//! The register map is the only shared state: the control task and the
//! fieldbus task each hold it under one critical section per cycle or
//! request, so neither ever sees the other half-done.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use relaybus_core::registers::RegisterMap;

/// Coils and holding registers
pub static REGISTERS: Mutex<CriticalSectionRawMutex, RefCell<RegisterMap>> =
    Mutex::new(RefCell::new(RegisterMap::new()));

/// Run `f` with exclusive access to the register map
pub fn with_registers<R>(f: impl FnOnce(&mut RegisterMap) -> R) -> R {
    REGISTERS.lock(|registers| f(&mut registers.borrow_mut()))
}
