//! Embassy async tasks
//!
//! Each task runs independently and meets the others only at the shared
//! register map.

pub mod control;
pub mod modbus;

pub use control::control_task;
pub use modbus::modbus_task;
