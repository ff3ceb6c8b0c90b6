//! Relay control loop
//!
//! One cycle is a priority-ordered scan of the register map:
//!
//! 0. Emergency stop (ends the cycle early)
//! 1. Arming
//! 2. Global trigger
//! 3. Timed run expiry
//! 4. Manual passthrough
//! 5. Aggregate status
//!
//! Each phase completes before the next begins. Callers must hold the
//! register map exclusively for the whole cycle.

pub mod cycle;
pub mod report;

pub use cycle::ControlLoop;
pub use report::CycleReport;
