//! Per-relay state machine
//!
//! Each relay is in exactly one mode at a time: idle (following its manual
//! flag), armed (waiting for the global trigger) or running a timed run.
//! Modes change only through events raised by the control loop.

pub mod events;
pub mod machine;

pub use events::RelayEvent;
pub use machine::{Relay, RelayMode};
