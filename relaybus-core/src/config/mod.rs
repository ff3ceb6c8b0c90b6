//! Configuration types
//!
//! Board-agnostic configuration structures. The firmware fills them from
//! its embedded board description and validates them before use.

pub mod hardware;
pub mod types;

pub use hardware::*;
pub use types::*;
