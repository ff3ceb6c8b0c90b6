//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in relaybus-core:
//!
//! - GPIO relay channels (active-high or active-low)
//! - Relay bank implementing `RelayOutputs`

#![no_std]
#![deny(unsafe_code)]

pub mod relay;
