//! Relay output trait

/// Trait for a bank of relay output channels
///
/// Implementations drive the physical channels (GPIO, shift register,
/// expander). Channel indices run from 0 to the wired relay count.
pub trait RelayOutputs {
    /// Switch a channel on or off
    ///
    /// Indices past the wired channel count are ignored.
    fn set_output(&mut self, index: usize, on: bool);

    /// Current state of a channel
    ///
    /// Indices past the wired channel count read as off.
    fn output(&self, index: usize) -> bool;
}
