//! Events that trigger relay mode transitions

/// Events the control loop raises for a relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RelayEvent {
    /// Arm flag observed set
    Arm,
    /// Global trigger observed set
    Trigger {
        /// Cycle timestamp in milliseconds
        now_ms: u32,
        /// Snapshot of the run duration register
        duration_ms: u16,
    },
    /// Timed run reached its duration
    Expired,
    /// Emergency stop observed set
    EmergencyStop,
}
