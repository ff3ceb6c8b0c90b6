//! Per-cycle summary for diagnostics

/// What a single control cycle did
///
/// Bit `i` of each mask refers to relay `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleReport {
    /// Emergency stop was executed; no other phase ran
    pub emergency_stop: bool,
    /// Relays armed this cycle
    pub armed: u8,
    /// Relays whose timed run started this cycle
    pub started: u8,
    /// Relays whose timed run ended this cycle
    pub expired: u8,
    /// Aggregate status written this cycle, if phase 5 ran
    pub any_active: Option<bool>,
}

impl CycleReport {
    /// Check if any relay changed mode
    pub fn has_events(&self) -> bool {
        self.emergency_stop || self.armed != 0 || self.started != 0 || self.expired != 0
    }
}
