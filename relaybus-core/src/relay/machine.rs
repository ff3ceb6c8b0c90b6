//! Relay mode definition

use super::events::RelayEvent;

/// Relay modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RelayMode {
    /// Output follows the manual start flag
    #[default]
    Idle,
    /// Waiting for the global trigger
    Armed,
    /// Timed run in progress; manual flag is ignored
    Running {
        /// Timestamp the run started at (ms, wrapping)
        started_ms: u32,
        /// Run length captured at trigger time
        duration_ms: u32,
    },
}

impl RelayMode {
    /// Process an event and return the next mode
    ///
    /// An arm command while running is consumed without effect.
    pub fn transition(self, event: RelayEvent) -> Self {
        use RelayEvent::*;
        use RelayMode::*;

        match (self, event) {
            (_, EmergencyStop) => Idle,

            (Idle, Arm) => Armed,

            (
                Armed,
                Trigger {
                    now_ms,
                    duration_ms,
                },
            ) => Running {
                started_ms: now_ms,
                duration_ms: duration_ms as u32,
            },

            (Running { .. }, Expired) => Idle,

            // Default: stay in current mode
            _ => self,
        }
    }
}

/// One physical output channel and its control state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Relay {
    index: usize,
    mode: RelayMode,
}

impl Relay {
    /// Create an idle relay
    pub const fn new(index: usize) -> Self {
        Self {
            index,
            mode: RelayMode::Idle,
        }
    }

    /// Output channel index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Apply an event to this relay
    pub fn apply(&mut self, event: RelayEvent) {
        self.mode = self.mode.transition(event);
    }

    /// Check if waiting for the trigger
    pub fn armed(&self) -> bool {
        self.mode == RelayMode::Armed
    }

    /// Check if a timed run is in progress
    pub fn timed_run_active(&self) -> bool {
        matches!(self.mode, RelayMode::Running { .. })
    }

    /// Length of the current timed run
    pub fn run_duration(&self) -> Option<u32> {
        match self.mode {
            RelayMode::Running { duration_ms, .. } => Some(duration_ms),
            _ => None,
        }
    }

    /// Check if the current timed run has reached its duration at `now_ms`
    ///
    /// Elapsed time is a wrapping difference, so runs spanning the 32-bit
    /// millisecond rollover expire on time.
    pub fn run_expired(&self, now_ms: u32) -> bool {
        match self.mode {
            RelayMode::Running {
                started_ms,
                duration_ms,
            } => now_ms.wrapping_sub(started_ms) >= duration_ms,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger(now_ms: u32, duration_ms: u16) -> RelayEvent {
        RelayEvent::Trigger {
            now_ms,
            duration_ms,
        }
    }

    #[test]
    fn test_arm_then_trigger() {
        let armed = RelayMode::Idle.transition(RelayEvent::Arm);
        assert_eq!(armed, RelayMode::Armed);

        let running = armed.transition(trigger(1000, 500));
        assert_eq!(
            running,
            RelayMode::Running {
                started_ms: 1000,
                duration_ms: 500
            }
        );

        assert_eq!(running.transition(RelayEvent::Expired), RelayMode::Idle);
    }

    #[test]
    fn test_trigger_without_arm_ignored() {
        assert_eq!(RelayMode::Idle.transition(trigger(0, 100)), RelayMode::Idle);
    }

    #[test]
    fn test_emergency_stop_from_any_mode() {
        let modes = [
            RelayMode::Idle,
            RelayMode::Armed,
            RelayMode::Running {
                started_ms: 5,
                duration_ms: 10,
            },
        ];

        for mode in modes {
            assert_eq!(mode.transition(RelayEvent::EmergencyStop), RelayMode::Idle);
        }
    }

    #[test]
    fn test_arm_while_running_discarded() {
        let running = RelayMode::Running {
            started_ms: 0,
            duration_ms: 100,
        };
        assert_eq!(running.transition(RelayEvent::Arm), running);
        // Re-triggering a run does not restart it
        assert_eq!(running.transition(trigger(50, 1000)), running);
    }

    #[test]
    fn test_expired_only_affects_running() {
        assert_eq!(RelayMode::Armed.transition(RelayEvent::Expired), RelayMode::Armed);
        assert_eq!(RelayMode::Idle.transition(RelayEvent::Expired), RelayMode::Idle);
    }

    #[test]
    fn test_relay_accessors() {
        let mut relay = Relay::new(3);
        assert_eq!(relay.index(), 3);
        assert!(!relay.armed());
        assert!(!relay.timed_run_active());
        assert_eq!(relay.run_duration(), None);

        relay.apply(RelayEvent::Arm);
        assert!(relay.armed());

        relay.apply(trigger(200, 50));
        assert!(!relay.armed());
        assert!(relay.timed_run_active());
        assert_eq!(relay.run_duration(), Some(50));
        assert!(!relay.run_expired(249));
        assert!(relay.run_expired(250));
    }

    #[test]
    fn test_run_expired_boundary() {
        let mut relay = Relay::new(0);
        relay.apply(RelayEvent::Arm);
        relay.apply(trigger(1000, 500));

        assert!(!relay.run_expired(1000));
        assert!(!relay.run_expired(1499));
        assert!(relay.run_expired(1500));
    }

    #[test]
    fn test_run_expired_across_rollover() {
        let mut relay = Relay::new(0);
        relay.apply(RelayEvent::Arm);
        relay.apply(trigger(u32::MAX - 99, 200));

        assert!(!relay.run_expired(u32::MAX));
        assert!(!relay.run_expired(99));
        assert!(relay.run_expired(100));
    }
}
