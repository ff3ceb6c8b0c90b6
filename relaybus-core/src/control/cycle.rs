//! Control cycle execution

use super::report::CycleReport;
use crate::registers::{Coil, Holding, RegisterMap, RELAY_SLOTS};
use crate::relay::{Relay, RelayEvent};
use crate::traits::RelayOutputs;

/// Control loop over `N` wired relays
///
/// `N` must be between 1 and [`RELAY_SLOTS`]; other values fail to compile.
/// The register layout always carries [`RELAY_SLOTS`] slots, the ones past
/// `N` accept writes without physical effect.
#[derive(Debug, Clone)]
pub struct ControlLoop<const N: usize> {
    relays: [Relay; N],
}

impl<const N: usize> Default for ControlLoop<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ControlLoop<N> {
    const SUPPORTED_COUNT: () = assert!(
        N > 0 && N <= RELAY_SLOTS,
        "relay count must be between 1 and RELAY_SLOTS"
    );

    /// Create a control loop with every relay idle
    #[allow(clippy::let_unit_value)]
    pub fn new() -> Self {
        let () = Self::SUPPORTED_COUNT;
        Self {
            relays: core::array::from_fn(Relay::new),
        }
    }

    /// Number of wired relays
    pub const fn relay_count(&self) -> usize {
        N
    }

    /// Relay state by index
    pub fn relay(&self, index: usize) -> Option<&Relay> {
        self.relays.get(index)
    }

    /// All relay states
    pub fn relays(&self) -> &[Relay; N] {
        &self.relays
    }

    /// Run one control cycle
    ///
    /// # Arguments
    /// - `registers`: Register map, held exclusively for the whole cycle
    /// - `outputs`: Physical output channels
    /// - `now_ms`: Millisecond timestamp (wrapping)
    pub fn run_cycle<O: RelayOutputs>(
        &mut self,
        registers: &mut RegisterMap,
        outputs: &mut O,
        now_ms: u32,
    ) -> CycleReport {
        let mut report = CycleReport::default();

        if registers.coil(Coil::EmergencyStop) {
            self.emergency_stop(registers, outputs);
            report.emergency_stop = true;
            return report;
        }

        self.process_arming(registers, &mut report);
        self.process_trigger(registers, outputs, now_ms, &mut report);
        self.process_expiry(registers, outputs, now_ms, &mut report);
        self.process_manual(registers, outputs);

        let any_active = (0..N).any(|index| outputs.output(index));
        registers.set_coil(Coil::AnyRelayOn, any_active);
        report.any_active = Some(any_active);

        report
    }

    /// Phase 0: force everything off and clear per-relay commands
    ///
    /// Arm and trigger flags are left set and are processed next cycle.
    fn emergency_stop<O: RelayOutputs>(&mut self, registers: &mut RegisterMap, outputs: &mut O) {
        for relay in &mut self.relays {
            outputs.set_output(relay.index(), false);
            relay.apply(RelayEvent::EmergencyStop);
        }

        for slot in 0..RELAY_SLOTS {
            registers.set_coil(Coil::ManualStart(slot), false);
            registers.set_holding(Holding::RunDuration(slot), 0);
        }

        registers.set_coil(Coil::EmergencyStop, false);
    }

    /// Phase 1: consume arm flags
    fn process_arming(&mut self, registers: &mut RegisterMap, report: &mut CycleReport) {
        for slot in 0..RELAY_SLOTS {
            if !registers.coil(Coil::Arm(slot)) {
                continue;
            }
            registers.set_coil(Coil::Arm(slot), false);

            if let Some(relay) = self.relays.get_mut(slot) {
                let was_armed = relay.armed();
                relay.apply(RelayEvent::Arm);
                if relay.armed() && !was_armed {
                    report.armed |= 1 << slot;
                }
            }
        }
    }

    /// Phase 2: start a timed run on every armed relay
    fn process_trigger<O: RelayOutputs>(
        &mut self,
        registers: &mut RegisterMap,
        outputs: &mut O,
        now_ms: u32,
        report: &mut CycleReport,
    ) {
        if !registers.coil(Coil::GlobalTrigger) {
            return;
        }

        for relay in &mut self.relays {
            if !relay.armed() {
                continue;
            }
            let index = relay.index();
            relay.apply(RelayEvent::Trigger {
                now_ms,
                duration_ms: registers.holding(Holding::RunDuration(index)),
            });
            outputs.set_output(index, true);
            registers.set_coil(Coil::ManualStart(index), true);
            report.started |= 1 << index;
        }

        registers.set_coil(Coil::GlobalTrigger, false);
    }

    /// Phase 3: end timed runs that reached their duration
    ///
    /// Runs started this cycle are not checked, so a zero duration still
    /// produces one cycle of output.
    fn process_expiry<O: RelayOutputs>(
        &mut self,
        registers: &mut RegisterMap,
        outputs: &mut O,
        now_ms: u32,
        report: &mut CycleReport,
    ) {
        for relay in &mut self.relays {
            let index = relay.index();
            if report.started & (1 << index) != 0 || !relay.run_expired(now_ms) {
                continue;
            }
            relay.apply(RelayEvent::Expired);
            outputs.set_output(index, false);
            registers.set_coil(Coil::ManualStart(index), false);
            report.expired |= 1 << index;
        }
    }

    /// Phase 4: relays not in a timed run follow their manual flag
    fn process_manual<O: RelayOutputs>(&self, registers: &RegisterMap, outputs: &mut O) {
        for relay in &self.relays {
            if !relay.timed_run_active() {
                let index = relay.index();
                outputs.set_output(index, registers.coil(Coil::ManualStart(index)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Output bank that records channel states
    #[derive(Debug, Default)]
    struct MockOutputs {
        channels: [bool; RELAY_SLOTS],
    }

    impl RelayOutputs for MockOutputs {
        fn set_output(&mut self, index: usize, on: bool) {
            if let Some(channel) = self.channels.get_mut(index) {
                *channel = on;
            }
        }

        fn output(&self, index: usize) -> bool {
            self.channels.get(index).copied().unwrap_or(false)
        }
    }

    struct Bench<const N: usize> {
        control: ControlLoop<N>,
        registers: RegisterMap,
        outputs: MockOutputs,
    }

    impl<const N: usize> Bench<N> {
        fn new() -> Self {
            Self {
                control: ControlLoop::new(),
                registers: RegisterMap::new(),
                outputs: MockOutputs::default(),
            }
        }

        fn cycle(&mut self, now_ms: u32) -> CycleReport {
            self.control
                .run_cycle(&mut self.registers, &mut self.outputs, now_ms)
        }

        fn arm_and_trigger(&mut self, index: usize, duration_ms: u16, now_ms: u32) {
            self.registers
                .set_holding(Holding::RunDuration(index), duration_ms);
            self.registers.set_coil(Coil::Arm(index), true);
            self.cycle(now_ms);
            self.registers.set_coil(Coil::GlobalTrigger, true);
            self.cycle(now_ms);
        }
    }

    #[test]
    fn test_initial_state() {
        let mut bench = Bench::<8>::new();
        let report = bench.cycle(0);

        assert_eq!(report.any_active, Some(false));
        assert!(!report.has_events());
        for relay in bench.control.relays() {
            assert!(!relay.armed());
            assert!(!relay.timed_run_active());
        }
    }

    #[test]
    fn test_emergency_stop_clears_everything() {
        let mut bench = Bench::<8>::new();
        bench.arm_and_trigger(2, 1000, 0);
        bench.registers.set_coil(Coil::ManualStart(0), true);
        bench.registers.set_coil(Coil::Arm(4), true);
        bench.cycle(10);
        for slot in 0..RELAY_SLOTS {
            bench.registers.set_holding(Holding::RunDuration(slot), 250);
        }
        assert!(bench.outputs.output(0));
        assert!(bench.outputs.output(2));
        assert!(bench.control.relay(4).unwrap().armed());

        bench.registers.set_coil(Coil::EmergencyStop, true);
        let report = bench.cycle(20);

        assert!(report.emergency_stop);
        assert_eq!(report.any_active, None);
        assert!(!bench.registers.coil(Coil::EmergencyStop));
        for slot in 0..RELAY_SLOTS {
            assert!(!bench.outputs.output(slot));
            assert!(!bench.registers.coil(Coil::ManualStart(slot)));
            assert_eq!(bench.registers.holding(Holding::RunDuration(slot)), 0);
        }
        for relay in bench.control.relays() {
            assert!(!relay.armed());
            assert!(!relay.timed_run_active());
        }
    }

    #[test]
    fn test_emergency_stop_defers_arm_to_next_cycle() {
        let mut bench = Bench::<8>::new();
        bench.arm_and_trigger(2, 1000, 0);
        assert!(bench.outputs.output(2));

        bench.registers.set_coil(Coil::EmergencyStop, true);
        bench.registers.set_coil(Coil::Arm(5), true);
        bench.cycle(100);

        assert!(!bench.outputs.output(2));
        assert_eq!(bench.registers.holding(Holding::RunDuration(2)), 0);
        assert!(!bench.control.relay(5).unwrap().armed());
        assert!(bench.registers.coil(Coil::Arm(5)));

        let report = bench.cycle(110);
        assert_eq!(report.armed, 1 << 5);
        assert!(bench.control.relay(5).unwrap().armed());
        assert!(!bench.registers.coil(Coil::Arm(5)));
    }

    #[test]
    fn test_trigger_starts_only_armed_relays() {
        let mut bench = Bench::<8>::new();
        bench.registers.set_holding(Holding::RunDuration(1), 100);
        bench.registers.set_holding(Holding::RunDuration(2), 200);
        bench.registers.set_holding(Holding::RunDuration(4), 300);
        bench.registers.set_coil(Coil::Arm(1), true);
        bench.registers.set_coil(Coil::Arm(4), true);
        assert_eq!(bench.cycle(0).armed, 0b1_0010);

        bench.registers.set_coil(Coil::GlobalTrigger, true);
        let report = bench.cycle(5);
        assert_eq!(report.started, 0b1_0010);
        assert!(bench.outputs.output(1));
        assert!(bench.outputs.output(4));
        // Unarmed relay keeps its duration but does not start
        assert!(!bench.outputs.output(2));
        assert!(!bench.registers.coil(Coil::ManualStart(2)));
        assert!(!bench.control.relay(2).unwrap().timed_run_active());

        // Each run ends at its own duration
        bench.cycle(104);
        assert!(bench.outputs.output(1));
        let report = bench.cycle(105);
        assert_eq!(report.expired, 1 << 1);
        assert!(!bench.outputs.output(1));
        assert!(!bench.registers.coil(Coil::ManualStart(1)));
        assert!(bench.outputs.output(4));

        bench.cycle(304);
        assert!(bench.outputs.output(4));
        let report = bench.cycle(305);
        assert_eq!(report.expired, 1 << 4);
        assert!(!bench.outputs.output(4));
        assert_eq!(report.any_active, Some(false));
    }

    #[test]
    fn test_arm_and_trigger_in_same_cycle() {
        let mut bench = Bench::<8>::new();
        bench.registers.set_holding(Holding::RunDuration(6), 50);
        bench.registers.set_coil(Coil::Arm(6), true);
        bench.registers.set_coil(Coil::GlobalTrigger, true);

        // Arming runs before the trigger within one cycle
        let report = bench.cycle(1000);
        assert_eq!(report.armed, 1 << 6);
        assert_eq!(report.started, 1 << 6);
        assert!(bench.outputs.output(6));
        assert!(bench.control.relay(6).unwrap().timed_run_active());
        assert!(!bench.control.relay(6).unwrap().armed());
        assert!(!bench.registers.coil(Coil::Arm(6)));
        assert!(!bench.registers.coil(Coil::GlobalTrigger));

        let report = bench.cycle(1050);
        assert_eq!(report.expired, 1 << 6);
        assert!(!bench.outputs.output(6));
    }

    #[test]
    fn test_arm_without_trigger() {
        let mut bench = Bench::<8>::new();
        bench.registers.set_coil(Coil::Arm(1), true);
        let report = bench.cycle(0);

        assert_eq!(report.armed, 1 << 1);
        assert!(!bench.registers.coil(Coil::Arm(1)));
        assert!(!bench.outputs.output(1));

        for t in 1..10 {
            bench.cycle(t * 10);
            assert!(bench.control.relay(1).unwrap().armed());
            assert!(!bench.outputs.output(1));
        }
    }

    #[test]
    fn test_armed_relay_follows_manual_flag() {
        let mut bench = Bench::<8>::new();
        bench.registers.set_coil(Coil::Arm(0), true);
        bench.registers.set_coil(Coil::ManualStart(0), true);
        bench.cycle(0);

        assert!(bench.control.relay(0).unwrap().armed());
        assert!(bench.outputs.output(0));
    }

    #[test]
    fn test_timed_run_scenario() {
        let mut bench = Bench::<8>::new();
        bench.registers.set_holding(Holding::RunDuration(3), 500);
        bench.registers.set_coil(Coil::Arm(3), true);
        bench.cycle(0);

        bench.registers.set_coil(Coil::GlobalTrigger, true);
        let report = bench.cycle(0);
        assert_eq!(report.started, 1 << 3);
        assert!(bench.outputs.output(3));
        assert!(bench.registers.coil(Coil::ManualStart(3)));
        assert!(!bench.registers.coil(Coil::GlobalTrigger));
        assert_eq!(report.any_active, Some(true));
        assert!(bench.registers.coil(Coil::AnyRelayOn));

        bench.cycle(499);
        assert!(bench.outputs.output(3));
        assert!(bench.registers.coil(Coil::ManualStart(3)));

        let report = bench.cycle(500);
        assert_eq!(report.expired, 1 << 3);
        assert!(!bench.outputs.output(3));
        assert!(!bench.registers.coil(Coil::ManualStart(3)));
        assert!(!bench.control.relay(3).unwrap().armed());
        assert!(!bench.control.relay(3).unwrap().timed_run_active());
        assert!(!bench.registers.coil(Coil::AnyRelayOn));
    }

    #[test]
    fn test_trigger_without_armed_relays() {
        let mut bench = Bench::<8>::new();
        bench.registers.set_coil(Coil::GlobalTrigger, true);
        let report = bench.cycle(0);

        assert_eq!(report.started, 0);
        assert!(!bench.registers.coil(Coil::GlobalTrigger));
        assert!((0..8).all(|i| !bench.outputs.output(i)));
    }

    #[test]
    fn test_zero_duration_runs_one_cycle() {
        let mut bench = Bench::<8>::new();
        bench.arm_and_trigger(0, 0, 100);
        assert!(bench.outputs.output(0));

        let report = bench.cycle(110);
        assert_eq!(report.expired, 1);
        assert!(!bench.outputs.output(0));
    }

    #[test]
    fn test_manual_ignored_while_running() {
        let mut bench = Bench::<8>::new();
        bench.arm_and_trigger(4, 300, 0);

        bench.registers.set_coil(Coil::ManualStart(4), false);
        bench.cycle(100);
        assert!(bench.outputs.output(4));

        // Run ends; manual flag cleared by expiry
        bench.cycle(300);
        assert!(!bench.outputs.output(4));

        bench.registers.set_coil(Coil::ManualStart(4), true);
        bench.cycle(310);
        assert!(bench.outputs.output(4));
    }

    #[test]
    fn test_duration_change_during_run_ignored() {
        let mut bench = Bench::<8>::new();
        bench.arm_and_trigger(1, 1000, 0);

        bench.registers.set_holding(Holding::RunDuration(1), 10);
        bench.cycle(500);
        assert!(bench.outputs.output(1));

        bench.cycle(1000);
        assert!(!bench.outputs.output(1));
    }

    #[test]
    fn test_manual_passthrough() {
        let mut bench = Bench::<8>::new();
        bench.registers.set_coil(Coil::ManualStart(6), true);
        bench.cycle(0);
        assert!(bench.outputs.output(6));
        assert!(bench.registers.coil(Coil::AnyRelayOn));

        bench.registers.set_coil(Coil::ManualStart(6), false);
        bench.cycle(10);
        assert!(!bench.outputs.output(6));
        assert!(!bench.registers.coil(Coil::AnyRelayOn));
    }

    #[test]
    fn test_unwired_slots_have_no_effect() {
        let mut bench = Bench::<6>::new();
        bench.registers.set_coil(Coil::ManualStart(7), true);
        bench.registers.set_coil(Coil::Arm(6), true);
        let report = bench.cycle(0);

        assert_eq!(report.armed, 0);
        assert!(!bench.registers.coil(Coil::Arm(6)));
        assert!(!bench.outputs.output(7));
        assert_eq!(report.any_active, Some(false));
        // Flag is stored for clients even though nothing is wired
        assert!(bench.registers.coil(Coil::ManualStart(7)));

        bench.registers.set_coil(Coil::EmergencyStop, true);
        bench.cycle(10);
        assert!(!bench.registers.coil(Coil::ManualStart(7)));
    }

    #[test]
    fn test_arm_while_running_is_consumed() {
        let mut bench = Bench::<8>::new();
        bench.arm_and_trigger(0, 1000, 0);

        bench.registers.set_coil(Coil::Arm(0), true);
        let report = bench.cycle(10);
        assert_eq!(report.armed, 0);
        assert!(!bench.registers.coil(Coil::Arm(0)));

        let relay = bench.control.relay(0).unwrap();
        assert!(relay.timed_run_active());
        assert!(!relay.armed());
    }

    #[derive(Debug, Clone)]
    enum Command {
        Manual(usize, bool),
        Arm(usize),
        Duration(usize, u16),
        Trigger,
        EmergencyStop,
        Advance(u32),
    }

    fn command() -> impl Strategy<Value = Command> {
        prop_oneof![
            (0..RELAY_SLOTS, any::<bool>()).prop_map(|(i, on)| Command::Manual(i, on)),
            (0..RELAY_SLOTS).prop_map(Command::Arm),
            (0..RELAY_SLOTS, 0u16..2000).prop_map(|(i, d)| Command::Duration(i, d)),
            Just(Command::Trigger),
            Just(Command::EmergencyStop),
            (0u32..1000).prop_map(Command::Advance),
        ]
    }

    proptest! {
        #[test]
        fn test_cycle_invariants(
            start in any::<u32>(),
            commands in proptest::collection::vec(command(), 1..64),
        ) {
            let mut bench = Bench::<6>::new();
            let mut now = start;

            for command in commands {
                let mut trigger_set = false;
                let mut armed_set = [false; RELAY_SLOTS];
                match command {
                    Command::Manual(i, on) => bench.registers.set_coil(Coil::ManualStart(i), on),
                    Command::Arm(i) => {
                        bench.registers.set_coil(Coil::Arm(i), true);
                        armed_set[i] = true;
                    }
                    Command::Duration(i, d) => bench.registers.set_holding(Holding::RunDuration(i), d),
                    Command::Trigger => {
                        bench.registers.set_coil(Coil::GlobalTrigger, true);
                        trigger_set = true;
                    }
                    Command::EmergencyStop => bench.registers.set_coil(Coil::EmergencyStop, true),
                    Command::Advance(dt) => now = now.wrapping_add(dt),
                }

                let report = bench.cycle(now);

                if let Some(any_active) = report.any_active {
                    let expected = (0..6).any(|i| bench.outputs.output(i));
                    prop_assert_eq!(any_active, expected);
                    prop_assert_eq!(bench.registers.coil(Coil::AnyRelayOn), expected);
                    if trigger_set {
                        prop_assert!(!bench.registers.coil(Coil::GlobalTrigger));
                    }
                    for (slot, &set) in armed_set.iter().enumerate() {
                        if set {
                            prop_assert!(!bench.registers.coil(Coil::Arm(slot)));
                        }
                    }
                }

                for relay in bench.control.relays() {
                    let index = relay.index();
                    prop_assert!(!(relay.armed() && relay.timed_run_active()));
                    if relay.timed_run_active() {
                        prop_assert!(bench.outputs.output(index));
                    } else {
                        prop_assert_eq!(
                            bench.outputs.output(index),
                            bench.registers.coil(Coil::ManualStart(index))
                        );
                    }
                }
            }
        }

        #[test]
        fn test_expiry_across_rollover(start in any::<u32>(), duration in 1u16..=u16::MAX) {
            let mut bench = Bench::<8>::new();
            bench.arm_and_trigger(0, duration, start);
            prop_assert!(bench.outputs.output(0));

            bench.cycle(start.wrapping_add(duration as u32 - 1));
            prop_assert!(bench.outputs.output(0));

            bench.cycle(start.wrapping_add(duration as u32));
            prop_assert!(!bench.outputs.output(0));
        }
    }
}
