//! Control task
//!
//! Runs the relay control cycle at a fixed pause and drives the status LED
//! from the aggregate relay state.

use defmt::*;
use embassy_time::{Instant, Timer};

use relaybus_core::control::{ControlLoop, CycleReport};
use relaybus_drivers::relay::{GpioRelay, RelayBank};
use relaybus_hal_rp2040::RpOutput;

use crate::shared;
use crate::RELAY_COUNT;

/// Control task - one cycle, then a fixed pause
#[embassy_executor::task]
pub async fn control_task(
    mut relays: RelayBank<RpOutput>,
    mut status_led: Option<GpioRelay<RpOutput>>,
    cycle_ms: u32,
) {
    let mut control = ControlLoop::<RELAY_COUNT>::new();
    info!(
        "Control task started ({} relays, {}ms cycle)",
        control.relay_count(),
        cycle_ms
    );

    loop {
        let now_ms = Instant::now().as_millis() as u32;
        let report = shared::with_registers(|registers| {
            control.run_cycle(registers, &mut relays, now_ms)
        });

        if let (Some(led), Some(active)) = (status_led.as_mut(), report.any_active) {
            led.set_on(active);
        }

        if report.has_events() {
            log_report(&control, &report);
        }

        Timer::after_millis(cycle_ms as u64).await;
    }
}

fn log_report(control: &ControlLoop<RELAY_COUNT>, report: &CycleReport) {
    if report.emergency_stop {
        info!("Emergency stop: all relays off");
        return;
    }

    for (index, relay) in control.relays().iter().enumerate() {
        let bit = 1u8 << index;
        if report.armed & bit != 0 {
            debug!("Relay {} armed", index);
        }
        if report.started & bit != 0 {
            info!(
                "Relay {} on for {}ms",
                index,
                relay.run_duration().unwrap_or(0)
            );
        }
        if report.expired & bit != 0 {
            info!("Relay {} timed run complete", index);
        }
    }
}
