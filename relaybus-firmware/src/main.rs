//! Relaybus - Multi-Relay Actuator Board Firmware
//!
//! Main firmware binary for RP2040-based relay boards. Relays are driven
//! by a fixed-period control loop and commanded over Modbus RTU through a
//! shared register map.

#![no_std]
#![no_main]

extern crate alloc;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Uart};
use embedded_alloc::LlffHeap as Heap;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use relaybus_core::config::{BoardConfig, PinConfig};
use relaybus_core::identity::{Identity, Version};
use relaybus_drivers::relay::{GpioRelay, RelayBank};
use relaybus_hal_rp2040::{flash, uart, PinBank, PinError, RpOutput};

use crate::config::load_board_config;

mod config;
mod shared;
mod tasks;

/// Relay channels wired on this board variant
#[cfg(feature = "relays-6")]
pub const RELAY_COUNT: usize = 6;

/// Relay channels wired on this board variant
#[cfg(not(feature = "relays-6"))]
pub const RELAY_COUNT: usize = 8;

/// Firmware version published in the identity registers
const FIRMWARE_VERSION: Version = Version::new(1, 0, 2);

// Heap allocator for board.toml parsing
#[global_allocator]
static HEAP: Heap = Heap::empty();

// Heap size: 4KB
const HEAP_SIZE: usize = 4 * 1024;

/// Embedded board description (compiled into firmware)
/// Edit board.toml and rebuild to customize
const BOARD_CONFIG: &str = include_str!("../board.toml");

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Relaybus firmware starting...");

    // Initialize heap allocator
    init_heap();

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    let (mut pins, rest) = PinBank::from_peripherals(p);
    info!("Peripherals initialized");

    let board = load_board_config(BOARD_CONFIG, RELAY_COUNT);

    // Outputs come up switched off before anything else runs
    let relays = match build_relays(&mut pins, &board) {
        Ok(relays) => relays,
        Err(e) => {
            error!("Relay pin setup failed: {:?}", e);
            halt().await
        }
    };
    let status_led = optional_output(&mut pins, board.status_led, "status LED");
    let driver_enable = optional_output(&mut pins, board.modbus.de_pin, "RS-485 DE");
    info!("{} relay outputs initialized", relays.len());

    // Identity registers
    let hw_address = match flash::hardware_address(rest.flash) {
        Ok(address) => address,
        Err(e) => {
            warn!("Flash unique id unavailable: {:?}", e);
            [0u8; 6]
        }
    };
    let identity = Identity::new(FIRMWARE_VERSION, &board.device_name, &hw_address);
    shared::with_registers(|registers| registers.provision(&identity));
    info!(
        "Identity: \"{}\" v{}.{}.{} serial {}",
        board.device_name.as_str(),
        FIRMWARE_VERSION.major,
        FIRMWARE_VERSION.minor,
        FIRMWARE_VERSION.patch,
        identity.serial
    );

    // Setup UART for the fieldbus
    let line = uart::modbus_line(&board.modbus);
    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let bus = Uart::new_blocking(
        rest.uart0,
        rest.uart0_tx,
        rest.uart0_rx,
        uart::to_embassy_config(&line),
    );
    let bus = bus.into_buffered(Irqs, tx_buf, rx_buf);
    info!(
        "Modbus RTU: unit {} at {} baud ({:?})",
        board.modbus.unit_id, line.baudrate, line.parity
    );

    // Spawn tasks
    spawner.spawn(unwrap!(tasks::control_task(
        relays,
        status_led,
        board.cycle_ms
    )));
    spawner.spawn(unwrap!(tasks::modbus_task(
        bus,
        driver_enable,
        board.modbus.unit_id,
        line.frame_silence_us()
    )));

    info!("All tasks spawned, firmware running");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Initialize the heap allocator
fn init_heap() {
    use core::mem::MaybeUninit;
    static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
    #[allow(static_mut_refs)]
    unsafe {
        HEAP.init(HEAP_MEM.as_ptr() as usize, HEAP_SIZE)
    }
}

/// Configure a pin as an output in its off state
fn output(pins: &mut PinBank, config: PinConfig) -> Result<GpioRelay<RpOutput>, PinError> {
    let pin = pins.take(config.pin)?;
    let off_level = !config.active_level();
    Ok(GpioRelay::new(RpOutput::new(pin, off_level), config.inverted))
}

/// Build the relay bank in channel order
fn build_relays(
    pins: &mut PinBank,
    board: &BoardConfig,
) -> Result<RelayBank<RpOutput>, PinError> {
    let mut relays = RelayBank::new();
    for (channel, &config) in board.relays.iter().enumerate() {
        debug!(
            "Relay {} on GPIO{}{}",
            channel,
            config.pin,
            if config.inverted { " (active-low)" } else { "" }
        );
        // Capacity matches the validated relay count
        let _ = relays.push(output(pins, config)?);
    }
    Ok(relays)
}

/// Configure an auxiliary output, logging instead of failing
fn optional_output(
    pins: &mut PinBank,
    config: Option<PinConfig>,
    name: &str,
) -> Option<GpioRelay<RpOutput>> {
    let config = config?;
    match output(pins, config) {
        Ok(out) => Some(out),
        Err(e) => {
            warn!("{} on GPIO{} unavailable: {:?}", name, config.pin, e);
            None
        }
    }
}

/// Park the firmware with every output off
async fn halt() -> ! {
    loop {
        embassy_time::Timer::after_secs(60).await;
    }
}
