//! Picowire - bus-probe firmware
//!
//! Brings up an RP2040 board the way the tuner sketches expect it: the
//! receiver is taken out of reset and clocked, the I2C bus and serial
//! console are handed to the shim runtime, and a small key-driven console
//! exercises the bus.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::i2c::{I2c, InterruptHandler as I2cInterruptHandler};
use embassy_rp::peripherals::{I2C0, UART0};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::uart::{BufferedInterruptHandler, Uart};
use embassy_time::{Duration, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use picowire_core::{HeldWriteBus, Runtime, ShimConfig, Timing};
use picowire_hal::gpio::OutputPin;
use picowire_hal::uart::UartPins;
use picowire_hal_rp2040::{
    i2c_config, i2c_for_pins, uart_config, uart_for_pins, I2cId, RpClock, RpConsole, RpI2c,
    RpOutput, UartId,
};

use crate::console::ProbeConsole;

mod board;
mod console;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    I2C0_IRQ => I2cInterruptHandler<I2C0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

type Board = Runtime<HeldWriteBus<RpI2c<'static, I2C0>>, RpConsole>;

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Picowire firmware starting...");

    let p = embassy_rp::init(Default::default());
    let timing = Timing::new(RpClock);

    let config = ShimConfig {
        console_pins: UartPins {
            tx: board::CONSOLE_TX_PIN,
            rx: board::CONSOLE_RX_PIN,
        },
        ..ShimConfig::default()
    };

    if i2c_for_pins(board::BUS_SDA_PIN, board::BUS_SCL_PIN) != Some(I2cId::I2c0) {
        warn!("Bus pins do not match I2C0");
    }
    if uart_for_pins(config.console_pins) != Some(UartId::Uart0) {
        warn!("Console pins do not match UART0");
    }

    // Pulse the receiver reset line and take it out of reset
    let mut reset = RpOutput::new(Output::new(p.PIN_6, Level::High));
    reset.set_low();
    timing.delay(board::RESET_PULSE_MS);
    reset.set_high();
    timing.delay(board::RESET_SETTLE_MS);
    info!("Receiver reset released (GPIO{})", board::RESET_PIN);

    // Reference clock for the receiver, 50% duty
    let mut pwm_config = PwmConfig::default();
    pwm_config.top = board::RADIO_CLOCK_TOP;
    pwm_config.compare_b = board::RADIO_CLOCK_TOP / 2;
    let _radio_clock = Pwm::new_output_b(p.PWM_SLICE4, p.PIN_9, pwm_config);
    info!(
        "Reference clock {} Hz on GPIO{}",
        board::RADIO_CLOCK_HZ,
        board::RADIO_CLOCK_PIN
    );

    // Bus
    let i2c = I2c::new_async(p.I2C0, p.PIN_5, p.PIN_4, Irqs, i2c_config(&config.bus));
    let bus = HeldWriteBus::new(RpI2c::new(i2c, config.bus.frequency));

    // Console
    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config(&config.console));
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();
    let port = RpConsole::new(UartId::Uart0, config.console_pins, config.console, tx, rx);

    let mut runtime: Board = Runtime::new(bus, port, &config);
    info!("Runtime ready after {} ms", timing.millis());

    let mut probe = ProbeConsole::new();
    probe.banner(runtime.serial());

    // Look for the receiver once at startup, like the sketches do
    {
        let (wire, serial) = runtime.split();
        probe.handle(b'p', wire, serial);
    }

    loop {
        runtime.poll(|key, wire, serial| probe.handle(key, wire, serial));
        Timer::after(Duration::from_millis(board::POLL_INTERVAL_MS)).await;
    }
}
