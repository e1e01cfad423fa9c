//! Wheel Clock - Motorized Indicator Clock Firmware
//!
//! Main firmware binary for RP2040 boards driving two 28BYJ-48 wheels
//! through ULN2003 drivers, with an analog hall sensor per wheel and
//! four PWM indicator LEDs. The host sets the time and sends commands
//! over UART0.
//!
//! # Pinout
//!
//! | Function            | GPIO        |
//! |---------------------|-------------|
//! | UART0 TX / RX       | 0 / 1       |
//! | Hours coils IN1-4   | 2, 3, 4, 5  |
//! | Minutes coils IN1-4 | 6, 7, 8, 9  |
//! | Status / colon LED  | 14 / 15     |
//! | PM / aux LED        | 16 / 17     |
//! | Hours hall sensor   | 26 (ADC0)   |
//! | Minutes hall sensor | 27 (ADC1)   |

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel as AdcChannel, Config as AdcConfig};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_rp::watchdog::Watchdog;
use embassy_time::{Delay, Duration};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use wheelclock_core::state::ClockState;
use wheelclock_drivers::indicator::LedBank;
use wheelclock_drivers::sensor::HallSensors;
use wheelclock_drivers::stepper::Uln2003;
use wheelclock_hal_rp2040::adc::{AdcInput, BlockingAdc};
use wheelclock_hal_rp2040::flash::FlashStorage;

use crate::board::BoardIo;

mod board;
mod channels;
mod config;
mod tasks;
mod wall_clock;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

/// RP2040 watchdog maximum is about 8.3 s
const WATCHDOG_TIMEOUT: Duration = Duration::from_millis(8_000);

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 512]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Wheel clock firmware starting...");

    let p = embassy_rp::init(Default::default());

    // Start the watchdog first so a hang while loading config still resets
    let mut watchdog = Watchdog::new(p.WATCHDOG);
    watchdog.start(WATCHDOG_TIMEOUT);

    // Load persisted settings and calibration (or defaults)
    let mut storage = FlashStorage::new(p.FLASH, p.DMA_CH0);
    let settings = config::load_settings(&mut storage).await;
    let calibration = config::load_calibration(&mut storage).await;
    watchdog.feed();

    // Coils, in full-step sequence order (IN1, IN3, IN2, IN4)
    let hours = Uln2003::new([
        Output::new(p.PIN_2, Level::Low),
        Output::new(p.PIN_4, Level::Low),
        Output::new(p.PIN_3, Level::Low),
        Output::new(p.PIN_5, Level::Low),
    ]);
    let minutes = Uln2003::new([
        Output::new(p.PIN_6, Level::Low),
        Output::new(p.PIN_8, Level::Low),
        Output::new(p.PIN_7, Level::Low),
        Output::new(p.PIN_9, Level::Low),
    ]);

    // Hall sensors on ADC0/ADC1
    let mut adc = BlockingAdc::new(Adc::new_blocking(p.ADC, AdcConfig::default()));
    adc.attach(AdcInput::Adc0, AdcChannel::new_pin(p.PIN_26, Pull::None));
    adc.attach(AdcInput::Adc1, AdcChannel::new_pin(p.PIN_27, Pull::None));
    let sensors = HallSensors::new(adc, AdcInput::Adc0.index(), AdcInput::Adc1.index());

    // Indicator LEDs on PWM slices 7 (A/B) and 0 (A/B)
    let (status, colon) =
        Pwm::new_output_ab(p.PWM_SLICE7, p.PIN_14, p.PIN_15, PwmConfig::default()).split();
    let (pm, aux) =
        Pwm::new_output_ab(p.PWM_SLICE0, p.PIN_16, p.PIN_17, PwmConfig::default()).split();
    let leds = LedBank::new(unwrap!(status), unwrap!(colon), unwrap!(pm), unwrap!(aux));

    // UART0 for the control link
    let tx_buf = TX_BUF.init([0u8; 512]);
    let rx_buf = RX_BUF.init([0u8; 256]);
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, UartConfig::default());
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();
    info!("Peripherals initialized");

    let state = ClockState::new(hours, minutes, settings, calibration);
    let board = BoardIo {
        sensors,
        leds,
        watchdog,
        delay: Delay,
    };

    unwrap!(spawner.spawn(tasks::link_rx_task(rx)));
    unwrap!(spawner.spawn(tasks::link_tx_task(tx)));
    unwrap!(spawner.spawn(tasks::persistence_task(storage)));
    unwrap!(spawner.spawn(tasks::control_task(state, board)));

    info!("All tasks spawned");
}
