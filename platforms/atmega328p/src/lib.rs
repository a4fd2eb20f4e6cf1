//! # cinder on the ATmega328P
//!
//! Register-level drivers that connect the HAL's interrupt-driven drivers to
//! the ATmega328P peripherals:
//!
//! | peripheral | driver | interrupt vector body |
//! |---|---|---|
//! | TWI | [`twi::AvrTwi`], installed in [`twi::TWI`] | [`twi::handle_twi_interrupt`] |
//! | Timer0 | [`timer::Timer0`] | `Ticker::on_interrupt` |
//! | USART0 | [`usart::Usart0`] | [`usart::Usart0::on_rx_interrupt`] with [`UART_RX`] |
//! | ports B, C, D | [`gpio::Pin`] | |
//!
//! Firmware loads its board configuration with one of the functions in
//! [`boards`] and passes it to [`Board::init`].

#![cfg_attr(not(test), no_std)]

pub mod gpio;
pub mod mmio;
pub mod timer;
pub mod twi;
pub mod usart;

use atmega328p_config::PlatformConfig;
use cinder_config::CinderConfig;
use core::fmt;
use hal::{
    settings::ConfigError,
    tick::TickSetup,
    twi::{ClockDivisor, Controller},
    uart::{BaudSetup, RxBuffer},
};

use self::{
    gpio::{InvalidPin, Pin, PushPull},
    mmio::{Avr, Mmio},
    timer::Timer0,
    twi::AvrTwi,
    usart::Usart0,
};

pub type Config = CinderConfig<PlatformConfig>;

/// Capacity of [`UART_RX`], plus one.
pub const UART_RX_LEN: usize = 32;

/// Bytes received on USART0.
pub static UART_RX: RxBuffer<UART_RX_LEN> = RxBuffer::new();

/// The board's peripherals, configured.
#[derive(Debug)]
pub struct Board<M = Avr> {
    pub led: Option<PushPull<M>>,
    pub timer: Timer0<M>,
    pub usart: Usart0<M>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InitError {
    Config(ConfigError),
    Pin(InvalidPin),
}

/// Board configs rendered from `board-configs/` at build time.
pub mod boards {
    use super::*;
    use cinder_config::runtime::Error;

    pub fn uno() -> Result<Config, Error> {
        cinder_config::include_config!(PlatformConfig, "uno")
    }

    pub fn pro_mini_8mhz() -> Result<Config, Error> {
        cinder_config::include_config!(PlatformConfig, "pro-mini-8mhz")
    }
}

// === impl Board ===

impl Board<Avr> {
    /// Configure the board, and install the TWI controller in [`twi::TWI`]
    /// if I<sup>2</sup>C is enabled.
    ///
    /// The tick timer is configured but not started.
    ///
    /// # Safety
    ///
    /// This must be called once, on an ATmega328P, with interrupts disabled.
    pub unsafe fn init(config: &Config) -> Result<Self, InitError> {
        let (board, controller) = Self::init_with(Avr::new(), config)?;
        if let Some(controller) = controller {
            if twi::TWI.install(controller).is_some() {
                tracing::warn!("replaced a previously installed TWI controller");
            }
        }
        Ok(board)
    }
}

impl<M: Mmio + Clone> Board<M> {
    /// Configure the board's peripherals through `mmio`, returning the TWI
    /// controller (not yet initialized) separately.
    pub fn init_with(
        mmio: M,
        config: &Config,
    ) -> Result<(Self, Option<Controller<'static, AvrTwi<M>>>), InitError> {
        let hal = &config.hal;
        let divisor = ClockDivisor::from_settings(&hal.clock, &hal.twi)?;
        let baud = BaudSetup::from_settings(&hal.clock, &hal.uart)?;
        let tick = TickSetup::from_settings(&hal.clock, &hal.tick)?;

        let led = config
            .platform
            .led
            .as_ref()
            .map(|led| Pin::from_config(mmio.clone(), led).map(Pin::into_output))
            .transpose()?;

        let controller = config
            .platform
            .i2c
            .enabled
            .then(|| Controller::new(AvrTwi::new(mmio.clone()), divisor));

        tracing::info!(
            cpu_hz = hal.clock.cpu_hz,
            scl_hz = hal.twi.scl_hz,
            baud = hal.uart.baud,
            i2c = controller.is_some(),
            "board configured"
        );

        let board = Self {
            led,
            timer: Timer0::new(mmio.clone(), tick),
            usart: Usart0::new(mmio, baud),
        };
        Ok((board, controller))
    }
}

// === impl InitError ===

impl From<ConfigError> for InitError {
    fn from(error: ConfigError) -> Self {
        Self::Config(error)
    }
}

impl From<InvalidPin> for InitError {
    fn from(error: InvalidPin) -> Self {
        Self::Pin(error)
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(error) => write!(f, "invalid clock configuration: {error}"),
            Self::Pin(error) => write!(f, "invalid pin: {error}"),
        }
    }
}
