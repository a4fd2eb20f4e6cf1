use crate::settings::{ClockSettings, ConfigError, TwiSettings};

/// The hardware half of a TWI master.
///
/// Each method performs (or arms) a single bus action and returns
/// immediately. Methods that transmit or receive are expected to clear the
/// peripheral's interrupt flag with the bus interrupt enabled, so that the
/// *next* bus event invokes [`Controller::handle_interrupt`] again.
/// [`Bus::send_stop`] ends the transaction and does not generate a further
/// interrupt.
///
/// [`Controller::handle_interrupt`]: super::Controller::handle_interrupt
pub trait Bus {
    /// Configure the SCL clock divisor and enable the peripheral.
    fn configure(&mut self, divisor: ClockDivisor);

    /// Generate a START condition.
    fn send_start(&mut self);

    /// Generate a repeated START condition in the middle of a transaction.
    fn send_repeated_start(&mut self);

    /// Generate a STOP condition.
    fn send_stop(&mut self);

    /// Transmit one byte (an address byte, a register index or payload).
    fn write_byte(&mut self, byte: u8);

    /// Returns the byte most recently received from the bus.
    fn read_byte(&mut self) -> u8;

    /// Receive the next byte and acknowledge it.
    fn send_ack(&mut self);

    /// Receive the next byte and do not acknowledge it (it's the last one).
    fn send_nack(&mut self);

    /// Returns the status code of the most recent bus event.
    ///
    /// Implementations must mask out any non-status bits (such as the AVR
    /// prescaler bits in `TWSR`), so that the result can be compared directly
    /// with the constants in [`status`](super::status).
    fn status(&self) -> u8;
}

/// TWI bit rate prescaler.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
pub enum Prescaler {
    P1 = 0b00,
    P4 = 0b01,
    P16 = 0b10,
    P64 = 0b11,
}

/// SCL clock divisor: `SCL = CPU / (16 + 2 * bit_rate * prescaler)`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ClockDivisor {
    pub bit_rate: u8,
    pub prescaler: Prescaler,
}

// === impl Prescaler ===

impl Prescaler {
    const ALL: [Self; 4] = [Self::P1, Self::P4, Self::P16, Self::P64];

    #[must_use]
    pub const fn divide_by(self) -> u32 {
        match self {
            Self::P1 => 1,
            Self::P4 => 4,
            Self::P16 => 16,
            Self::P64 => 64,
        }
    }

    /// The value of the prescaler bits in the status register.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

// === impl ClockDivisor ===

impl ClockDivisor {
    /// Compute the divisor for the requested SCL frequency.
    ///
    /// The smallest prescaler that keeps the bit rate within 8 bits is used,
    /// and the bit rate is rounded up, so the resulting SCL frequency is never
    /// faster than requested.
    pub fn for_frequency(cpu_hz: u32, scl_hz: u32) -> Result<Self, ConfigError> {
        if scl_hz == 0 {
            return Err(ConfigError::SclTooSlow { cpu_hz, scl_hz });
        }
        let cycles = cpu_hz / scl_hz;
        if cycles < 16 {
            return Err(ConfigError::SclTooFast { cpu_hz, scl_hz });
        }
        // `2 * bit_rate * prescaler` cycles are spent on top of the fixed 16.
        let variable = cycles - 16;
        for prescaler in Prescaler::ALL {
            let step = 2 * prescaler.divide_by();
            let bit_rate = (variable + step - 1) / step;
            if let Ok(bit_rate) = u8::try_from(bit_rate) {
                return Ok(Self {
                    bit_rate,
                    prescaler,
                });
            }
        }
        Err(ConfigError::SclTooSlow { cpu_hz, scl_hz })
    }

    pub fn from_settings(clock: &ClockSettings, twi: &TwiSettings) -> Result<Self, ConfigError> {
        Self::for_frequency(clock.cpu_hz, twi.scl_hz)
    }

    /// The SCL frequency this divisor produces from a `cpu_hz` clock.
    #[must_use]
    pub fn scl_hz(&self, cpu_hz: u32) -> u32 {
        cpu_hz / (16 + 2 * self.bit_rate as u32 * self.prescaler.divide_by())
    }
}

impl Default for ClockDivisor {
    /// 100 kHz from a 16 MHz clock.
    fn default() -> Self {
        Self {
            bit_rate: 72,
            prescaler: Prescaler::P1,
        }
    }
}
