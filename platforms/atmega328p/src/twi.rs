//! The TWI (I<sup>2</sup>C) peripheral.
//!
//! [`AvrTwi`] implements the HAL's [`Bus`] trait on top of the `TWBR`,
//! `TWSR`, `TWDR` and `TWCR` registers. Every bus action writes `TWCR` with
//! `TWINT` set, which clears the interrupt flag and starts the action; the
//! hardware sets `TWINT` again (and raises the TWI interrupt, since `TWIE`
//! is set) when the action completes.
use crate::mmio::{Avr, Mmio, Reg};
use hal::twi::{status, Bus, ClockDivisor, SharedTwi};

/// TWI Bit Rate Register
pub const TWBR: Reg = Reg(0xB8);
/// TWI Status Register (status bits and the prescaler)
pub const TWSR: Reg = Reg(0xB9);
/// TWI Data Register
pub const TWDR: Reg = Reg(0xBB);
/// TWI Control Register
pub const TWCR: Reg = Reg(0xBC);

/// TWCR: interrupt flag. Writing one clears it.
pub const TWINT: u8 = 1 << 7;
/// TWCR: enable acknowledge
pub const TWEA: u8 = 1 << 6;
/// TWCR: START condition
pub const TWSTA: u8 = 1 << 5;
/// TWCR: STOP condition
pub const TWSTO: u8 = 1 << 4;
/// TWCR: enable
pub const TWEN: u8 = 1 << 2;
/// TWCR: interrupt enable
pub const TWIE: u8 = 1 << 0;

/// The TWI controller shared with the TWI interrupt vector.
pub static TWI: SharedTwi<AvrTwi<Avr>> = SharedTwi::new();

/// TWI interrupt vector body.
#[inline]
pub fn handle_twi_interrupt() {
    TWI.handle_interrupt();
}

/// The ATmega328P TWI peripheral.
#[derive(Debug)]
pub struct AvrTwi<M> {
    mmio: M,
}

impl<M: Mmio> AvrTwi<M> {
    #[must_use]
    pub const fn new(mmio: M) -> Self {
        Self { mmio }
    }

    /// Start the next bus action, with the interrupt enabled.
    #[inline]
    fn go(&mut self, bits: u8) {
        self.mmio.write(TWCR, TWINT | TWEN | TWIE | bits);
    }
}

impl<M: Mmio> Bus for AvrTwi<M> {
    fn configure(&mut self, divisor: ClockDivisor) {
        self.mmio.write(TWSR, divisor.prescaler.bits());
        self.mmio.write(TWBR, divisor.bit_rate);
        self.mmio.write(TWCR, TWEN);
    }

    fn send_start(&mut self) {
        self.go(TWSTA);
    }

    fn send_repeated_start(&mut self) {
        self.go(TWSTA);
    }

    fn send_stop(&mut self) {
        // no interrupt follows a STOP.
        self.mmio.write(TWCR, TWINT | TWEN | TWSTO);
    }

    fn write_byte(&mut self, byte: u8) {
        self.mmio.write(TWDR, byte);
        self.go(0);
    }

    fn read_byte(&mut self) -> u8 {
        self.mmio.read(TWDR)
    }

    fn send_ack(&mut self) {
        self.go(TWEA);
    }

    fn send_nack(&mut self) {
        self.go(0);
    }

    fn status(&self) -> u8 {
        self.mmio.read(TWSR) & status::MASK
    }
}
