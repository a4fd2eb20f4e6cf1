//! USART0 in asynchronous 8N1 mode.
//!
//! Reception is interrupt driven: the `USART_RX` handler moves each byte
//! into an [`RxBuffer`], which task code drains. Transmission polls the
//! data register empty flag, one byte at a time.
use crate::mmio::{Mmio, Reg};
use core::fmt;
use hal::uart::{BaudSetup, RxBuffer};

pub const UCSR0A: Reg = Reg(0xC0);
pub const UCSR0B: Reg = Reg(0xC1);
pub const UCSR0C: Reg = Reg(0xC2);
pub const UBRR0L: Reg = Reg(0xC4);
pub const UBRR0H: Reg = Reg(0xC5);
pub const UDR0: Reg = Reg(0xC6);

/// UCSR0A: data register empty
pub const UDRE0: u8 = 1 << 5;
/// UCSR0A: double transmission speed
pub const U2X0: u8 = 1 << 1;
/// UCSR0B: RX complete interrupt enable
pub const RXCIE0: u8 = 1 << 7;
/// UCSR0B: receiver enable
pub const RXEN0: u8 = 1 << 4;
/// UCSR0B: transmitter enable
pub const TXEN0: u8 = 1 << 3;
/// UCSR0C: 8-bit characters
pub const UCSZ0_8BIT: u8 = (1 << 2) | (1 << 1);

#[derive(Debug)]
pub struct Usart0<M> {
    mmio: M,
}

impl<M: Mmio> Usart0<M> {
    /// Configure the baud rate and frame format, and enable the receiver,
    /// transmitter and RX complete interrupt.
    pub fn new(mmio: M, baud: BaudSetup) -> Self {
        let [hi, lo] = baud.ubrr.to_be_bytes();
        mmio.write(UBRR0H, hi);
        mmio.write(UBRR0L, lo);
        mmio.modify(UCSR0A, |bits| {
            if baud.double_speed {
                bits | U2X0
            } else {
                bits & !U2X0
            }
        });
        mmio.write(UCSR0B, RXEN0 | TXEN0 | RXCIE0);
        mmio.write(UCSR0C, UCSZ0_8BIT);
        Self { mmio }
    }

    /// Transmit one byte, waiting for the previous one to leave the data
    /// register.
    pub fn write_byte(&mut self, byte: u8) {
        while self.mmio.read(UCSR0A) & UDRE0 == 0 {}
        self.mmio.write(UDR0, byte);
    }

    pub fn write_all(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.write_byte(byte);
        }
    }

    /// `USART_RX` interrupt body: move the received byte into `rx`.
    pub fn on_rx_interrupt<const N: usize>(&self, rx: &RxBuffer<N>) {
        let _isr = hal::isr::Isr::enter();
        // reading UDR0 clears the interrupt.
        rx.push(self.mmio.read(UDR0));
    }
}

impl<M: Mmio> fmt::Write for Usart0<M> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_all(s.as_bytes());
        Ok(())
    }
}
