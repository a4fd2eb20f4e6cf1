//! GPIO ports B, C and D.
use crate::mmio::{Mmio, Reg};
use atmega328p_config::{PinConfig, PortName};
use core::{convert::Infallible, fmt};
use hal::gpio::{Level, Output};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Port(PortName);

/// A port pin that has not been configured yet.
#[derive(Debug)]
pub struct Pin<M> {
    mmio: M,
    port: Port,
    bit: u8,
}

/// A push-pull output pin.
#[derive(Debug)]
pub struct PushPull<M> {
    pin: Pin<M>,
    level: Level,
}

/// A pin that doesn't exist.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct InvalidPin {
    pub port: PortName,
    pub pin: u8,
}

// === impl Port ===

impl Port {
    pub const B: Self = Self(PortName::B);
    pub const C: Self = Self(PortName::C);
    pub const D: Self = Self(PortName::D);

    /// Input pins register. Writing a one toggles the output.
    #[must_use]
    pub const fn pin(self) -> Reg {
        match self.0 {
            PortName::B => Reg(0x23),
            PortName::C => Reg(0x26),
            PortName::D => Reg(0x29),
        }
    }

    /// Data direction register
    #[must_use]
    pub const fn ddr(self) -> Reg {
        Reg(self.pin().0 + 1)
    }

    /// Data register
    #[must_use]
    pub const fn port(self) -> Reg {
        Reg(self.pin().0 + 2)
    }
}

impl From<PortName> for Port {
    fn from(name: PortName) -> Self {
        Self(name)
    }
}

// === impl Pin ===

impl<M: Mmio> Pin<M> {
    pub fn new(mmio: M, port: Port, bit: u8) -> Result<Self, InvalidPin> {
        // port C only has seven pins.
        let pins = if port == Port::C { 7 } else { 8 };
        if bit >= pins {
            return Err(InvalidPin { port: port.0, pin: bit });
        }
        Ok(Self { mmio, port, bit })
    }

    pub fn from_config(mmio: M, config: &PinConfig) -> Result<Self, InvalidPin> {
        Self::new(mmio, config.port.into(), config.pin)
    }

    /// Configure this pin as an output, driven low.
    pub fn into_output(self) -> PushPull<M> {
        let mask = self.mask();
        self.mmio.modify(self.port.port(), |bits| bits & !mask);
        self.mmio.modify(self.port.ddr(), |bits| bits | mask);
        PushPull {
            pin: self,
            level: Level::Low,
        }
    }

    #[inline]
    fn mask(&self) -> u8 {
        1 << self.bit
    }
}

impl<M> fmt::Display for Pin<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}{}", self.port.0, self.bit)
    }
}

// === impl PushPull ===

impl<M: Mmio> Output for PushPull<M> {
    type Error = Infallible;

    fn try_set(&mut self, level: Level) -> Result<(), Self::Error> {
        let mask = self.pin.mask();
        let port = self.pin.port.port();
        match level {
            Level::High => self.pin.mmio.modify(port, |bits| bits | mask),
            Level::Low => self.pin.mmio.modify(port, |bits| bits & !mask),
        }
        self.level = level;
        Ok(())
    }

    fn output_level(&self) -> Level {
        self.level
    }

    fn toggle(&mut self) -> &mut Self {
        self.pin.mmio.write(self.pin.port.pin(), self.pin.mask());
        self.level = !self.level;
        self
    }
}

impl<M> fmt::Display for PushPull<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.pin, f)
    }
}

impl<M: Mmio> embedded_hal::digital::ErrorType for PushPull<M> {
    type Error = Infallible;
}

impl<M: Mmio> embedded_hal::digital::OutputPin for PushPull<M> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.try_set(Level::Low)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.try_set(Level::High)
    }
}

impl<M: Mmio> embedded_hal::digital::StatefulOutputPin for PushPull<M> {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level.is_high())
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level.is_high())
    }

    fn toggle(&mut self) -> Result<(), Self::Error> {
        Output::toggle(self);
        Ok(())
    }
}

// === impl InvalidPin ===

impl fmt::Display for InvalidPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "port {} has no pin {}", self.port, self.pin)
    }
}
