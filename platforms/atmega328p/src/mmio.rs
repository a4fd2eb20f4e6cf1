//! Access to the memory-mapped I/O registers.
//!
//! Drivers are generic over [`Mmio`] so that they can be exercised on the
//! host against a fake register file.

/// A memory-mapped I/O register, by data-space address.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct Reg(pub u8);

pub trait Mmio {
    fn read(&self, reg: Reg) -> u8;

    fn write(&self, reg: Reg, value: u8);

    /// Read-modify-write `reg`.
    #[inline]
    fn modify(&self, reg: Reg, f: impl FnOnce(u8) -> u8) {
        let value = self.read(reg);
        self.write(reg, f(value));
    }
}

/// The ATmega328P's own registers.
#[derive(Copy, Clone, Debug)]
pub struct Avr {
    _p: (),
}

impl Avr {
    /// # Safety
    ///
    /// The caller must be running on an ATmega328P, and no other code may
    /// access the registers used by the drivers handed this value.
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self { _p: () }
    }
}

impl Mmio for Avr {
    #[inline]
    fn read(&self, reg: Reg) -> u8 {
        // Safety: constructing an `Avr` asserts that every `Reg` is a valid
        // I/O register address.
        unsafe { (usize::from(reg.0) as *const u8).read_volatile() }
    }

    #[inline]
    fn write(&self, reg: Reg, value: u8) {
        // Safety: see `read`.
        unsafe { (usize::from(reg.0) as *mut u8).write_volatile(value) }
    }
}

#[cfg(test)]
pub(crate) use self::fake::FakeMmio;
