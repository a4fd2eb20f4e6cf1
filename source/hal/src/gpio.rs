//! Digital output pins.
//!
//! The [`Output`] trait is the only pin capability the drivers need: setting
//! a pin high or low, and remembering what it was last set to. Configuring a
//! pin as an output (data direction, pull-ups and so on) is platform-specific
//! and happens before the pin is handed out as an [`Output`].
#![deny(missing_docs)]
use core::fmt;

/// A digital logic output pin.
pub trait Output: fmt::Display {
    /// Errors returned by [`Self::try_set`].
    ///
    /// Pins driven by a plain port register cannot fail, and use
    /// [`core::convert::Infallible`].
    type Error: fmt::Display;

    /// Attempts to drive this pin to `level`.
    fn try_set(&mut self, level: Level) -> Result<(), Self::Error>;

    /// Drives this pin to `level`.
    ///
    /// # Panics
    ///
    /// If [`Self::try_set`] returns an error.
    fn set(&mut self, level: Level) -> &mut Self {
        if let Err(error) = self.try_set(level) {
            panic!("failed to drive {self} {level}: {error}");
        }
        self
    }

    /// Returns the level this pin was last driven to.
    fn output_level(&self) -> Level;

    /// Drives this pin high.
    #[inline]
    fn set_high(&mut self) -> &mut Self {
        self.set(Level::High)
    }

    /// Drives this pin low.
    #[inline]
    fn set_low(&mut self) -> &mut Self {
        self.set(Level::Low)
    }

    /// Drives this pin to the opposite of its current output level.
    #[inline]
    fn toggle(&mut self) -> &mut Self {
        let level = !self.output_level();
        self.set(level)
    }
}

/// A digital logic level.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Level {
    /// Logical low.
    Low,
    /// Logical high.
    High,
}

// === impl Level ===

impl Level {
    /// Returns `true` if this is [`Level::High`].
    #[must_use]
    pub const fn is_high(self) -> bool {
        matches!(self, Self::High)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        level.is_high()
    }
}

impl core::ops::Not for Level {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.pad("low"),
            Self::High => f.pad("high"),
        }
    }
}
