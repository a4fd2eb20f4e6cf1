//! Periodic scheduler tick.
//!
//! The cooperative scheduler expects to be told when a millisecond has
//! passed. A platform timer is set up in clear-timer-on-compare mode using a
//! [`TickSetup`], and its compare-match interrupt calls
//! [`Ticker::on_interrupt`], which counts the tick and calls the scheduler's
//! tick function.
use crate::{
    isr::Isr,
    settings::{ClockSettings, ConfigError, TickSettings},
};
use portable_atomic::{AtomicU32, Ordering};

/// Timer clock prescaler.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TimerPrescaler {
    Div1,
    Div8,
    Div64,
    Div256,
    Div1024,
}

/// Compare-match configuration for an 8-bit timer in CTC mode.
///
/// The timer counts from zero up to `compare` (inclusive) and then
/// interrupts, so one tick is `(compare + 1) * prescaler` CPU cycles.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TickSetup {
    pub prescaler: TimerPrescaler,
    pub compare: u8,
}

/// Counts timer ticks and forwards them to the scheduler.
pub struct Ticker {
    ticks: AtomicU32,
    on_tick: fn(),
}

// === impl TimerPrescaler ===

impl TimerPrescaler {
    const ALL: [Self; 5] = [
        Self::Div1,
        Self::Div8,
        Self::Div64,
        Self::Div256,
        Self::Div1024,
    ];

    #[must_use]
    pub const fn divide_by(self) -> u32 {
        match self {
            Self::Div1 => 1,
            Self::Div8 => 8,
            Self::Div64 => 64,
            Self::Div256 => 256,
            Self::Div1024 => 1024,
        }
    }

    /// The value of the clock select bits that selects this prescaler.
    #[must_use]
    pub const fn clock_select(self) -> u8 {
        match self {
            Self::Div1 => 0b001,
            Self::Div8 => 0b010,
            Self::Div64 => 0b011,
            Self::Div256 => 0b100,
            Self::Div1024 => 0b101,
        }
    }
}

// === impl TickSetup ===

impl TickSetup {
    /// Find the smallest prescaler that divides `cpu_hz` into exactly
    /// `tick_hz` ticks per second with an 8-bit compare value.
    pub fn for_rate(cpu_hz: u32, tick_hz: u32) -> Result<Self, ConfigError> {
        let unreachable = ConfigError::TickUnreachable { cpu_hz, tick_hz };
        if tick_hz == 0 {
            return Err(unreachable);
        }

        TimerPrescaler::ALL
            .iter()
            .find_map(|&prescaler| {
                let cycles = prescaler.divide_by().checked_mul(tick_hz)?;
                if cpu_hz % cycles != 0 {
                    return None;
                }
                let compare = u8::try_from((cpu_hz / cycles).checked_sub(1)?).ok()?;
                Some(Self { prescaler, compare })
            })
            .ok_or(unreachable)
    }

    pub fn from_settings(clock: &ClockSettings, tick: &TickSettings) -> Result<Self, ConfigError> {
        Self::for_rate(clock.cpu_hz, tick.hz)
    }

    /// The tick frequency produced by this setup.
    #[must_use]
    pub fn tick_hz(&self, cpu_hz: u32) -> u32 {
        cpu_hz / (self.prescaler.divide_by() * (u32::from(self.compare) + 1))
    }
}

// === impl Ticker ===

impl Ticker {
    /// Returns a new `Ticker` that calls `on_tick` on every tick.
    #[must_use]
    pub const fn new(on_tick: fn()) -> Self {
        Self {
            ticks: AtomicU32::new(0),
            on_tick,
        }
    }

    /// Handle the tick timer's interrupt.
    pub fn on_interrupt(&self) {
        let _isr = Isr::enter();
        self.ticks.fetch_add(1, Ordering::Relaxed);
        (self.on_tick)();
    }

    /// Returns the number of ticks since startup.
    ///
    /// This wraps after `u32::MAX` ticks (about 49 days of 1 ms ticks).
    #[must_use]
    pub fn now(&self) -> u32 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Returns the number of ticks since `start`, a previous value of
    /// [`Self::now`].
    #[must_use]
    pub fn since(&self, start: u32) -> u32 {
        self.now().wrapping_sub(start)
    }
}

impl core::fmt::Debug for Ticker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Ticker")
            .field("ticks", &self.now())
            .finish_non_exhaustive()
    }
}
