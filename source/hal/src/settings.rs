//! Driver settings.
//!
//! These types are deserialized from a board's configuration file (see the
//! `cinder-config` crate) and handed to the drivers at initialization time.
//! Every field has a default, so a configuration file only needs to mention
//! what differs from a 16 MHz board with a 100 kHz I<sup>2</sup>C bus.
use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HalSettings {
    #[serde(default)]
    pub clock: ClockSettings,
    #[serde(default)]
    pub twi: TwiSettings,
    #[serde(default)]
    pub uart: UartSettings,
    #[serde(default)]
    pub tick: TickSettings,
}

/// CPU clock settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSettings {
    /// The CPU (and peripheral) clock frequency, in Hz.
    #[serde(default = "ClockSettings::default_cpu_hz")]
    pub cpu_hz: u32,
}

/// I<sup>2</sup>C/TWI master settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwiSettings {
    /// The SCL frequency, in Hz.
    #[serde(default = "TwiSettings::default_scl_hz")]
    pub scl_hz: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UartSettings {
    #[serde(default = "UartSettings::default_baud")]
    pub baud: u32,
}

/// Scheduler tick settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSettings {
    /// How many ticks per second the tick timer should generate.
    ///
    /// The scheduler expects one tick per millisecond, so changing this is
    /// mostly useful for testing.
    #[serde(default = "TickSettings::default_hz")]
    pub hz: u32,
}

/// Errors returned when a requested clock, baud rate or tick rate cannot be
/// produced from the configured CPU clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The requested SCL frequency is faster than the TWI can generate.
    SclTooFast { cpu_hz: u32, scl_hz: u32 },
    /// The requested SCL frequency is slower than the largest divisor allows.
    SclTooSlow { cpu_hz: u32, scl_hz: u32 },
    /// No UART divisor gets within tolerance of the requested baud rate.
    BaudUnreachable { cpu_hz: u32, baud: u32 },
    /// No prescaler and 8-bit compare value produce exactly the requested
    /// tick rate.
    TickUnreachable { cpu_hz: u32, tick_hz: u32 },
}

// === impl HalSettings ===

impl Default for HalSettings {
    fn default() -> Self {
        Self {
            clock: ClockSettings::default(),
            twi: TwiSettings::default(),
            uart: UartSettings::default(),
            tick: TickSettings::default(),
        }
    }
}

// === impl ClockSettings ===

impl ClockSettings {
    pub const DEFAULT_CPU_HZ: u32 = 16_000_000;

    const fn default_cpu_hz() -> u32 {
        Self::DEFAULT_CPU_HZ
    }
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            cpu_hz: Self::DEFAULT_CPU_HZ,
        }
    }
}

// === impl TwiSettings ===

impl TwiSettings {
    /// Standard mode.
    pub const DEFAULT_SCL_HZ: u32 = 100_000;

    const fn default_scl_hz() -> u32 {
        Self::DEFAULT_SCL_HZ
    }
}

impl Default for TwiSettings {
    fn default() -> Self {
        Self {
            scl_hz: Self::DEFAULT_SCL_HZ,
        }
    }
}

// === impl UartSettings ===

impl UartSettings {
    pub const DEFAULT_BAUD: u32 = 9600;

    const fn default_baud() -> u32 {
        Self::DEFAULT_BAUD
    }
}

impl Default for UartSettings {
    fn default() -> Self {
        Self {
            baud: Self::DEFAULT_BAUD,
        }
    }
}

// === impl TickSettings ===

impl TickSettings {
    /// One tick per millisecond.
    pub const DEFAULT_HZ: u32 = 1000;

    const fn default_hz() -> u32 {
        Self::DEFAULT_HZ
    }
}

impl Default for TickSettings {
    fn default() -> Self {
        Self {
            hz: Self::DEFAULT_HZ,
        }
    }
}

// === impl ConfigError ===

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::SclTooFast { cpu_hz, scl_hz } => {
                write!(f, "SCL of {scl_hz} Hz is too fast for a {cpu_hz} Hz CPU clock")
            }
            Self::SclTooSlow { cpu_hz, scl_hz } => {
                write!(f, "SCL of {scl_hz} Hz is too slow for a {cpu_hz} Hz CPU clock")
            }
            Self::BaudUnreachable { cpu_hz, baud } => {
                write!(f, "{baud} baud cannot be generated from a {cpu_hz} Hz CPU clock")
            }
            Self::TickUnreachable { cpu_hz, tick_hz } => write!(
                f,
                "a {tick_hz} Hz tick cannot be generated exactly from a {cpu_hz} Hz CPU clock"
            ),
        }
    }
}
