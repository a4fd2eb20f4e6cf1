//! Board configuration types for ATmega328P boards, shared between the
//! platform crate and its build script.
#![no_std]

use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformConfig {
    /// The on-board status LED, if the board has one.
    #[serde(default)]
    pub led: Option<PinConfig>,
    #[serde(default)]
    pub i2c: I2cConfig,
}

/// A pin on one of the GPIO ports.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinConfig {
    pub port: PortName,
    /// Bit number within the port, `0..=7`.
    pub pin: u8,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortName {
    B,
    C,
    D,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct I2cConfig {
    /// Whether the TWI peripheral should be brought up. SDA and SCL share
    /// `PC4` and `PC5` with the ADC.
    #[serde(default = "I2cConfig::default_enabled")]
    pub enabled: bool,
}

impl I2cConfig {
    const fn default_enabled() -> bool {
        true
    }
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
        }
    }
}

impl fmt::Display for PortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::B => f.pad("B"),
            Self::C => f.pad("C"),
            Self::D => f.pad("D"),
        }
    }
}
