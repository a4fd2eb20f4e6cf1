//! # cinder HAL
//!
//! Platform-independent peripheral drivers for small, single-core
//! microcontrollers. The drivers in this crate are written against narrow
//! hardware capabilities (for example, the [`twi::Bus`] trait) so that the
//! platform crate only has to provide the register-level pieces, and so that
//! everything interesting can be tested on the host.
//!
//! ## The I<sup>2</sup>C/TWI master
//!
//! The centerpiece is [`twi::Controller`], an interrupt-driven I<sup>2</sup>C
//! master. Task code submits one of three transactions:
//!
//! * a plain write ([`twi::Controller::request_write`]),
//! * a register write ([`twi::Controller::request_write_register`]),
//! * a register read ([`twi::Controller::request_read_register`]),
//!
//! and gets back [`twi::RequestStatus::Accepted`] or
//! [`twi::RequestStatus::Busy`] immediately. From then on, the platform's TWI
//! interrupt handler calls [`twi::Controller::handle_interrupt`] once per bus
//! event, and the controller performs exactly one bus action per call until
//! the transaction completes. The outcome is published to a caller-owned
//! [`twi::ResultCell`], which task code may poll or `.await`.
//!
//! ## Other peripherals
//!
//! * [`gpio`]: digital output pins.
//! * [`tick`]: a periodic tick counter that drives an external scheduler.
//! * [`uart`]: baud rate calculation and an interrupt-fed receive buffer.
//!
//! ## Configuration
//!
//! The [`settings`] module contains the serializable settings consumed by the
//! drivers. Platform crates usually load them at build time with the
//! `cinder-config` crate.

#![cfg_attr(not(test), no_std)]

pub mod gpio;
pub mod isr;
pub mod settings;
pub mod tick;
pub mod twi;
pub mod uart;

#[cfg(test)]
pub(crate) mod test_util;

pub use self::settings::{ConfigError, HalSettings};
