//! TWI master status codes.
//!
//! These are the values of the status register (with the prescaler bits
//! masked out) after each bus event, as used by the AVR TWI and the other
//! controllers derived from the same design.
use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

/// 0x00: Bus error due to an illegal START or STOP condition
pub const BUS_ERROR: u8 = 0x00;

/// 0x08: START condition transmitted
pub const START_TRANSMITTED: u8 = 0x08;

/// 0x10: Repeated START condition transmitted
pub const REPEATED_START_TRANSMITTED: u8 = 0x10;

/// 0x18: Address + Write bit transmitted, ACK received
pub const ADDR_WRITE_ACKED: u8 = 0x18;

/// 0x20: Address + Write bit transmitted, ACK not received
pub const ADDR_WRITE_NACKED: u8 = 0x20;

/// 0x28: Data byte transmitted in master mode, ACK received
pub const TX_DATA_ACKED: u8 = 0x28;

/// 0x30: Data byte transmitted in master mode, ACK not received
pub const TX_DATA_NACKED: u8 = 0x30;

/// 0x38: Arbitration lost in address or data byte
pub const ARBITRATION_LOST: u8 = 0x38;

/// 0x40: Address + Read bit transmitted, ACK received
pub const ADDR_READ_ACKED: u8 = 0x40;

/// 0x48: Address + Read bit transmitted, ACK not received
pub const ADDR_READ_NACKED: u8 = 0x48;

/// 0x50: Data byte received in master mode, ACK transmitted
pub const RX_DATA_ACKED: u8 = 0x50;

/// 0x58: Data byte received in master mode, no ACK transmitted
pub const RX_DATA_NACKED: u8 = 0x58;

/// 0xF8: No relevant state information available
pub const NO_INFO: u8 = 0xF8;

/// Mask selecting the status bits of the status register.
pub const MASK: u8 = 0xF8;

/// Returns a short description of a status code, for diagnostics.
#[must_use]
pub fn describe(status: u8) -> &'static str {
    match status {
        BUS_ERROR => "bus error",
        START_TRANSMITTED => "START transmitted",
        REPEATED_START_TRANSMITTED => "repeated START transmitted",
        ADDR_WRITE_ACKED => "SLA+W ACKed",
        ADDR_WRITE_NACKED => "SLA+W NACKed",
        TX_DATA_ACKED => "data byte ACKed",
        TX_DATA_NACKED => "data byte NACKed",
        ARBITRATION_LOST => "arbitration lost",
        ADDR_READ_ACKED => "SLA+R ACKed",
        ADDR_READ_NACKED => "SLA+R NACKed",
        RX_DATA_ACKED => "data byte received, ACK returned",
        RX_DATA_NACKED => "data byte received, NACK returned",
        NO_INFO => "no state information",
        _ => "unknown status",
    }
}

/// Classifies a captured failure status as an [`embedded_hal`] error kind.
///
/// This is more precise than [`Error::kind`](super::Error), which only knows
/// the phase the transaction failed in.
#[must_use]
pub fn error_kind(status: u8) -> ErrorKind {
    match status {
        ADDR_WRITE_NACKED | ADDR_READ_NACKED => {
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
        }
        TX_DATA_NACKED => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
        ARBITRATION_LOST => ErrorKind::ArbitrationLoss,
        BUS_ERROR => ErrorKind::Bus,
        _ => ErrorKind::Other,
    }
}
