use super::state::Op;
use core::fmt;

/// Whether a request was accepted by the [`Controller`](super::Controller).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[must_use = "a `Busy` request was not submitted and must be retried"]
pub enum RequestStatus {
    /// The transaction was started; its outcome will be published to the
    /// request's [`ResultCell`](super::ResultCell).
    Accepted,
    /// Another transaction is in flight. Nothing was changed; retry once the
    /// other transaction has completed.
    Busy,
}

/// A request rejected before submission because its parameters are invalid.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RequestError {
    /// The address does not fit in 7 bits.
    InvalidAddress(u8),
    /// The buffer has no bytes to transfer.
    EmptyBuffer,
    /// The buffer is longer than [`Request::MAX_LEN`].
    BufferTooLong(usize),
}

/// A validated TWI request.
///
/// The raw request methods on [`Controller`](super::Controller) assume that
/// the caller has checked the address and buffer length. Building a
/// `Request` performs those checks, so that
/// [`Controller::submit`](super::Controller::submit) can only be handed
/// well-formed transactions.
#[derive(Debug)]
pub struct Request<'a> {
    pub(super) address: u8,
    pub(super) op: Op<'a>,
}

// === impl RequestStatus ===

impl RequestStatus {
    #[must_use]
    pub fn is_accepted(self) -> bool {
        self == Self::Accepted
    }
}

// === impl RequestError ===

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddress(addr) => write!(f, "{addr:#x} is not a 7-bit I2C address"),
            Self::EmptyBuffer => f.pad("nothing to transfer"),
            Self::BufferTooLong(len) => write!(
                f,
                "{len} bytes is more than the {} bytes a transaction can transfer",
                Request::MAX_LEN
            ),
        }
    }
}

// === impl Request ===

impl<'a> Request<'a> {
    /// The largest number of payload bytes in one transaction.
    pub const MAX_LEN: usize = 255;

    /// Write `data` to the device at `address`.
    pub fn write(address: u8, data: &'a [u8]) -> Result<Self, RequestError> {
        check(address, data.len())?;
        Ok(Self {
            address,
            op: Op::Write { data },
        })
    }

    /// Write `register`, followed by `data`, to the device at `address`.
    pub fn write_register(address: u8, register: u8, data: &'a [u8]) -> Result<Self, RequestError> {
        check(address, data.len())?;
        Ok(Self {
            address,
            op: Op::WriteRegister { register, data },
        })
    }

    /// Read `buf.len()` bytes starting at `register` from the device at
    /// `address`.
    pub fn read_register(
        address: u8,
        register: u8,
        buf: &'a mut [u8],
    ) -> Result<Self, RequestError> {
        check(address, buf.len())?;
        Ok(Self {
            address,
            op: Op::ReadRegister { register, buf },
        })
    }

    #[must_use]
    pub fn address(&self) -> u8 {
        self.address
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.op.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.op.is_empty()
    }
}

fn check(address: u8, len: usize) -> Result<(), RequestError> {
    if address > 0x7f {
        return Err(RequestError::InvalidAddress(address));
    }
    match len {
        0 => Err(RequestError::EmptyBuffer),
        len if len > Request::MAX_LEN => Err(RequestError::BufferTooLong(len)),
        _ => Ok(()),
    }
}
