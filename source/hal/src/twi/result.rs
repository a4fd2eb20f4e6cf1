use core::{
    fmt,
    future::poll_fn,
    task::{Context, Poll},
};
use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
use maitake_sync::WaitCell;
use portable_atomic::{AtomicU8, Ordering};

/// Why a TWI transaction failed.
///
/// The raw status code that caused the failure is available from
/// [`Controller::last_error_code`](super::Controller::last_error_code).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Error {
    /// The START condition was not transmitted.
    Start,
    /// The slave address was not acknowledged (or arbitration was lost while
    /// sending it).
    Sla,
    /// A register index or payload byte was not acknowledged.
    Write,
    /// The repeated START condition was not transmitted.
    RepeatedStart,
    /// Unexpected status while receiving data.
    Read,
}

/// The value held by a [`ResultCell`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
pub enum TransferStatus {
    /// A transaction using this cell is in flight.
    Processing = 0,
    Ok = 1,
    StartError = 2,
    SlaError = 3,
    WriteError = 4,
    RepeatedStartError = 5,
    ReadError = 6,
}

/// Caller-owned completion cell for a TWI transaction.
///
/// The cell is written exactly once per transaction, from interrupt context,
/// when the transaction completes. The status is a single atomic byte, so a
/// task reading it always sees either [`TransferStatus::Processing`] or the
/// complete terminal value.
///
/// A new cell reads as [`TransferStatus::Ok`].
pub struct ResultCell {
    status: AtomicU8,
    done: WaitCell,
}

// === impl Error ===

impl Error {
    #[must_use]
    pub const fn status(self) -> TransferStatus {
        match self {
            Self::Start => TransferStatus::StartError,
            Self::Sla => TransferStatus::SlaError,
            Self::Write => TransferStatus::WriteError,
            Self::RepeatedStart => TransferStatus::RepeatedStartError,
            Self::Read => TransferStatus::ReadError,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.pad("START condition failed"),
            Self::Sla => f.pad("slave address not acknowledged"),
            Self::Write => f.pad("data byte not acknowledged"),
            Self::RepeatedStart => f.pad("repeated START condition failed"),
            Self::Read => f.pad("unexpected status while reading"),
        }
    }
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Sla => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            Self::Write => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
            Self::Start | Self::RepeatedStart => ErrorKind::Bus,
            Self::Read => ErrorKind::Other,
        }
    }
}

// === impl TransferStatus ===

impl TransferStatus {
    /// Returns `Pending` while the transaction is in flight, and its outcome
    /// otherwise.
    #[must_use]
    pub const fn as_poll(self) -> Poll<Result<(), Error>> {
        match self {
            Self::Processing => Poll::Pending,
            Self::Ok => Poll::Ready(Ok(())),
            Self::StartError => Poll::Ready(Err(Error::Start)),
            Self::SlaError => Poll::Ready(Err(Error::Sla)),
            Self::WriteError => Poll::Ready(Err(Error::Write)),
            Self::RepeatedStartError => Poll::Ready(Err(Error::RepeatedStart)),
            Self::ReadError => Poll::Ready(Err(Error::Read)),
        }
    }

    const fn from_result(result: Result<(), Error>) -> Self {
        match result {
            Ok(()) => Self::Ok,
            Err(error) => error.status(),
        }
    }

    const fn from_bits(bits: u8) -> Self {
        match bits {
            0 => Self::Processing,
            1 => Self::Ok,
            2 => Self::StartError,
            3 => Self::SlaError,
            4 => Self::WriteError,
            5 => Self::RepeatedStartError,
            // only values written by `ResultCell` are ever stored.
            _ => Self::ReadError,
        }
    }
}

// === impl ResultCell ===

impl ResultCell {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: AtomicU8::new(TransferStatus::Ok as u8),
            done: WaitCell::new(),
        }
    }

    #[must_use]
    pub fn status(&self) -> TransferStatus {
        TransferStatus::from_bits(self.status.load(Ordering::Acquire))
    }

    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.status() == TransferStatus::Processing
    }

    /// Returns the outcome of the last transaction, or `Pending` if it is
    /// still in flight.
    #[must_use]
    pub fn poll_result(&self) -> Poll<Result<(), Error>> {
        self.status().as_poll()
    }

    /// Wait for the transaction using this cell to complete.
    ///
    /// The cell is woken from the TWI interrupt handler, so this can be used
    /// from an async task instead of polling [`Self::status`] in a loop.
    pub async fn wait(&self) -> Result<(), Error> {
        poll_fn(|cx| self.poll_wait(cx)).await
    }

    fn poll_wait(&self, cx: &mut Context<'_>) -> Poll<Result<(), Error>> {
        loop {
            if let Poll::Ready(result) = self.poll_result() {
                return Poll::Ready(result);
            }

            match self.done.poll_wait(cx) {
                // registered; check again in case the transaction completed
                // before the waker was stored.
                Poll::Pending => return self.poll_result(),
                // consumed a wakeup from an earlier transaction.
                Poll::Ready(Ok(())) => continue,
                Poll::Ready(Err(_)) => {
                    cx.waker().wake_by_ref();
                    return Poll::Pending;
                }
            }
        }
    }

    pub(crate) fn begin(&self) {
        self.status
            .store(TransferStatus::Processing as u8, Ordering::Release);
    }

    pub(crate) fn complete(&self, result: Result<(), Error>) {
        self.status
            .store(TransferStatus::from_result(result) as u8, Ordering::Release);
        self.done.wake();
    }
}

impl Default for ResultCell {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResultCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultCell")
            .field("status", &self.status())
            .finish()
    }
}
