//! Interrupt-driven I<sup>2</sup>C/TWI master.
//!
//! A [`Controller`] runs one transaction at a time, advancing by exactly one
//! bus action each time [`Controller::handle_interrupt`] is called. Three
//! kinds of transaction are supported:
//!
//! | request | bus sequence |
//! |---|---|
//! | [`request_write`] | `START`, `SLA+W`, data..., `STOP` |
//! | [`request_write_register`] | `START`, `SLA+W`, register, data..., `STOP` |
//! | [`request_read_register`] | `START`, `SLA+W`, register, repeated `START`, `SLA+R`, data..., `STOP` |
//!
//! Every exit path, successful or not, issues exactly one `STOP` and returns
//! the controller to [`State::Idle`]. Failures are classified by the phase
//! they happen in (see [`Error`]), and the raw status code is kept for
//! diagnostics ([`Controller::last_error_code`]).
//!
//! Buffers and the [`ResultCell`] are borrowed, not copied, for the
//! controller's lifetime `'a`. A controller stored in a `static` (see
//! [`SharedTwi`]) therefore takes `'static` buffers; once a transaction has
//! completed, [`Controller::take_buffer`] hands the buffer back.
//!
//! [`request_write`]: Controller::request_write
//! [`request_write_register`]: Controller::request_write_register
//! [`request_read_register`]: Controller::request_read_register
use crate::{
    isr::Isr,
    settings::{ConfigError, HalSettings},
};

mod bus;
mod request;
mod result;
mod shared;
pub mod state;
pub mod status;

pub use self::{
    bus::{Bus, ClockDivisor, Prescaler},
    request::{Request, RequestError, RequestStatus},
    result::{Error, ResultCell, TransferStatus},
    shared::SharedTwi,
    state::{Operation, State},
};
use self::state::{transition, Action, Cursor, Op};

#[cfg(test)]
mod tests;

/// An I<sup>2</sup>C/TWI master driving one physical bus.
pub struct Controller<'a, B> {
    bus: B,
    divisor: ClockDivisor,
    state: State,
    address: u8,
    op: Op<'a>,
    handled: usize,
    result: Option<&'a ResultCell>,
    last_status: u8,
}

/// A buffer returned by [`Controller::take_buffer`].
#[derive(Debug)]
pub enum Buffer<'a> {
    /// The payload of a write or register write.
    Written(&'a [u8]),
    /// The destination of a register read.
    Read(&'a mut [u8]),
}

// === impl Controller ===

impl<'a, B: Bus> Controller<'a, B> {
    /// Returns a new controller for `bus`.
    ///
    /// The hardware is not touched until [`Self::init`] is called.
    #[must_use]
    pub fn new(bus: B, divisor: ClockDivisor) -> Self {
        Self {
            bus,
            divisor,
            state: State::Idle,
            address: 0,
            op: Op::None,
            handled: 0,
            result: None,
            last_status: status::NO_INFO,
        }
    }

    /// Returns a new controller for `bus`, clocked according to `settings`.
    pub fn from_settings(bus: B, settings: &HalSettings) -> Result<Self, ConfigError> {
        let divisor = ClockDivisor::from_settings(&settings.clock, &settings.twi)?;
        Ok(Self::new(bus, divisor))
    }

    /// Reset the controller to [`State::Idle`] and configure the bus clock.
    ///
    /// This must not be called while a transaction is in flight: the
    /// transaction's [`ResultCell`] would never leave
    /// [`TransferStatus::Processing`].
    pub fn init(&mut self) {
        if self.state != State::Idle {
            tracing::warn!(state = ?self.state, "TWI re-initialized during a transaction");
        }
        self.state = State::Idle;
        self.address = 0;
        self.op = Op::None;
        self.handled = 0;
        self.result = None;
        self.bus.configure(self.divisor);
        tracing::debug!(divisor = ?self.divisor, "TWI initialized");
    }

    /// Write `data` to the device at `address`.
    ///
    /// `address` must be a 7-bit address and `data` at most 255 bytes. An
    /// empty `data` only addresses the device, which completes with
    /// [`TransferStatus::Ok`] if it acknowledges.
    pub fn request_write(
        &mut self,
        address: u8,
        data: &'a [u8],
        result: &'a ResultCell,
    ) -> RequestStatus {
        self.begin(address, Op::Write { data }, result)
    }

    /// Write `register`, followed by `data`, to the device at `address`.
    pub fn request_write_register(
        &mut self,
        address: u8,
        register: u8,
        data: &'a [u8],
        result: &'a ResultCell,
    ) -> RequestStatus {
        self.begin(address, Op::WriteRegister { register, data }, result)
    }

    /// Write `register` to the device at `address`, then read `buf.len()`
    /// bytes into `buf` after a repeated `START`.
    pub fn request_read_register(
        &mut self,
        address: u8,
        register: u8,
        buf: &'a mut [u8],
        result: &'a ResultCell,
    ) -> RequestStatus {
        self.begin(address, Op::ReadRegister { register, buf }, result)
    }

    /// Submit a validated [`Request`].
    ///
    /// If another transaction is in flight, the request is handed back so
    /// that it can be retried later.
    pub fn submit(&mut self, request: Request<'a>, result: &'a ResultCell) -> Result<(), Request<'a>> {
        if self.state != State::Idle {
            return Err(request);
        }
        let Request { address, op } = request;
        let _accepted = self.begin(address, op, result);
        Ok(())
    }

    fn begin(&mut self, address: u8, op: Op<'a>, result: &'a ResultCell) -> RequestStatus {
        if self.state != State::Idle {
            tracing::debug!(state = ?self.state, "TWI busy; rejecting request");
            return RequestStatus::Busy;
        }
        if Isr::is_in_isr() {
            tracing::warn!("TWI request submitted from interrupt context");
        }

        tracing::debug!(
            address = ?format_args!("{address:#x}"),
            operation = ?op.operation(),
            len = op.len(),
            "starting TWI transaction"
        );
        self.address = address;
        self.op = op;
        self.handled = 0;
        result.begin();
        self.result = Some(result);
        self.state = State::Start;
        // the next interrupt is for this START, so it must come last.
        self.bus.send_start();
        RequestStatus::Accepted
    }

    /// Handle a TWI interrupt.
    ///
    /// This must be called exactly once per bus event. It performs a single
    /// bus action and never waits for the bus.
    pub fn handle_interrupt(&mut self) {
        let status = self.bus.status();
        let step = transition(self.state, self.address, &self.op, self.handled, status);
        tracing::trace!(
            status = ?format_args!("{status:#x}"),
            state = ?self.state,
            next = ?step.next,
            "TWI interrupt"
        );

        match step.cursor {
            Cursor::Hold => {}
            Cursor::Advance => self.handled += 1,
            Cursor::Store => {
                let byte = self.bus.read_byte();
                tracing::trace!("TWI read data: {byte:#x}");
                if let Op::ReadRegister { buf, .. } = &mut self.op {
                    if let Some(slot) = buf.get_mut(self.handled) {
                        *slot = byte;
                        self.handled += 1;
                    }
                }
            }
        }

        if let Some(Err(error)) = step.outcome {
            self.last_status = status;
            tracing::warn!(
                %error,
                status = ?format_args!("{status:#x}"),
                state = ?self.state,
                "TWI error: {}",
                status::describe(status),
            );
        }

        self.state = step.next;
        match step.action {
            Action::Transmit(byte) => self.bus.write_byte(byte),
            Action::RepeatedStart => self.bus.send_repeated_start(),
            Action::Ack => self.bus.send_ack(),
            Action::Nack => self.bus.send_nack(),
            Action::Stop => self.bus.send_stop(),
        }

        if let Some(outcome) = step.outcome {
            tracing::debug!(?outcome, handled = self.handled, "TWI transaction ended");
            if let Some(result) = self.result.take() {
                result.complete(outcome);
            }
        }
    }

    /// Returns the status code that caused the last failed transaction.
    #[must_use]
    pub fn last_error_code(&self) -> u8 {
        self.last_status
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    /// The kind of the current (or last) transaction.
    #[must_use]
    pub fn operation(&self) -> Option<Operation> {
        self.op.operation()
    }

    /// The number of payload bytes transferred so far.
    #[must_use]
    pub fn handled_bytes(&self) -> usize {
        self.handled
    }

    #[must_use]
    pub fn divisor(&self) -> ClockDivisor {
        self.divisor
    }

    /// Take back the buffer of the last transaction.
    ///
    /// Returns `None` while a transaction is in flight, or if the buffer was
    /// already taken.
    pub fn take_buffer(&mut self) -> Option<Buffer<'a>> {
        if self.state != State::Idle {
            return None;
        }
        match core::mem::take(&mut self.op) {
            Op::None => None,
            Op::Write { data } | Op::WriteRegister { data, .. } => Some(Buffer::Written(data)),
            Op::ReadRegister { buf, .. } => Some(Buffer::Read(buf)),
        }
    }

    #[must_use]
    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Release the underlying bus.
    pub fn release(self) -> B {
        self.bus
    }
}

impl<B> core::fmt::Debug for Controller<'_, B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Controller")
            .field("state", &self.state)
            .field("address", &format_args!("{:#x}", self.address))
            .field("operation", &self.op.operation())
            .field("handled", &self.handled)
            .field("last_status", &format_args!("{:#x}", self.last_status))
            .finish_non_exhaustive()
    }
}
