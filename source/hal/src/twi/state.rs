//! The TWI master state machine.
//!
//! [`transition`] is a pure function from the current state, the in-flight
//! operation and the status code of the latest bus event to the next
//! [`Step`]. The [`Controller`](super::Controller) applies steps to the bus;
//! keeping the decision separate means every row of the transition table can
//! be tested without a bus.
use super::{result::Error, status::*};

/// TWI state machine
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum State {
    /// No transaction in flight.
    Idle,
    /// Waiting for a `START` condition to be sent.
    Start,
    /// Waiting for the target device to `ACK` the address with the write bit.
    SendSlaveAddressWrite,
    /// Waiting for the target device to `ACK` the register index.
    WriteRegisterByte,
    /// Waiting for the target device to `ACK` a payload byte.
    WriteData,
    /// Waiting for a repeated `START` condition to be sent.
    RepeatedStart,
    /// Waiting for the target device to `ACK` the address with the read bit.
    SendSlaveAddressRead,
    /// Waiting for the target device to send a data byte.
    ReadData,
}

/// The kind of transaction requested by the application.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Operation {
    Write,
    WriteRegister,
    ReadRegister,
}

/// The in-flight operation, along with the caller's buffer.
#[derive(Debug, Default)]
pub enum Op<'a> {
    #[default]
    None,
    Write {
        data: &'a [u8],
    },
    WriteRegister {
        register: u8,
        data: &'a [u8],
    },
    ReadRegister {
        register: u8,
        buf: &'a mut [u8],
    },
}

/// The single bus action performed by a [`Step`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Action {
    /// Transmit an address, register index or payload byte.
    Transmit(u8),
    RepeatedStart,
    /// Receive the next byte and `ACK` it.
    Ack,
    /// Receive the next byte and `NACK` it.
    Nack,
    Stop,
}

/// What happens to the transfer cursor on a [`Step`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Cursor {
    Hold,
    /// A payload byte was transmitted.
    Advance,
    /// A byte was received: store it at the cursor, then advance.
    Store,
}

/// The outcome of handling one bus event.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Step {
    pub next: State,
    pub action: Action,
    pub cursor: Cursor,
    /// Set when the transaction has reached a terminal state.
    pub outcome: Option<Result<(), Error>>,
}

/// Decide how to handle a bus event.
///
/// `address` is the 7-bit slave address, `handled` the number of payload
/// bytes transferred so far and `status` the (masked) status code reported
/// for the event.
#[must_use]
pub fn transition(state: State, address: u8, op: &Op<'_>, handled: usize, status: u8) -> Step {
    match state {
        // spurious interrupt; a STOP clears the interrupt flag.
        State::Idle => Step::to(State::Idle, Action::Stop),

        State::Start if status == START_TRANSMITTED => Step::to(
            State::SendSlaveAddressWrite,
            Action::Transmit(sla_w(address)),
        ),
        State::Start => Step::abort(Error::Start),

        State::SendSlaveAddressWrite if status == ADDR_WRITE_ACKED => match op {
            Op::Write { data } => Step::write_first(data),
            Op::WriteRegister { register, .. } | Op::ReadRegister { register, .. } => {
                Step::to(State::WriteRegisterByte, Action::Transmit(*register))
            }
            Op::None => Step::abort(Error::Sla),
        },
        State::SendSlaveAddressWrite => Step::abort(Error::Sla),

        State::WriteRegisterByte if status == TX_DATA_ACKED => match op {
            Op::WriteRegister { data, .. } => Step::write_first(data),
            Op::ReadRegister { buf, .. } if buf.is_empty() => Step::complete(),
            Op::ReadRegister { .. } => Step::to(State::RepeatedStart, Action::RepeatedStart),
            Op::Write { .. } | Op::None => Step::abort(Error::Write),
        },
        State::WriteRegisterByte => Step::abort(Error::Write),

        State::WriteData if status == TX_DATA_ACKED => {
            match op.tx_data().and_then(|data| data.get(handled)) {
                Some(&byte) => Step::to(State::WriteData, Action::Transmit(byte)).advance(),
                None => Step::complete(),
            }
        }
        State::WriteData => Step::abort(Error::Write),

        State::RepeatedStart if status == REPEATED_START_TRANSMITTED => Step::to(
            State::SendSlaveAddressRead,
            Action::Transmit(sla_r(address)),
        ),
        State::RepeatedStart => Step::abort(Error::RepeatedStart),

        State::SendSlaveAddressRead if status == ADDR_READ_ACKED => {
            Step::to(State::ReadData, arm_receive(op.len()))
        }
        State::SendSlaveAddressRead => Step::abort(Error::Sla),

        State::ReadData => {
            let remaining = op.len().saturating_sub(handled);
            // the last byte was armed with a NACK.
            let expected = if remaining > 1 {
                RX_DATA_ACKED
            } else {
                RX_DATA_NACKED
            };
            if remaining == 0 || status != expected {
                return Step::abort(Error::Read);
            }

            match remaining - 1 {
                0 => Step::complete().store(),
                left => Step::to(State::ReadData, arm_receive(left)).store(),
            }
        }
    }
}

/// Address byte with the write bit.
const fn sla_w(address: u8) -> u8 {
    (address & 0x7f) << 1
}

/// Address byte with the read bit.
const fn sla_r(address: u8) -> u8 {
    sla_w(address) | 0b1
}

/// Receive the next of `remaining` bytes, `NACK`ing it if it's the last.
const fn arm_receive(remaining: usize) -> Action {
    if remaining > 1 {
        Action::Ack
    } else {
        Action::Nack
    }
}

// === impl Op ===

impl Op<'_> {
    #[must_use]
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::None => None,
            Self::Write { .. } => Some(Operation::Write),
            Self::WriteRegister { .. } => Some(Operation::WriteRegister),
            Self::ReadRegister { .. } => Some(Operation::ReadRegister),
        }
    }

    /// The number of payload bytes to transfer.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Write { data } | Self::WriteRegister { data, .. } => data.len(),
            Self::ReadRegister { buf, .. } => buf.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn register(&self) -> Option<u8> {
        match self {
            Self::WriteRegister { register, .. } | Self::ReadRegister { register, .. } => {
                Some(*register)
            }
            Self::None | Self::Write { .. } => None,
        }
    }

    fn tx_data(&self) -> Option<&[u8]> {
        match self {
            Self::Write { data } | Self::WriteRegister { data, .. } => Some(*data),
            Self::None | Self::ReadRegister { .. } => None,
        }
    }
}

// === impl Step ===

impl Step {
    const fn to(next: State, action: Action) -> Self {
        Self {
            next,
            action,
            cursor: Cursor::Hold,
            outcome: None,
        }
    }

    const fn complete() -> Self {
        Self {
            next: State::Idle,
            action: Action::Stop,
            cursor: Cursor::Hold,
            outcome: Some(Ok(())),
        }
    }

    const fn abort(error: Error) -> Self {
        Self {
            next: State::Idle,
            action: Action::Stop,
            cursor: Cursor::Hold,
            outcome: Some(Err(error)),
        }
    }

    /// Send the first payload byte, or finish if there is no payload.
    fn write_first(data: &[u8]) -> Self {
        match data.first() {
            Some(&byte) => Self::to(State::WriteData, Action::Transmit(byte)).advance(),
            None => Self::complete(),
        }
    }

    const fn advance(self) -> Self {
        Self {
            cursor: Cursor::Advance,
            ..self
        }
    }

    const fn store(self) -> Self {
        Self {
            cursor: Cursor::Store,
            ..self
        }
    }

    /// Returns `true` if this step ends the transaction.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.next == State::Idle
    }
}
