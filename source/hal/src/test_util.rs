use crate::twi::{status, Bus, ClockDivisor, Controller};
use std::collections::VecDeque;

/// A bus action recorded by [`MockBus`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum BusEvent {
    Configure(ClockDivisor),
    Start,
    RepeatedStart,
    Stop,
    Write(u8),
    Read(u8),
    Ack,
    Nack,
}

/// A scripted [`Bus`].
///
/// By default, every action succeeds: the status reported after each action
/// is the "happy path" status for it (START transmitted, address ACKed, data
/// ACKed, and so on). Individual actions can be made to report a different
/// status with [`MockBus::fail_action`].
#[derive(Debug, Default)]
pub(crate) struct MockBus {
    events: Vec<BusEvent>,
    /// Bytes returned by `read_byte`, in order.
    rx: VecDeque<u8>,
    /// `(action index, status)` overrides.
    failures: Vec<(usize, u8)>,
    actions: usize,
    status: u8,
    /// The next `write_byte` is an address byte.
    expect_address: bool,
}

impl MockBus {
    pub(crate) fn new() -> Self {
        Self {
            status: status::NO_INFO,
            ..Self::default()
        }
    }

    /// Bytes the slave sends during a read.
    pub(crate) fn with_rx(mut self, bytes: &[u8]) -> Self {
        self.rx.extend(bytes.iter().copied());
        self
    }

    /// Report `status` after the `index`th bus action (counting from zero,
    /// excluding `configure`), instead of the happy-path status.
    pub(crate) fn fail_action(mut self, index: usize, status: u8) -> Self {
        self.failures.push((index, status));
        self
    }

    pub(crate) fn events(&self) -> &[BusEvent] {
        &self.events
    }

    /// The bytes passed to `write_byte`, in order.
    pub(crate) fn written(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|event| match event {
                BusEvent::Write(byte) => Some(*byte),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn count(&self, event: BusEvent) -> usize {
        self.events.iter().filter(|e| **e == event).count()
    }

    fn act(&mut self, event: BusEvent, status: u8) {
        self.events.push(event);
        self.status = self
            .failures
            .iter()
            .find(|(index, _)| *index == self.actions)
            .map(|(_, status)| *status)
            .unwrap_or(status);
        self.actions += 1;
    }
}

impl Bus for MockBus {
    fn configure(&mut self, divisor: ClockDivisor) {
        self.events.push(BusEvent::Configure(divisor));
    }

    fn send_start(&mut self) {
        self.expect_address = true;
        self.act(BusEvent::Start, status::START_TRANSMITTED);
    }

    fn send_repeated_start(&mut self) {
        self.expect_address = true;
        self.act(BusEvent::RepeatedStart, status::REPEATED_START_TRANSMITTED);
    }

    fn send_stop(&mut self) {
        self.act(BusEvent::Stop, status::NO_INFO);
    }

    fn write_byte(&mut self, byte: u8) {
        let status = if core::mem::take(&mut self.expect_address) {
            if byte & 1 == 1 {
                status::ADDR_READ_ACKED
            } else {
                status::ADDR_WRITE_ACKED
            }
        } else {
            status::TX_DATA_ACKED
        };
        self.act(BusEvent::Write(byte), status);
    }

    fn read_byte(&mut self) -> u8 {
        let byte = self.rx.pop_front().unwrap_or(0xFF);
        self.events.push(BusEvent::Read(byte));
        byte
    }

    fn send_ack(&mut self) {
        self.act(BusEvent::Ack, status::RX_DATA_ACKED);
    }

    fn send_nack(&mut self) {
        self.act(BusEvent::Nack, status::RX_DATA_NACKED);
    }

    fn status(&self) -> u8 {
        self.status
    }
}

/// Deliver interrupts until the controller goes idle, returning how many were
/// delivered.
pub(crate) fn run_to_completion(twi: &mut Controller<'_, MockBus>) -> usize {
    let mut interrupts = 0;
    while !twi.is_idle() {
        twi.handle_interrupt();
        interrupts += 1;
        assert!(
            interrupts < 1024,
            "transaction did not complete; this would hang forever --- seems bad!"
        );
    }
    interrupts
}

pub(crate) fn trace_init() {
    use tracing_subscriber::filter::{EnvFilter, LevelFilter};
    let env = std::env::var("RUST_LOG").unwrap_or_default();
    let builder = EnvFilter::builder().with_default_directive(LevelFilter::INFO.into());
    let filter = if env.is_empty() {
        builder.parse_lossy("hal=debug")
    } else {
        builder.parse_lossy(env)
    };

    let _res = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_thread_names(true)
        .without_time()
        .try_init();
}
