//! UART baud rate calculation and receive buffering.
use crate::settings::{ClockSettings, ConfigError, UartSettings};
use core::cell::RefCell;
use critical_section::Mutex;
use heapless::spsc::Queue;
use portable_atomic::{AtomicU32, Ordering};

/// Baud rate register setup.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BaudSetup {
    /// The 12-bit baud rate register value.
    pub ubrr: u16,
    /// Whether the double speed (`U2X`) bit must be set.
    pub double_speed: bool,
}

/// Bytes received by the UART, waiting to be read by task code.
///
/// The RX-complete interrupt handler calls [`RxBuffer::push`] with each
/// received byte, and task code drains the buffer with [`RxBuffer::read`].
/// The buffer holds at most `N - 1` bytes; bytes received while it is full
/// are dropped and counted (see [`RxBuffer::overruns`]).
pub struct RxBuffer<const N: usize> {
    queue: Mutex<RefCell<Queue<u8, N>>>,
    overruns: AtomicU32,
}

// === impl BaudSetup ===

impl BaudSetup {
    /// Allowed baud rate error, in percent.
    pub const TOLERANCE_PCT: u64 = 2;

    const MAX_UBRR: u64 = 0x0FFF;

    /// Compute the baud rate register value for `baud`.
    ///
    /// Normal speed is preferred. Double speed is used only if the closest
    /// normal speed divisor misses `baud` by more than
    /// [`Self::TOLERANCE_PCT`] percent.
    pub fn for_rate(cpu_hz: u32, baud: u32) -> Result<Self, ConfigError> {
        Self::with_samples(cpu_hz, baud, false)
            .or_else(|| Self::with_samples(cpu_hz, baud, true))
            .ok_or(ConfigError::BaudUnreachable { cpu_hz, baud })
    }

    pub fn from_settings(clock: &ClockSettings, uart: &UartSettings) -> Result<Self, ConfigError> {
        Self::for_rate(clock.cpu_hz, uart.baud)
    }

    fn with_samples(cpu_hz: u32, baud: u32, double_speed: bool) -> Option<Self> {
        let cpu = u64::from(cpu_hz);
        let baud = u64::from(baud);
        if baud == 0 {
            return None;
        }
        let samples = if double_speed { 8 } else { 16 };

        // round to the nearest divisor.
        let ubrr = ((cpu + samples / 2 * baud) / (samples * baud)).checked_sub(1)?;
        if ubrr > Self::MAX_UBRR {
            return None;
        }

        let divisor = samples * (ubrr + 1);
        let too_fast = 100 * cpu > divisor * (100 * baud + baud * Self::TOLERANCE_PCT);
        let too_slow = 100 * cpu < divisor * (100 * baud - baud * Self::TOLERANCE_PCT);
        if too_fast || too_slow {
            return None;
        }

        Some(Self {
            ubrr: ubrr as u16,
            double_speed,
        })
    }

    /// The baud rate actually produced by this setup.
    #[must_use]
    pub fn actual_baud(&self, cpu_hz: u32) -> u32 {
        let samples = if self.double_speed { 8 } else { 16 };
        cpu_hz / (samples * (u32::from(self.ubrr) + 1))
    }
}

// === impl RxBuffer ===

impl<const N: usize> RxBuffer<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            queue: Mutex::new(RefCell::new(Queue::new())),
            overruns: AtomicU32::new(0),
        }
    }

    /// Store a received byte. Called from the RX-complete interrupt.
    pub fn push(&self, byte: u8) {
        let stored = critical_section::with(|cs| self.queue.borrow_ref_mut(cs).enqueue(byte));
        if stored.is_err() {
            let overruns = self.overruns.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::debug!(overruns, "UART receive buffer full; dropped {byte:#x}");
        }
    }

    /// Move as many received bytes as fit into `buf`, returning how many
    /// were moved. Returns zero if nothing has been received.
    pub fn read(&self, buf: &mut [u8]) -> usize {
        critical_section::with(|cs| {
            let mut queue = self.queue.borrow_ref_mut(cs);
            let mut read = 0;
            for slot in buf.iter_mut() {
                match queue.dequeue() {
                    Some(byte) => *slot = byte,
                    None => break,
                }
                read += 1;
            }
            read
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.queue.borrow_ref(cs).len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of bytes dropped because the buffer was full.
    #[must_use]
    pub fn overruns(&self) -> u32 {
        self.overruns.load(Ordering::Relaxed)
    }
}

impl<const N: usize> Default for RxBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> core::fmt::Debug for RxBuffer<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RxBuffer")
            .field("len", &self.len())
            .field("capacity", &N.saturating_sub(1))
            .field("overruns", &self.overruns())
            .finish()
    }
}
