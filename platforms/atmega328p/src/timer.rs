//! Timer/Counter0 as the scheduler tick source.
use crate::mmio::{Mmio, Reg};
use hal::tick::TickSetup;

pub const TCCR0A: Reg = Reg(0x44);
pub const TCCR0B: Reg = Reg(0x45);
pub const TCNT0: Reg = Reg(0x46);
pub const OCR0A: Reg = Reg(0x47);
pub const TIMSK0: Reg = Reg(0x6E);

/// TCCR0A: clear timer on compare match
pub const WGM01: u8 = 1 << 1;
/// TIMSK0: compare match A interrupt enable
pub const OCIE0A: u8 = 1 << 1;

/// Timer0 in clear-timer-on-compare mode.
///
/// Once started, the `TIMER0_COMPA` interrupt fires once per tick; its
/// handler should call [`Ticker::on_interrupt`](hal::tick::Ticker::on_interrupt).
#[derive(Debug)]
pub struct Timer0<M> {
    mmio: M,
    setup: TickSetup,
}

impl<M: Mmio> Timer0<M> {
    #[must_use]
    pub fn new(mmio: M, setup: TickSetup) -> Self {
        Self { mmio, setup }
    }

    /// Start generating tick interrupts.
    pub fn start(&mut self) {
        self.mmio.write(TCCR0A, WGM01);
        self.mmio.write(OCR0A, self.setup.compare);
        self.mmio.write(TCNT0, 0);
        self.mmio.write(TIMSK0, OCIE0A);
        // selecting a clock source starts the counter.
        self.mmio.write(TCCR0B, self.setup.prescaler.clock_select());
        tracing::debug!(setup = ?self.setup, "tick timer started");
    }

    /// Stop the counter and disable its interrupt.
    pub fn stop(&mut self) {
        self.mmio.write(TCCR0B, 0);
        self.mmio.write(TIMSK0, 0);
    }

    #[must_use]
    pub fn setup(&self) -> TickSetup {
        self.setup
    }
}
