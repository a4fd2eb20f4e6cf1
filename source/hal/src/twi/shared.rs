use super::{Bus, Controller};
use crate::isr::Isr;
use core::cell::RefCell;
use critical_section::Mutex;

/// A [`Controller`] that can live in a `static`, shared between task code
/// and the TWI interrupt handler.
///
/// Every access happens inside a critical section, so task code can never
/// observe the controller half-way through an interrupt, and the interrupt
/// handler can never observe a half-submitted request.
///
/// ```rust,ignore
/// static TWI: SharedTwi<MyBus> = SharedTwi::new();
/// static RESULT: ResultCell = ResultCell::new();
///
/// // during initialization:
/// TWI.install(Controller::new(bus, divisor));
///
/// // in the TWI interrupt vector:
/// TWI.handle_interrupt();
///
/// // in task code:
/// TWI.with(|twi| twi.request_write(0x50, &DATA, &RESULT));
/// ```
pub struct SharedTwi<B: 'static> {
    controller: Mutex<RefCell<Option<Controller<'static, B>>>>,
}

impl<B: Bus> SharedTwi<B> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            controller: Mutex::new(RefCell::new(None)),
        }
    }

    /// Install and initialize `controller`, returning the previously
    /// installed controller, if any.
    pub fn install(&self, mut controller: Controller<'static, B>) -> Option<Controller<'static, B>> {
        controller.init();
        critical_section::with(|cs| self.controller.borrow_ref_mut(cs).replace(controller))
    }

    /// Run `f` with exclusive access to the controller.
    ///
    /// Returns `None` if no controller has been installed yet.
    pub fn with<R>(&self, f: impl FnOnce(&mut Controller<'static, B>) -> R) -> Option<R> {
        critical_section::with(|cs| self.controller.borrow_ref_mut(cs).as_mut().map(f))
    }

    /// Handle a TWI interrupt.
    pub fn handle_interrupt(&self) {
        let _isr = Isr::enter();
        critical_section::with(|cs| match self.controller.borrow_ref_mut(cs).as_mut() {
            Some(controller) => controller.handle_interrupt(),
            None => tracing::warn!("TWI interrupt before a controller was installed"),
        });
    }
}

impl<B: Bus> Default for SharedTwi<B> {
    fn default() -> Self {
        Self::new()
    }
}
