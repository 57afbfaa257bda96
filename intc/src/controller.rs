//! The handle firmware holds for one interrupt controller.
//!
//! [`Controller`] adds nothing to a driver's behaviour beyond the ordering
//! and argument checks every driver must agree on: `init` first and only
//! once, ids in range, and vector modes the controller class supports.
//! Calls that pass the checks go to the driver unchanged; calls that fail
//! them never reach it.

use alloc::sync::Arc;

use spin::Once;

use crate::hal::handler::InterruptHandler;
use crate::hal::interrupt::{InterruptController, InterruptError, InterruptId, VectorMode};

/// Handle to an interrupt controller.
///
/// `C` is the bound driver, either a concrete type or a boxed
/// `dyn InterruptController`.
///
/// # Example
///
/// ```
/// use intc::peripheral::soft::{SoftCommand, SoftConfig, SoftController, SoftResponse};
/// use intc::{Controller, InterruptController, InterruptError};
///
/// type DynIntc =
///     Box<dyn InterruptController<Command = SoftCommand, Response = SoftResponse> + Send + Sync>;
///
/// let intc: Controller<DynIntc> =
///     Controller::new(Box::new(SoftController::<8>::new(SoftConfig::platform_level())));
/// assert_eq!(intc.enable(0), Err(InterruptError::NotInitialized));
/// intc.init();
/// assert_eq!(intc.enable(8), Err(InterruptError::InvalidId(8)));
/// ```
pub struct Controller<C> {
    driver: C,
    init: Once<()>,
}

impl<C: InterruptController> Controller<C> {
    /// Wrap a driver. The controller starts uninitialized.
    pub const fn new(driver: C) -> Self {
        Self {
            driver,
            init: Once::new(),
        }
    }

    /// The bound driver.
    pub fn driver(&self) -> &C {
        &self.driver
    }

    /// Whether [`init`](Self::init) has completed.
    pub fn is_initialized(&self) -> bool {
        self.init.is_completed()
    }

    /// Run the driver's one-time setup.
    ///
    /// Only the first call reaches the driver; later calls return at once.
    pub fn init(&self) {
        self.init.call_once(|| self.driver.init());
    }

    fn ready(&self) -> Result<(), InterruptError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(InterruptError::NotInitialized)
        }
    }

    fn line(&self, id: InterruptId) -> Result<(), InterruptError> {
        self.ready()?;
        if id < self.driver.line_count() {
            Ok(())
        } else {
            Err(InterruptError::InvalidId(id))
        }
    }

    /// Bind `handler` to line `id`.
    pub fn register_handler(
        &self,
        id: InterruptId,
        handler: InterruptHandler,
    ) -> Result<(), InterruptError> {
        self.line(id)?;
        self.driver.register_handler(id, handler)
    }

    /// Bind `isr` to line `id` with a context shared through an [`Arc`].
    ///
    /// Keep `context` alive while the handler is registered; see
    /// [`InterruptHandler::new`].
    pub fn register<T>(
        &self,
        id: InterruptId,
        isr: fn(InterruptId, &T),
        context: &Arc<T>,
    ) -> Result<(), InterruptError>
    where
        T: Send + Sync + 'static,
    {
        self.register_handler(id, InterruptHandler::new(isr, context))
    }

    /// Bind `isr` to line `id` with a `'static` context.
    pub fn register_static<T: Sync + 'static>(
        &self,
        id: InterruptId,
        isr: fn(InterruptId, &T),
        context: &'static T,
    ) -> Result<(), InterruptError> {
        self.register_handler(id, InterruptHandler::from_static(isr, context))
    }

    /// Unmask line `id`.
    pub fn enable(&self, id: InterruptId) -> Result<(), InterruptError> {
        self.line(id)?;
        self.driver.enable(id)
    }

    /// Mask line `id`.
    pub fn disable(&self, id: InterruptId) -> Result<(), InterruptError> {
        self.line(id)?;
        self.driver.disable(id)
    }

    /// Select the vector mode of line `id`.
    pub fn vector_enable(&self, id: InterruptId, mode: VectorMode) -> Result<(), InterruptError> {
        self.line(id)?;
        if !self.driver.supported_modes().supports(mode) {
            return Err(InterruptError::NotSupported);
        }
        self.driver.vector_enable(id, mode)
    }

    /// Return line `id` to non-vectored dispatch.
    pub fn vector_disable(&self, id: InterruptId) -> Result<(), InterruptError> {
        self.line(id)?;
        self.driver.vector_disable(id)
    }

    /// Send a controller-specific command.
    pub fn command_request(&self, command: C::Command) -> Result<C::Response, InterruptError> {
        self.ready()?;
        self.driver.command_request(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::interrupt::VectorModes;
    use core::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls that reach the driver.
    #[derive(Default)]
    struct CountingDriver {
        inits: AtomicUsize,
        calls: AtomicUsize,
    }

    impl CountingDriver {
        fn hit(&self) -> Result<(), InterruptError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl InterruptController for CountingDriver {
        type Command = u32;
        type Response = u32;

        fn line_count(&self) -> u32 {
            4
        }

        fn supported_modes(&self) -> VectorModes {
            VectorModes::DIRECT
        }

        fn init(&self) {
            self.inits.fetch_add(1, Ordering::SeqCst);
        }

        fn register_handler(
            &self,
            _: InterruptId,
            _: InterruptHandler,
        ) -> Result<(), InterruptError> {
            self.hit()
        }

        fn enable(&self, _: InterruptId) -> Result<(), InterruptError> {
            self.hit()
        }

        fn disable(&self, _: InterruptId) -> Result<(), InterruptError> {
            self.hit()
        }

        fn vector_enable(&self, _: InterruptId, _: VectorMode) -> Result<(), InterruptError> {
            self.hit()
        }

        fn vector_disable(&self, _: InterruptId) -> Result<(), InterruptError> {
            self.hit()
        }

        fn command_request(&self, command: u32) -> Result<u32, InterruptError> {
            self.hit()?;
            Ok(command + 1)
        }
    }

    fn noop(_: InterruptId) {}

    #[test]
    fn nothing_reaches_driver_before_init() {
        let intc = Controller::new(CountingDriver::default());
        let not_init = Err(InterruptError::NotInitialized);

        assert_eq!(intc.register_handler(0, InterruptHandler::from_fn(noop)), not_init);
        assert_eq!(intc.enable(0), not_init);
        assert_eq!(intc.disable(0), not_init);
        assert_eq!(intc.vector_enable(0, VectorMode::Direct), not_init);
        assert_eq!(intc.vector_disable(0), not_init);
        assert_eq!(intc.command_request(1), Err(InterruptError::NotInitialized));
        assert_eq!(intc.driver().calls(), 0);
    }

    #[test]
    fn init_reaches_driver_once() {
        let intc = Controller::new(CountingDriver::default());
        assert!(!intc.is_initialized());

        intc.init();
        intc.init();
        assert!(intc.is_initialized());
        assert_eq!(intc.driver().inits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn range_and_mode_checked_before_driver() {
        let intc = Controller::new(CountingDriver::default());
        intc.init();

        assert_eq!(intc.enable(4), Err(InterruptError::InvalidId(4)));
        assert_eq!(
            intc.register_handler(9, InterruptHandler::from_fn(noop)),
            Err(InterruptError::InvalidId(9))
        );
        assert_eq!(
            intc.vector_enable(1, VectorMode::Vector),
            Err(InterruptError::NotSupported)
        );
        assert_eq!(intc.driver().calls(), 0);

        assert_eq!(intc.vector_enable(1, VectorMode::Direct), Ok(()));
        assert_eq!(intc.command_request(41), Ok(42));
        assert_eq!(intc.driver().calls(), 2);
    }
}
