//! Software-emulated interrupt controller.
//!
//! [`SoftController`] implements the whole [`InterruptController`] contract
//! with no hardware behind it. Lines are triggered by calling
//! [`SoftController::trigger`] or [`SoftController::raise`], which makes it
//! the stand-in controller for hosted firmware builds and tests, and a
//! source of software interrupts on targets that need one.

use common::arch::CpuIrq;
use common::sync::IrqSpinLock;
use log::warn;

use crate::hal::handler::InterruptHandler;
use crate::hal::interrupt::{
    InterruptController, InterruptError, InterruptId, Priority, VectorMode, VectorModes,
};
use crate::lines::{Claim, LineTable, RegistrationPolicy};

/// Soft controller configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SoftConfig {
    /// Vector modes lines may be set to.
    pub modes: VectorModes,
    /// What a second registration on a line does.
    pub policy: RegistrationPolicy,
}

impl SoftConfig {
    /// Core-local controller: direct or vectored trap entry.
    pub const fn core_local() -> Self {
        Self {
            modes: VectorModes::DIRECT.union(VectorModes::VECTOR),
            policy: RegistrationPolicy::Reject,
        }
    }

    /// Platform-level controller: sources are routed, never vectored.
    pub const fn platform_level() -> Self {
        Self {
            modes: VectorModes::DIRECT,
            policy: RegistrationPolicy::Reject,
        }
    }

    /// Core-local controller with per-line selective and hardware vectoring.
    pub const fn selective_vectored() -> Self {
        Self {
            modes: VectorModes::all(),
            policy: RegistrationPolicy::Reject,
        }
    }

    /// Replace the supported vector modes.
    pub const fn with_modes(mut self, modes: VectorModes) -> Self {
        self.modes = modes;
        self
    }

    /// Replace the registration policy.
    pub const fn with_policy(mut self, policy: RegistrationPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Default for SoftConfig {
    fn default() -> Self {
        Self::core_local()
    }
}

/// Commands understood by [`SoftController::command_request`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SoftCommand {
    /// Remove the handler from a line and mask it.
    Unregister(InterruptId),
    /// Set a line's priority.
    SetPriority {
        /// Line to change.
        id: InterruptId,
        /// New priority.
        priority: Priority,
    },
    /// Read a line's priority.
    Priority(InterruptId),
    /// Only lines with a priority above this are dispatched by
    /// [`SoftController::trigger`] or [`SoftController::dispatch_next`].
    /// Zero admits every line.
    SetThreshold(Priority),
    /// Latch a line pending without dispatching it.
    Raise(InterruptId),
    /// Clear a line's pending latch.
    ClearPending(InterruptId),
    /// Read a line's pending latch.
    IsPending(InterruptId),
}

impl SoftCommand {
    /// Raw code of [`SoftCommand::Unregister`].
    pub const UNREGISTER: u32 = 0;
    /// Raw code of [`SoftCommand::SetPriority`].
    pub const SET_PRIORITY: u32 = 1;
    /// Raw code of [`SoftCommand::Priority`].
    pub const PRIORITY: u32 = 2;
    /// Raw code of [`SoftCommand::SetThreshold`].
    pub const SET_THRESHOLD: u32 = 3;
    /// Raw code of [`SoftCommand::Raise`].
    pub const RAISE: u32 = 4;
    /// Raw code of [`SoftCommand::ClearPending`].
    pub const CLEAR_PENDING: u32 = 5;
    /// Raw code of [`SoftCommand::IsPending`].
    pub const IS_PENDING: u32 = 6;

    /// Decode a numeric command.
    ///
    /// `arg0` is the line id (or threshold), `arg1` the priority. Unknown
    /// codes and priorities that do not fit [`Priority`] are
    /// [`InterruptError::NotSupported`].
    pub fn from_raw(code: u32, arg0: u32, arg1: u32) -> Result<Self, InterruptError> {
        let priority = |raw: u32| Priority::try_from(raw).map_err(|_| InterruptError::NotSupported);
        Ok(match code {
            Self::UNREGISTER => SoftCommand::Unregister(arg0),
            Self::SET_PRIORITY => SoftCommand::SetPriority {
                id: arg0,
                priority: priority(arg1)?,
            },
            Self::PRIORITY => SoftCommand::Priority(arg0),
            Self::SET_THRESHOLD => SoftCommand::SetThreshold(priority(arg0)?),
            Self::RAISE => SoftCommand::Raise(arg0),
            Self::CLEAR_PENDING => SoftCommand::ClearPending(arg0),
            Self::IS_PENDING => SoftCommand::IsPending(arg0),
            _ => return Err(InterruptError::NotSupported),
        })
    }
}

/// Replies to [`SoftCommand`]s.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SoftResponse {
    /// The command took effect.
    Done,
    /// Answer to [`SoftCommand::Priority`].
    Priority(Priority),
    /// Answer to [`SoftCommand::IsPending`].
    Pending(bool),
}

/// What a trigger did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The bound handler ran.
    Handled,
    /// The line is masked; it stays pending until re-enabled and dispatched.
    Masked,
    /// The line's priority does not exceed the threshold; it stays pending
    /// until the threshold drops below it and it is dispatched.
    Deferred,
    /// The line is unmasked but nothing is registered on it.
    Spurious,
    /// The handler's context has been dropped, so nothing ran.
    ContextDropped,
}

/// Software interrupt controller with `N` lines.
///
/// All operations, including [`trigger`](Self::trigger), may be called
/// from inside a handler: handlers run with the controller unlocked.
pub struct SoftController<const N: usize> {
    config: SoftConfig,
    lines: IrqSpinLock<LineTable<N>, CpuIrq>,
}

impl<const N: usize> SoftController<N> {
    /// Create an uninitialized controller.
    pub const fn new(config: SoftConfig) -> Self {
        Self {
            config,
            lines: IrqSpinLock::new(LineTable::new(config.policy)),
        }
    }

    /// Configuration in force.
    pub const fn config(&self) -> &SoftConfig {
        &self.config
    }

    /// Signal line `id` and dispatch it now if it is unmasked and above the
    /// threshold.
    ///
    /// The handler runs after the lock is released. A trigger claimed
    /// before a concurrent [`disable`](InterruptController::disable) takes
    /// the lock is already in flight, and its handler may start after that
    /// `disable` returns. On a single core with the trigger raised from
    /// interrupt context this cannot happen.
    pub fn trigger(&self, id: InterruptId) -> Result<TriggerOutcome, InterruptError> {
        let claim = self.lines.with(|lines| {
            lines.raise(id)?;
            lines.claim(id)
        })?;
        Ok(Self::run(id, claim))
    }

    /// Latch line `id` pending without dispatching.
    pub fn raise(&self, id: InterruptId) -> Result<(), InterruptError> {
        self.lines.with(|lines| lines.raise(id))
    }

    /// Lowest-numbered line ready for dispatch.
    pub fn next_pending(&self) -> Option<InterruptId> {
        self.lines.with(|lines| lines.next_pending())
    }

    /// Dispatch the next ready line. Returns `false` if none was ready.
    pub fn dispatch_next(&self) -> bool {
        let claimed = self.lines.with(|lines| {
            let id = lines.next_pending()?;
            lines.claim(id).ok().map(|claim| (id, claim))
        });
        match claimed {
            Some((id, claim)) => {
                Self::run(id, claim);
                true
            }
            None => false,
        }
    }

    /// Dispatch ready lines until none are left, and return how many ran.
    ///
    /// Stops after `N` dispatches so a handler that keeps raising its own
    /// line cannot hold the loop forever.
    pub fn dispatch_all(&self) -> usize {
        let mut dispatched = 0;
        while dispatched < N && self.dispatch_next() {
            dispatched += 1;
        }
        dispatched
    }

    /// Whether line `id` is unmasked.
    pub fn is_enabled(&self, id: InterruptId) -> Result<bool, InterruptError> {
        self.lines.with(|lines| lines.is_enabled(id))
    }

    /// Whether line `id` is latched pending.
    pub fn is_pending(&self, id: InterruptId) -> Result<bool, InterruptError> {
        self.lines.with(|lines| lines.is_pending(id))
    }

    /// Whether a handler is bound to line `id`.
    pub fn is_registered(&self, id: InterruptId) -> Result<bool, InterruptError> {
        self.lines.with(|lines| Ok(lines.handler(id)?.is_some()))
    }

    /// Vector mode of line `id`; `None` when non-vectored.
    pub fn vector_mode(&self, id: InterruptId) -> Result<Option<VectorMode>, InterruptError> {
        self.lines.with(|lines| lines.vector_mode(id))
    }

    fn run(id: InterruptId, claim: Claim) -> TriggerOutcome {
        match claim {
            Claim::Masked => TriggerOutcome::Masked,
            Claim::Deferred => TriggerOutcome::Deferred,
            Claim::Spurious => {
                warn!("intc: spurious interrupt on line {}", id);
                TriggerOutcome::Spurious
            }
            Claim::Run(handler) => {
                if handler.invoke(id) {
                    TriggerOutcome::Handled
                } else {
                    warn!("intc: handler context for line {} was dropped", id);
                    TriggerOutcome::ContextDropped
                }
            }
        }
    }
}

impl<const N: usize> InterruptController for SoftController<N> {
    type Command = SoftCommand;
    type Response = SoftResponse;

    fn line_count(&self) -> u32 {
        N as u32
    }

    fn supported_modes(&self) -> VectorModes {
        self.config.modes
    }

    fn init(&self) {
        self.lines.with(|lines| lines.reset());
    }

    fn register_handler(
        &self,
        id: InterruptId,
        handler: InterruptHandler,
    ) -> Result<(), InterruptError> {
        self.lines.with(|lines| lines.register(id, handler))
    }

    fn enable(&self, id: InterruptId) -> Result<(), InterruptError> {
        self.lines.with(|lines| lines.enable(id))
    }

    fn disable(&self, id: InterruptId) -> Result<(), InterruptError> {
        self.lines.with(|lines| lines.disable(id))
    }

    fn vector_enable(&self, id: InterruptId, mode: VectorMode) -> Result<(), InterruptError> {
        if !self.config.modes.supports(mode) {
            return Err(InterruptError::NotSupported);
        }
        self.lines.with(|lines| lines.set_vector_mode(id, mode))
    }

    fn vector_disable(&self, id: InterruptId) -> Result<(), InterruptError> {
        self.lines.with(|lines| lines.clear_vector_mode(id))
    }

    fn command_request(&self, command: SoftCommand) -> Result<SoftResponse, InterruptError> {
        self.lines.with(|lines| {
            Ok(match command {
                SoftCommand::Unregister(id) => {
                    lines.unregister(id)?;
                    SoftResponse::Done
                }
                SoftCommand::SetPriority { id, priority } => {
                    lines.set_priority(id, priority)?;
                    SoftResponse::Done
                }
                SoftCommand::Priority(id) => SoftResponse::Priority(lines.priority(id)?),
                SoftCommand::SetThreshold(threshold) => {
                    lines.set_threshold(threshold)?;
                    SoftResponse::Done
                }
                SoftCommand::Raise(id) => {
                    lines.raise(id)?;
                    SoftResponse::Done
                }
                SoftCommand::ClearPending(id) => {
                    lines.clear_pending(id)?;
                    SoftResponse::Done
                }
                SoftCommand::IsPending(id) => SoftResponse::Pending(lines.is_pending(id)?),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicUsize, Ordering};

    fn ready<const N: usize>(config: SoftConfig) -> SoftController<N> {
        let intc = SoftController::new(config);
        intc.init();
        intc
    }

    fn count(_: InterruptId, hits: &AtomicUsize) {
        hits.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn masked_trigger_runs_after_reenable() {
        let intc: SoftController<4> = ready(SoftConfig::default());
        let hits = Arc::new(AtomicUsize::new(0));
        intc.register_handler(1, InterruptHandler::new(count, &hits)).unwrap();

        assert_eq!(intc.trigger(1), Ok(TriggerOutcome::Masked));
        assert_eq!(intc.is_pending(1), Ok(true));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        intc.enable(1).unwrap();
        assert_eq!(intc.dispatch_all(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(intc.is_pending(1), Ok(false));
        assert!(!intc.dispatch_next());
    }

    #[test]
    fn enabled_line_without_handler_is_spurious() {
        let intc: SoftController<4> = ready(SoftConfig::default());
        intc.enable(0).unwrap();
        assert_eq!(intc.trigger(0), Ok(TriggerOutcome::Spurious));
        assert_eq!(intc.is_pending(0), Ok(false));
    }

    #[test]
    fn dropped_context_is_reported() {
        let intc: SoftController<2> = ready(SoftConfig::default());
        let hits = Arc::new(AtomicUsize::new(0));
        intc.register_handler(0, InterruptHandler::new(count, &hits)).unwrap();
        intc.enable(0).unwrap();
        drop(hits);

        assert_eq!(intc.trigger(0), Ok(TriggerOutcome::ContextDropped));
    }

    #[test]
    fn unsupported_vector_mode() {
        let intc: SoftController<2> = ready(SoftConfig::platform_level());
        assert_eq!(
            intc.vector_enable(0, VectorMode::Vector),
            Err(InterruptError::NotSupported)
        );
        assert_eq!(intc.vector_mode(0), Ok(None));
        assert_eq!(intc.vector_enable(0, VectorMode::Direct), Ok(()));
    }

    #[test]
    fn commands() {
        let intc: SoftController<4> = ready(SoftConfig::default());
        intc.register_handler(2, InterruptHandler::from_fn(|_| {})).unwrap();

        assert_eq!(
            intc.command_request(SoftCommand::SetPriority { id: 2, priority: 7 }),
            Ok(SoftResponse::Done)
        );
        assert_eq!(
            intc.command_request(SoftCommand::Priority(2)),
            Ok(SoftResponse::Priority(7))
        );
        assert_eq!(
            intc.command_request(SoftCommand::Raise(2)),
            Ok(SoftResponse::Done)
        );
        assert_eq!(
            intc.command_request(SoftCommand::IsPending(2)),
            Ok(SoftResponse::Pending(true))
        );
        assert_eq!(
            intc.command_request(SoftCommand::ClearPending(2)),
            Ok(SoftResponse::Done)
        );
        assert_eq!(intc.is_pending(2), Ok(false));

        assert_eq!(
            intc.command_request(SoftCommand::Unregister(2)),
            Ok(SoftResponse::Done)
        );
        assert_eq!(intc.is_registered(2), Ok(false));
        assert_eq!(
            intc.command_request(SoftCommand::Priority(4)),
            Err(InterruptError::InvalidId(4))
        );
    }

    #[test]
    fn threshold_filters_dispatch() {
        let intc: SoftController<4> = ready(SoftConfig::default());
        for id in 0..4 {
            intc.enable(id).unwrap();
        }
        intc.command_request(SoftCommand::SetPriority { id: 3, priority: 4 }).unwrap();
        intc.command_request(SoftCommand::SetThreshold(1)).unwrap();
        intc.raise(0).unwrap();
        intc.raise(3).unwrap();

        assert_eq!(intc.next_pending(), Some(3));
        assert!(intc.dispatch_next());
        assert_eq!(intc.next_pending(), None);
        assert_eq!(intc.is_pending(0), Ok(true));
    }

    #[test]
    fn trigger_below_threshold_stays_pending() {
        let intc: SoftController<2> = ready(SoftConfig::default());
        let hits = Arc::new(AtomicUsize::new(0));
        intc.register_handler(0, InterruptHandler::new(count, &hits)).unwrap();
        intc.enable(0).unwrap();
        intc.command_request(SoftCommand::SetThreshold(7)).unwrap();

        assert_eq!(intc.trigger(0), Ok(TriggerOutcome::Deferred));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(intc.is_pending(0), Ok(true));
        assert_eq!(intc.next_pending(), None);

        intc.command_request(SoftCommand::SetPriority { id: 0, priority: 8 }).unwrap();
        assert_eq!(intc.dispatch_all(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn raw_commands_decode() {
        assert_eq!(
            SoftCommand::from_raw(SoftCommand::SET_PRIORITY, 3, 9),
            Ok(SoftCommand::SetPriority { id: 3, priority: 9 })
        );
        assert_eq!(
            SoftCommand::from_raw(SoftCommand::IS_PENDING, 1, 0),
            Ok(SoftCommand::IsPending(1))
        );
        assert_eq!(
            SoftCommand::from_raw(SoftCommand::SET_THRESHOLD, 300, 0),
            Err(InterruptError::NotSupported)
        );
        assert_eq!(SoftCommand::from_raw(99, 0, 0), Err(InterruptError::NotSupported));
    }

    #[test]
    fn config_builders() {
        let config = SoftConfig::platform_level()
            .with_modes(VectorModes::DIRECT | VectorModes::HARDWARE_VECTOR)
            .with_policy(RegistrationPolicy::Replace);
        let intc: SoftController<1> = ready(config);

        assert!(intc.supported_modes().supports(VectorMode::HardwareVector));
        intc.register_handler(0, InterruptHandler::from_fn(|_| {})).unwrap();
        intc.register_handler(0, InterruptHandler::from_fn(|_| {})).unwrap();
        assert_eq!(intc.line_count(), 1);
    }
}
