//! Per-line interrupt state.
//!
//! [`LineTable`] tracks what every line of a controller is doing: the bound
//! handler, mask, vector mode, pending latch, and priority. Drivers keep
//! one behind an interrupt-safe lock and mirror changes into hardware; the
//! table takes care of the ordering and range rules so each driver does not
//! have to.
//!
//! Per line:
//!
//! ```text
//! Unregistered --register--> Disabled <--enable/disable--> Enabled
//!      ^                         |                            |
//!      +---------unregister------+----------------------------+
//! ```
//!
//! The vector mode sits beside that, set and cleared on its own.

use log::{debug, info};

use crate::hal::handler::InterruptHandler;
use crate::hal::interrupt::{InterruptError, InterruptId, Priority, VectorMode};

/// What happens when a handler is registered on a line that has one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RegistrationPolicy {
    /// Fail with [`InterruptError::AlreadyRegistered`].
    #[default]
    Reject,
    /// Replace the old handler.
    Replace,
}

/// Registration and mask state of a line.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LineState {
    /// No handler bound.
    Unregistered,
    /// Handler bound, line masked.
    Disabled,
    /// Handler bound, line unmasked.
    Enabled,
}

/// Result of [`LineTable::claim`].
#[derive(Debug, Clone)]
pub enum Claim {
    /// The line is masked; its pending latch is left set.
    Masked,
    /// The line is unmasked but its priority does not exceed the
    /// threshold; its pending latch is left set.
    Deferred,
    /// Run this handler. The pending latch has been cleared.
    Run(InterruptHandler),
    /// The line is unmasked but has no handler. The pending latch has been
    /// cleared.
    Spurious,
}

#[derive(Debug, Clone)]
struct Line {
    handler: Option<InterruptHandler>,
    enabled: bool,
    mode: Option<VectorMode>,
    pending: bool,
    priority: Priority,
}

impl Line {
    const fn new() -> Self {
        Self {
            handler: None,
            enabled: false,
            mode: None,
            pending: false,
            priority: 0,
        }
    }

    fn above(&self, threshold: Priority) -> bool {
        threshold == 0 || self.priority > threshold
    }
}

/// State of `N` interrupt lines.
///
/// Every mutating operation fails with [`InterruptError::NotInitialized`]
/// until [`reset`](Self::reset) has run, and with
/// [`InterruptError::InvalidId`] for ids `>= N`. Failed operations change
/// nothing.
#[derive(Debug)]
pub struct LineTable<const N: usize> {
    lines: [Line; N],
    policy: RegistrationPolicy,
    threshold: Priority,
    ready: bool,
}

impl<const N: usize> LineTable<N> {
    /// Create a table with every line unregistered and masked.
    pub const fn new(policy: RegistrationPolicy) -> Self {
        Self {
            lines: [const { Line::new() }; N],
            policy,
            threshold: 0,
            ready: false,
        }
    }

    /// Number of lines.
    pub const fn len(&self) -> usize {
        N
    }

    /// Whether the table has no lines at all.
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Re-registration policy in force.
    pub const fn policy(&self) -> RegistrationPolicy {
        self.policy
    }

    /// Whether [`reset`](Self::reset) has run.
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    /// Put every line back to its initial state and accept operations.
    ///
    /// Masks all lines, clears pending latches and vector modes, drops
    /// handlers, and zeroes priorities and the threshold.
    pub fn reset(&mut self) {
        for line in self.lines.iter_mut() {
            *line = Line::new();
        }
        self.threshold = 0;
        self.ready = true;
        info!("intc: {} lines masked and cleared", N);
    }

    fn line(&self, id: InterruptId) -> Result<&Line, InterruptError> {
        if !self.ready {
            return Err(InterruptError::NotInitialized);
        }
        self.lines
            .get(id as usize)
            .ok_or(InterruptError::InvalidId(id))
    }

    fn line_mut(&mut self, id: InterruptId) -> Result<&mut Line, InterruptError> {
        if !self.ready {
            return Err(InterruptError::NotInitialized);
        }
        self.lines
            .get_mut(id as usize)
            .ok_or(InterruptError::InvalidId(id))
    }

    /// Bind `handler` to `id`, subject to the [`RegistrationPolicy`].
    pub fn register(
        &mut self,
        id: InterruptId,
        handler: InterruptHandler,
    ) -> Result<(), InterruptError> {
        let policy = self.policy;
        let line = self.line_mut(id)?;
        if line.handler.is_some() && policy == RegistrationPolicy::Reject {
            return Err(InterruptError::AlreadyRegistered(id));
        }
        line.handler = Some(handler);
        debug!("intc: handler registered on line {}", id);
        Ok(())
    }

    /// Remove the handler from `id` and mask the line.
    ///
    /// Returns the removed handler, if there was one. The vector mode and
    /// pending latch are kept.
    pub fn unregister(
        &mut self,
        id: InterruptId,
    ) -> Result<Option<InterruptHandler>, InterruptError> {
        let line = self.line_mut(id)?;
        line.enabled = false;
        let old = line.handler.take();
        if old.is_some() {
            debug!("intc: handler removed from line {}", id);
        }
        Ok(old)
    }

    /// Unmask `id`. A handler is not required.
    pub fn enable(&mut self, id: InterruptId) -> Result<(), InterruptError> {
        self.line_mut(id)?.enabled = true;
        Ok(())
    }

    /// Mask `id`. The handler stays bound.
    pub fn disable(&mut self, id: InterruptId) -> Result<(), InterruptError> {
        self.line_mut(id)?.enabled = false;
        Ok(())
    }

    /// Set the vector mode of `id`.
    pub fn set_vector_mode(
        &mut self,
        id: InterruptId,
        mode: VectorMode,
    ) -> Result<(), InterruptError> {
        self.line_mut(id)?.mode = Some(mode);
        debug!("intc: line {} vectored as {:?}", id, mode);
        Ok(())
    }

    /// Clear the vector mode of `id`.
    pub fn clear_vector_mode(&mut self, id: InterruptId) -> Result<(), InterruptError> {
        self.line_mut(id)?.mode = None;
        Ok(())
    }

    /// Latch `id` as pending.
    pub fn raise(&mut self, id: InterruptId) -> Result<(), InterruptError> {
        self.line_mut(id)?.pending = true;
        Ok(())
    }

    /// Clear the pending latch of `id`.
    pub fn clear_pending(&mut self, id: InterruptId) -> Result<(), InterruptError> {
        self.line_mut(id)?.pending = false;
        Ok(())
    }

    /// Set the priority of `id`.
    pub fn set_priority(
        &mut self,
        id: InterruptId,
        priority: Priority,
    ) -> Result<(), InterruptError> {
        self.line_mut(id)?.priority = priority;
        Ok(())
    }

    /// Set the threshold lines must exceed to be picked by
    /// [`next_pending`](Self::next_pending) or run by
    /// [`claim`](Self::claim).
    ///
    /// Threshold 0 admits every line.
    pub fn set_threshold(&mut self, threshold: Priority) -> Result<(), InterruptError> {
        if !self.ready {
            return Err(InterruptError::NotInitialized);
        }
        self.threshold = threshold;
        Ok(())
    }

    /// Current threshold.
    pub fn threshold(&self) -> Priority {
        self.threshold
    }

    /// Take the line for dispatch after a trigger.
    ///
    /// A masked line, or one whose priority does not exceed the threshold,
    /// keeps its pending latch so the trigger is serviced once the line
    /// becomes eligible again.
    pub fn claim(&mut self, id: InterruptId) -> Result<Claim, InterruptError> {
        let threshold = self.threshold;
        let line = self.line_mut(id)?;
        if !line.enabled {
            return Ok(Claim::Masked);
        }
        if !line.above(threshold) {
            return Ok(Claim::Deferred);
        }
        line.pending = false;
        Ok(match &line.handler {
            Some(handler) => Claim::Run(handler.clone()),
            None => Claim::Spurious,
        })
    }

    /// Lowest-numbered line that is pending, unmasked, and above the
    /// threshold.
    pub fn next_pending(&self) -> Option<InterruptId> {
        if !self.ready {
            return None;
        }
        let threshold = self.threshold;
        self.lines
            .iter()
            .position(|line| line.pending && line.enabled && line.above(threshold))
            .map(|index| index as InterruptId)
    }

    /// Registration and mask state of `id`.
    pub fn state(&self, id: InterruptId) -> Result<LineState, InterruptError> {
        let line = self.line(id)?;
        Ok(match (&line.handler, line.enabled) {
            (None, _) => LineState::Unregistered,
            (Some(_), false) => LineState::Disabled,
            (Some(_), true) => LineState::Enabled,
        })
    }

    /// Whether `id` is unmasked.
    pub fn is_enabled(&self, id: InterruptId) -> Result<bool, InterruptError> {
        Ok(self.line(id)?.enabled)
    }

    /// Whether `id` is latched pending.
    pub fn is_pending(&self, id: InterruptId) -> Result<bool, InterruptError> {
        Ok(self.line(id)?.pending)
    }

    /// Vector mode of `id`, `None` when non-vectored.
    pub fn vector_mode(&self, id: InterruptId) -> Result<Option<VectorMode>, InterruptError> {
        Ok(self.line(id)?.mode)
    }

    /// Priority of `id`.
    pub fn priority(&self, id: InterruptId) -> Result<Priority, InterruptError> {
        Ok(self.line(id)?.priority)
    }

    /// Handler bound to `id`.
    pub fn handler(&self, id: InterruptId) -> Result<Option<&InterruptHandler>, InterruptError> {
        Ok(self.line(id)?.handler.as_ref())
    }
}
