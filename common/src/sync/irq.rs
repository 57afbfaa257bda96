use core::fmt::Debug;

/// CPU interrupt masking.
///
/// Implemented once per architecture (see [`crate::arch`]) and used by
/// [`IrqSpinLock`](super::IrqSpinLock) to keep interrupt handlers off a
/// lock that normal code already holds on the same core.
pub trait IrqControl {
    /// Saved interrupt state.
    type State: Copy + Debug;

    /// Mask interrupts and return the previous state.
    fn disable() -> Self::State;

    /// Restore the state returned by a matching [`disable`](Self::disable).
    fn restore(state: Self::State);

    /// Whether interrupts are currently unmasked.
    fn is_enabled() -> bool;
}
