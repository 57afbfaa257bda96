//! Emulated interrupt masking for hosted builds.

use core::sync::atomic::{AtomicUsize, Ordering};

use crate::sync::irq::IrqControl;

/// Open critical sections across all threads.
static MASK_DEPTH: AtomicUsize = AtomicUsize::new(0);

/// [`IrqControl`] backed by an atomic counter instead of a CPU register.
///
/// Used when the crate is built for a host target, mostly under
/// `cargo test`. Nothing is actually masked. The counter is process-wide
/// while test threads run concurrently, so "enabled" means no thread is
/// inside a critical section. One thread leaving its section never
/// reports interrupts enabled while another is still inside its own.
pub struct HostIrq;

impl IrqControl for HostIrq {
    /// Whether no critical section was open on entry.
    type State = bool;

    fn disable() -> bool {
        MASK_DEPTH.fetch_add(1, Ordering::AcqRel) == 0
    }

    fn restore(_: bool) {
        MASK_DEPTH.fetch_sub(1, Ordering::AcqRel);
    }

    fn is_enabled() -> bool {
        MASK_DEPTH.load(Ordering::Acquire) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_sections_stay_masked_until_the_last_ends() {
        let outer = HostIrq::disable();
        let inner = HostIrq::disable();
        assert!(!inner);

        HostIrq::restore(outer);
        assert!(!HostIrq::is_enabled());

        HostIrq::restore(inner);
    }
}
