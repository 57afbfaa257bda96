use crate::sync::irq::IrqControl;

/// IRQ mask bit in CPSR.
const CPSR_I_BIT: u32 = 1 << 7;

/// IRQ masking through the ARM CPSR `I` bit.
///
/// The saved state is `true` when IRQs were unmasked on entry, so
/// [`restore`](IrqControl::restore) only unmasks what it masked itself.
/// Nested critical sections therefore leave IRQs masked until the
/// outermost one ends.
pub struct ArmIrq;

impl IrqControl for ArmIrq {
    type State = bool;

    #[inline(always)]
    fn disable() -> bool {
        let cpsr: u32;
        // SAFETY: reads CPSR and sets the I bit. Not `nomem`: this must
        // stay ahead of the lock acquire that follows it.
        unsafe {
            core::arch::asm!(
                "mrs {0}, cpsr",
                "cpsid i",
                out(reg) cpsr,
                options(nostack)
            );
        }
        cpsr & CPSR_I_BIT == 0
    }

    #[inline(always)]
    fn restore(was_enabled: bool) {
        if was_enabled {
            // SAFETY: clears the I bit that `disable` set. Not `nomem`: this
            // must stay behind the lock release that precedes it.
            unsafe {
                core::arch::asm!("cpsie i", options(nostack));
            }
        }
    }

    #[inline(always)]
    fn is_enabled() -> bool {
        let cpsr: u32;
        // SAFETY: plain CPSR read.
        unsafe {
            core::arch::asm!("mrs {0}, cpsr", out(reg) cpsr, options(nomem, nostack));
        }
        cpsr & CPSR_I_BIT == 0
    }
}
