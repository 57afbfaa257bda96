use core::marker::PhantomData;
use core::mem::ManuallyDrop;
use core::sync::atomic::{Ordering, compiler_fence};

use super::irq::IrqControl;
use super::spinlock::{SpinLock, SpinLockGuard};

/// IRQ-safe spinlock.
///
/// - Masks CPU interrupts before spinning
/// - Restores the saved interrupt state when the guard drops
///
/// Safe to take from both interrupt handlers and normal context, as long as
/// nothing holding it waits on a handler that needs it.
///
/// Not fair. Not reentrant.
pub struct IrqSpinLock<T, I: IrqControl> {
    inner: SpinLock<T>,
    _irq: PhantomData<I>,
}

// SAFETY: `I` is a marker selecting static functions and is never stored.
unsafe impl<T: Send, I: IrqControl> Send for IrqSpinLock<T, I> {}
unsafe impl<T: Send, I: IrqControl> Sync for IrqSpinLock<T, I> {}

impl<T, I: IrqControl> IrqSpinLock<T, I> {
    /// Create a new IRQ-safe spinlock.
    pub const fn new(data: T) -> Self {
        Self {
            inner: SpinLock::new(data),
            _irq: PhantomData,
        }
    }

    /// Acquire the lock with interrupts masked.
    pub fn lock(&self) -> IrqSpinLockGuard<'_, T, I> {
        let irq_state = I::disable();
        compiler_fence(Ordering::SeqCst);
        IrqSpinLockGuard {
            guard: ManuallyDrop::new(self.inner.lock()),
            irq_state,
        }
    }

    /// Run `f` with the lock held and interrupts masked.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.lock();
        f(&mut guard)
    }

    /// Mutable access without locking.
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }
}

/// Guard returned by [`IrqSpinLock::lock`].
///
/// Releases the lock, then restores the interrupt state.
pub struct IrqSpinLockGuard<'a, T, I: IrqControl> {
    guard: ManuallyDrop<SpinLockGuard<'a, T>>,
    irq_state: I::State,
}

impl<T, I: IrqControl> core::ops::Deref for IrqSpinLockGuard<'_, T, I> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl<T, I: IrqControl> core::ops::DerefMut for IrqSpinLockGuard<'_, T, I> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}

impl<T, I: IrqControl> Drop for IrqSpinLockGuard<'_, T, I> {
    fn drop(&mut self) {
        // Unlock before unmasking, or a pending IRQ could spin on us.
        // SAFETY: `guard` is not used after this point.
        unsafe { ManuallyDrop::drop(&mut self.guard) };
        compiler_fence(Ordering::SeqCst);
        I::restore(self.irq_state);
    }
}
