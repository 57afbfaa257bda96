//! Interrupt handlers bound to caller-owned context.
//!
//! A handler pairs a callback with the data it needs. The controller never
//! owns that data: it keeps a [`Weak`] reference (or a `'static` one), so a
//! context dropped while its line is still registered turns later triggers
//! into no-ops instead of dangling accesses.

use alloc::sync::{Arc, Weak};
use core::fmt;

use super::interrupt::InterruptId;

type Thunk = dyn Fn(InterruptId) -> bool + Send + Sync;

/// A registered interrupt callback.
///
/// Cloning is cheap; clones share the same callback and context.
#[derive(Clone)]
pub struct InterruptHandler {
    thunk: Arc<Thunk>,
}

impl InterruptHandler {
    /// Bind `isr` to a context shared through an [`Arc`].
    ///
    /// Only a weak reference is kept. The caller must keep `context` alive
    /// for as long as the handler stays registered; once the last strong
    /// reference is gone, [`invoke`](Self::invoke) stops calling `isr`.
    ///
    /// Any mutable state in `T` is shared with interrupt context and needs
    /// atomics or an interrupt-safe lock.
    pub fn new<T>(isr: fn(InterruptId, &T), context: &Arc<T>) -> Self
    where
        T: Send + Sync + 'static,
    {
        let context: Weak<T> = Arc::downgrade(context);
        Self {
            thunk: Arc::new(move |id| match context.upgrade() {
                Some(ctx) => {
                    isr(id, &ctx);
                    true
                }
                None => false,
            }),
        }
    }

    /// Bind `isr` to a context that lives for the whole program.
    pub fn from_static<T>(isr: fn(InterruptId, &T), context: &'static T) -> Self
    where
        T: Sync + 'static,
    {
        Self {
            thunk: Arc::new(move |id| {
                isr(id, context);
                true
            }),
        }
    }

    /// A handler that needs no context.
    pub fn from_fn(isr: fn(InterruptId)) -> Self {
        Self {
            thunk: Arc::new(move |id| {
                isr(id);
                true
            }),
        }
    }

    /// Run the callback for line `id`.
    ///
    /// Returns `false` without calling anything if the context has been
    /// dropped.
    pub fn invoke(&self, id: InterruptId) -> bool {
        (self.thunk)(id)
    }

    /// Whether both handles refer to the same registration.
    pub fn same_as(&self, other: &InterruptHandler) -> bool {
        Arc::ptr_eq(&self.thunk, &other.thunk)
    }
}

impl fmt::Debug for InterruptHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterruptHandler")
            .field("thunk", &Arc::as_ptr(&self.thunk))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    struct Seen {
        last_id: AtomicU32,
        calls: AtomicUsize,
    }

    impl Seen {
        const fn new() -> Self {
            Self {
                last_id: AtomicU32::new(u32::MAX),
                calls: AtomicUsize::new(0),
            }
        }
    }

    fn record(id: InterruptId, seen: &Seen) {
        seen.last_id.store(id, Ordering::SeqCst);
        seen.calls.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn passes_id_and_context() {
        let seen = Arc::new(Seen::new());
        let handler = InterruptHandler::new(record, &seen);

        assert!(handler.invoke(7));
        assert_eq!(seen.last_id.load(Ordering::SeqCst), 7);
        assert_eq!(seen.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn does_not_keep_context_alive() {
        let seen = Arc::new(Seen::new());
        let handler = InterruptHandler::new(record, &seen);
        assert_eq!(Arc::strong_count(&seen), 1);

        drop(seen);
        assert!(!handler.invoke(1));
    }

    #[test]
    fn static_context() {
        static SEEN: Seen = Seen::new();
        let handler = InterruptHandler::from_static(record, &SEEN);

        assert!(handler.invoke(3));
        assert!(handler.invoke(3));
        assert_eq!(SEEN.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn clones_share_identity() {
        fn noop(_: InterruptId) {}

        let a = InterruptHandler::from_fn(noop);
        let b = a.clone();
        let c = InterruptHandler::from_fn(noop);
        assert!(a.same_as(&b));
        assert!(!a.same_as(&c));
    }
}
