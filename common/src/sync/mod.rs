pub mod spinlock;
pub use spinlock::SpinLock;
pub mod irq;
pub use irq::IrqControl;
pub mod irq_spinlock;
pub use irq_spinlock::IrqSpinLock;
