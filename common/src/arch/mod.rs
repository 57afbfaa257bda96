//! CPU interrupt masking for the build target.
//!
//! [`CpuIrq`] is the [`IrqControl`](crate::sync::IrqControl) implementation
//! for the architecture being compiled for. Hosted builds get an emulated
//! interrupt-enable flag so lock code behaves the same under `cargo test`.

cfg_if::cfg_if! {
    if #[cfg(target_arch = "arm")] {
        pub mod arm;
        pub use arm::irq::ArmIrq as CpuIrq;
    } else {
        pub mod host;
        pub use host::HostIrq as CpuIrq;
    }
}
