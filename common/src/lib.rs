//! Shared `no_std` support for interrupt controller drivers.
//!
//! - [`sync`]: spinlocks, including one that masks CPU interrupts while held
//! - [`arch`]: per-architecture CPU interrupt masking, re-exported as
//!   [`arch::CpuIrq`]

#![no_std]

pub mod arch;
pub mod sync;
