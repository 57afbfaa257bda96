//! Hardware Abstraction Layer - Platform-Independent Interrupt Contract
//!
//! Controller drivers implement [`interrupt::InterruptController`]; firmware
//! only ever names the trait, never a concrete driver.
//!
//! # Available Interfaces
//!
//! - [`interrupt`]: the controller contract, ids, vector modes, and errors
//! - [`handler`]: callbacks bound to a caller-owned context

pub mod handler;
pub mod interrupt;
