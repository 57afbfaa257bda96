//! Interrupt Controller Interface
//!
//! One contract for every interrupt controller a chip may carry
//! (core-local, platform-level, or a custom peripheral controller), so
//! firmware can register, enable, disable, and configure interrupt lines
//! without knowing which one is present.
//!
//! # Module Organization
//!
//! - [`hal`]: the contract itself: [`InterruptController`], ids, vector
//!   modes, errors, and typed [`InterruptHandler`]s
//! - [`controller`]: the [`Controller`] handle firmware holds; checks
//!   preconditions and forwards to the bound driver
//! - [`lines`]: a per-line state table drivers can build on
//! - [`peripheral`]: reusable controller implementations
//!
//! # Usage Example
//!
//! ```
//! use intc::peripheral::soft::{SoftConfig, SoftController};
//! use intc::{Controller, InterruptId};
//!
//! static INTC: Controller<SoftController<4>> =
//!     Controller::new(SoftController::new(SoftConfig::core_local()));
//!
//! fn on_timer(_id: InterruptId) {}
//!
//! INTC.init();
//! INTC.register_handler(2, intc::InterruptHandler::from_fn(on_timer))?;
//! INTC.enable(2)?;
//! # Ok::<(), intc::InterruptError>(())
//! ```

#![no_std]

extern crate alloc;

pub mod controller;
pub mod hal;
pub mod lines;
pub mod peripheral;

pub use controller::Controller;
pub use hal::handler::InterruptHandler;
pub use hal::interrupt::{
    InterruptController, InterruptError, InterruptId, STATUS_OK, VectorMode, VectorModes,
    status_code,
};
