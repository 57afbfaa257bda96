//! Controller Implementations
//!
//! Controllers that are not tied to one chip's register layout.
//!
//! # Available Controllers
//!
//! - [`soft`]: software-emulated controller (feature `soft`, on by default)

#[cfg(feature = "soft")]
pub mod soft;
