//! Interrupt Controller Hardware Abstraction Layer.
//!
//! This module defines the platform-independent contract every interrupt
//! controller driver implements, plus the types that flow through it.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::fmt;

use bitflags::bitflags;

use super::handler::InterruptHandler;

/// Interrupt source number within one controller's namespace.
///
/// Which peripheral an id maps to is controller-specific.
pub type InterruptId = u32;

/// Interrupt priority level used by controller commands.
///
/// Higher values indicate higher priority.
pub type Priority = u8;

/// Status value reported for a successful operation.
pub const STATUS_OK: i32 = 0;

/// How control reaches a handler when its line triggers.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VectorMode {
    /// All lines share one trap entry.
    Direct = 0,
    /// Each line jumps through a vector table entry.
    Vector = 1,
    /// Software chooses per line whether to vector.
    SelectiveVector = 2,
    /// Hardware selects the vector table entry.
    HardwareVector = 3,
}

impl VectorMode {
    /// The capability bit for this mode.
    pub const fn as_set(self) -> VectorModes {
        match self {
            VectorMode::Direct => VectorModes::DIRECT,
            VectorMode::Vector => VectorModes::VECTOR,
            VectorMode::SelectiveVector => VectorModes::SELECTIVE_VECTOR,
            VectorMode::HardwareVector => VectorModes::HARDWARE_VECTOR,
        }
    }
}

impl TryFrom<u32> for VectorMode {
    type Error = InterruptError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(VectorMode::Direct),
            1 => Ok(VectorMode::Vector),
            2 => Ok(VectorMode::SelectiveVector),
            3 => Ok(VectorMode::HardwareVector),
            _ => Err(InterruptError::NotSupported),
        }
    }
}

bitflags! {
    /// Set of [`VectorMode`]s a controller class can be configured for.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct VectorModes: u8 {
        /// [`VectorMode::Direct`].
        const DIRECT = 1 << 0;
        /// [`VectorMode::Vector`].
        const VECTOR = 1 << 1;
        /// [`VectorMode::SelectiveVector`].
        const SELECTIVE_VECTOR = 1 << 2;
        /// [`VectorMode::HardwareVector`].
        const HARDWARE_VECTOR = 1 << 3;
    }
}

impl VectorModes {
    /// Whether `mode` is in the set.
    pub const fn supports(self, mode: VectorMode) -> bool {
        self.contains(mode.as_set())
    }
}

impl From<VectorMode> for VectorModes {
    fn from(mode: VectorMode) -> Self {
        mode.as_set()
    }
}

/// Failure kinds shared by every controller operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InterruptError {
    /// The id is outside the controller's range.
    InvalidId(InterruptId),
    /// A handler is already bound and the controller does not overwrite.
    AlreadyRegistered(InterruptId),
    /// The vector mode or command is not available on this controller.
    NotSupported,
    /// The controller has not been initialized.
    NotInitialized,
}

impl InterruptError {
    /// Signed status code for firmware that reports C-style statuses.
    ///
    /// Never equal to [`STATUS_OK`].
    pub const fn code(&self) -> i32 {
        match self {
            InterruptError::InvalidId(_) => -1,
            InterruptError::AlreadyRegistered(_) => -2,
            InterruptError::NotSupported => -3,
            InterruptError::NotInitialized => -4,
        }
    }
}

impl fmt::Display for InterruptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterruptError::InvalidId(id) => write!(f, "interrupt id {id} out of range"),
            InterruptError::AlreadyRegistered(id) => {
                write!(f, "interrupt {id} already has a handler")
            }
            InterruptError::NotSupported => f.write_str("operation not supported by controller"),
            InterruptError::NotInitialized => f.write_str("interrupt controller not initialized"),
        }
    }
}

impl core::error::Error for InterruptError {}

/// Collapse an operation result into a signed status.
pub fn status_code<T>(result: &Result<T, InterruptError>) -> i32 {
    match result {
        Ok(_) => STATUS_OK,
        Err(err) => err.code(),
    }
}

/// Interrupt controller contract.
///
/// One implementation per controller variant. Operations take `&self`
/// because a handler may run, and call back in, while normal code holds
/// the controller; implementations keep their state behind an
/// interrupt-safe lock.
///
/// Every implementation must honour, per line: a line starts
/// unregistered, masked, non-vectored and not pending; masking never
/// unregisters; vector mode and mask are independent; a failed operation
/// leaves state untouched.
pub trait InterruptController {
    /// Controller-specific requests accepted by [`command_request`](Self::command_request).
    type Command;

    /// Result of a successful command.
    type Response;

    /// Number of lines; valid ids are `0..line_count()`.
    fn line_count(&self) -> u32;

    /// Vector modes this controller class can be configured for.
    fn supported_modes(&self) -> VectorModes;

    /// One-time setup: clear pending state, mask every line.
    ///
    /// Must run before anything else, and only once.
    fn init(&self);

    /// Bind `handler` to `id`.
    fn register_handler(
        &self,
        id: InterruptId,
        handler: InterruptHandler,
    ) -> Result<(), InterruptError>;

    /// Unmask a line.
    fn enable(&self, id: InterruptId) -> Result<(), InterruptError>;

    /// Mask a line. The handler stays registered.
    fn disable(&self, id: InterruptId) -> Result<(), InterruptError>;

    /// Select how the line's handler is reached.
    fn vector_enable(&self, id: InterruptId, mode: VectorMode) -> Result<(), InterruptError>;

    /// Return the line to non-vectored dispatch.
    fn vector_disable(&self, id: InterruptId) -> Result<(), InterruptError>;

    /// Controller-specific operation outside the fixed contract.
    fn command_request(&self, command: Self::Command) -> Result<Self::Response, InterruptError>;
}

macro_rules! forward_controller {
    ($($ptr:ty),* $(,)?) => {$(
        impl<C: InterruptController + ?Sized> InterruptController for $ptr {
            type Command = C::Command;
            type Response = C::Response;

            fn line_count(&self) -> u32 {
                (**self).line_count()
            }

            fn supported_modes(&self) -> VectorModes {
                (**self).supported_modes()
            }

            fn init(&self) {
                (**self).init()
            }

            fn register_handler(
                &self,
                id: InterruptId,
                handler: InterruptHandler,
            ) -> Result<(), InterruptError> {
                (**self).register_handler(id, handler)
            }

            fn enable(&self, id: InterruptId) -> Result<(), InterruptError> {
                (**self).enable(id)
            }

            fn disable(&self, id: InterruptId) -> Result<(), InterruptError> {
                (**self).disable(id)
            }

            fn vector_enable(
                &self,
                id: InterruptId,
                mode: VectorMode,
            ) -> Result<(), InterruptError> {
                (**self).vector_enable(id, mode)
            }

            fn vector_disable(&self, id: InterruptId) -> Result<(), InterruptError> {
                (**self).vector_disable(id)
            }

            fn command_request(
                &self,
                command: Self::Command,
            ) -> Result<Self::Response, InterruptError> {
                (**self).command_request(command)
            }
        }
    )*};
}

forward_controller!(&C, Box<C>, Arc<C>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_modes_decode() {
        assert_eq!(VectorMode::try_from(0), Ok(VectorMode::Direct));
        assert_eq!(VectorMode::try_from(3), Ok(VectorMode::HardwareVector));
        assert_eq!(VectorMode::try_from(4), Err(InterruptError::NotSupported));
    }

    #[test]
    fn mode_sets() {
        let modes = VectorModes::DIRECT | VectorModes::VECTOR;
        assert!(modes.supports(VectorMode::Vector));
        assert!(!modes.supports(VectorMode::HardwareVector));
        assert!(VectorModes::all().supports(VectorMode::SelectiveVector));
        assert_eq!(VectorModes::from(VectorMode::Direct), VectorModes::DIRECT);
    }

    #[test]
    fn status_codes_are_distinct() {
        let errors = [
            InterruptError::InvalidId(9),
            InterruptError::AlreadyRegistered(1),
            InterruptError::NotSupported,
            InterruptError::NotInitialized,
        ];
        for (i, a) in errors.iter().enumerate() {
            assert_ne!(a.code(), STATUS_OK);
            for b in &errors[i + 1..] {
                assert_ne!(a.code(), b.code());
            }
        }
        assert_eq!(status_code(&Ok::<(), InterruptError>(())), STATUS_OK);
        assert_eq!(status_code::<()>(&Err(InterruptError::InvalidId(9))), -1);
    }
}
