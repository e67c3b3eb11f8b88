//! TEMPO Kernel - Background timekeeping
//!
//! This crate implements the kernel side of TEMPO:
//! - Command and notification messages and their channels
//! - Display buffer (the transferred render target)
//! - Kernel state machine and dirty-checked render loop
//! - Frame scheduler with explicit cancellation
//! - Kernel worker task and the wake-signal worker used by the store

pub mod message;
pub mod surface;
pub mod kernel;
pub mod frame;
pub mod worker;
pub mod wake;

pub use message::*;
pub use surface::*;
pub use kernel::*;
pub use frame::*;
pub use worker::*;
pub use wake::*;
