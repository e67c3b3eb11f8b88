//! TEMPO Core - Fundamental types and primitives
//!
//! This crate defines the pieces shared by the timer kernel and the
//! reconciliation store:
//! - Monotonic time (MonoTime, MonotonicClock)
//! - Clock state and the anchor-based elapsed-time formula
//! - Display faces (HH:MM:SS composition from a digit lookup table)
//! - Render configuration and partial config updates
//! - Error types

pub mod time;
pub mod clock;
pub mod face;
pub mod config;
pub mod error;

pub use time::*;
pub use clock::*;
pub use face::*;
pub use config::*;
pub use error::*;
