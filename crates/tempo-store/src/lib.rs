//! TEMPO Store - Primary-context view of a running clock
//!
//! The store mirrors the kernel's elapsed-time formula locally and turns a
//! sub-second stream of wake signals into at most one observer notification
//! per visible change.

pub mod snapshot;
pub mod store;

pub use snapshot::*;
pub use store::*;
