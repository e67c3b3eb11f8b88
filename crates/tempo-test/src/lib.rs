//! TEMPO Test Harness - Kernel and store validation
//!
//! This crate provides:
//! - Frame recording surfaces
//! - Seeded command bursts with a reference clock model
//! - End-to-end kernel/store scenarios

pub mod recorder;
pub mod burst;
pub mod scenarios;

pub use recorder::*;
pub use burst::*;
