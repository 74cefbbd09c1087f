//! Common utilities for the chess trainer
//!
//! This crate provides shared square/piece conversion utilities and UCI
//! helpers used by the rules adapter and the trainer.

pub mod converters;
pub mod uci;

// Re-export commonly used items
pub use converters::*;
pub use uci::*;
