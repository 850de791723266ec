//! CLI-specific utilities for butterfly-trip
//!
//! This module contains code specific to the command-line interface,
//! separate from the core library functionality.

pub mod input;
pub mod progress;

pub use progress::ProgressManager;
