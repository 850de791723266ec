//! Common utilities for the butterfly-trip toolkit

pub mod error;
pub mod profile;

pub use error::{suggest_profile, Error, Result};
pub use profile::{parse_profile, DEFAULT_PROFILE, KNOWN_PROFILES};
