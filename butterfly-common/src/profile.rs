//! Travel profile identifiers
//!
//! Profiles are opaque strings to the solver and assembler; they are only
//! normalised here, at the boundary where users type them.

use crate::error::{Error, Result};

/// Profiles understood by hosted routing services (matrix and directions APIs)
pub const KNOWN_PROFILES: &[&str] = &["driving", "driving-traffic", "walking", "cycling"];

/// Short mode names accepted as aliases, mapped to their canonical profile
pub const PROFILE_ALIASES: &[(&str, &str)] = &[
    ("car", "driving"),
    ("bike", "cycling"),
    ("bicycle", "cycling"),
    ("foot", "walking"),
];

/// Default profile when none is given
pub const DEFAULT_PROFILE: &str = "driving";

/// Parse a user-supplied profile into its canonical identifier
///
/// Matching is case-insensitive and ignores surrounding whitespace.
pub fn parse_profile(input: &str) -> Result<&'static str> {
    let lower = input.trim().to_lowercase();

    if let Some(profile) = KNOWN_PROFILES.iter().copied().find(|p| *p == lower) {
        return Ok(profile);
    }

    PROFILE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|(_, canonical)| *canonical)
        .ok_or_else(|| Error::UnknownProfile(input.to_string()))
}
