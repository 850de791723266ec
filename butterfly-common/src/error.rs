//! Error types and utilities for the butterfly-trip toolkit
//!
//! Provides the shared error enum and fuzzy matching for travel profile identifiers.

use std::fmt;
use strsim::{jaro_winkler, normalized_levenshtein};

use crate::profile::{PROFILE_ALIASES, KNOWN_PROFILES};

/// Find the best fuzzy match using hybrid semantic + character-based scoring
///
/// Combines character-based similarity (Jaro-Winkler 70% + Normalized Levenshtein 30%)
/// with semantic bonuses:
/// - Prefix matching: 20% bonus for strong prefix similarity (≥4 chars)
/// - Substring matching: 12% bonus for compound profile parts (driving-traffic)
/// - Length similarity: 10% bonus for appropriate length matches
///
/// Minimum threshold: 0.65 similarity to balance precision vs recall
fn find_best_fuzzy_match(input: &str, candidates: &[&str]) -> Option<String> {
    if candidates.is_empty() {
        return None;
    }

    let input_lower = input.to_lowercase();
    let mut best_match = None;
    let mut best_score = 0.0f64;

    // Minimum similarity threshold (0.0 to 1.0)
    let min_threshold = 0.65;

    for candidate in candidates {
        let candidate_lower = candidate.to_lowercase();

        // Jaro-Winkler rewards shared prefixes ("drivng" -> "driving").
        let jw_score = jaro_winkler(&input_lower, &candidate_lower);
        // Levenshtein catches dropped letters ("walkng" -> "walking").
        let lev_score = normalized_levenshtein(&input_lower, &candidate_lower);
        let combined_score = (jw_score * 0.7) + (lev_score * 0.3);

        let mut semantic_bonus = 0.0;

        let prefix_len = input_lower.chars().count().min(7);
        if prefix_len >= 4 {
            let input_prefix = input_lower.chars().take(prefix_len).collect::<String>();
            let candidate_prefix = candidate_lower.chars().take(prefix_len).collect::<String>();

            let prefix_similarity = normalized_levenshtein(&input_prefix, &candidate_prefix);
            if prefix_similarity > 0.7 {
                semantic_bonus += 0.2 * prefix_similarity;
            }
        }

        if input_lower.len() >= 8 && candidate_lower.len() >= 8 {
            let length_ratio = 1.0
                - ((input_lower.len() as f64 - candidate_lower.len() as f64).abs()
                    / input_lower.len().max(candidate_lower.len()) as f64);
            if length_ratio > 0.7 {
                semantic_bonus += 0.1 * length_ratio;
            }
        }

        if candidate_lower.contains('-') {
            for part in candidate_lower.split('-') {
                if part.len() >= 4 {
                    let part_similarity = jaro_winkler(&input_lower, part);
                    if part_similarity > 0.85 {
                        semantic_bonus += 0.12 * part_similarity;
                    }
                }
            }
        }

        let final_score = combined_score + semantic_bonus;

        if final_score >= min_threshold && final_score > best_score {
            best_score = final_score;
            best_match = Some(candidate.to_string());
        }
    }

    best_match
}

/// Suggest a known travel profile for a potentially misspelled one
///
/// Returns `None` when the input already names a profile or alias, or when
/// nothing is close enough to be a plausible typo.
pub fn suggest_profile(profile: &str) -> Option<String> {
    let trimmed = profile.trim();

    if KNOWN_PROFILES
        .iter()
        .chain(PROFILE_ALIASES.iter().map(|(alias, _)| alias))
        .any(|known| known.eq_ignore_ascii_case(trimmed))
    {
        return None;
    }

    if let Some(found) = find_best_fuzzy_match(trimmed, KNOWN_PROFILES) {
        return Some(found);
    }

    // Typos of an alias resolve to the canonical profile ("bkie" -> "cycling")
    let aliases: Vec<&str> = PROFILE_ALIASES.iter().map(|(alias, _)| *alias).collect();
    find_best_fuzzy_match(trimmed, &aliases).and_then(|alias| {
        PROFILE_ALIASES
            .iter()
            .find(|(a, _)| *a == alias)
            .map(|(_, canonical)| canonical.to_string())
    })
}

/// Main error type for butterfly-trip operations
#[derive(Debug)]
pub enum Error {
    /// Malformed cost matrix, waypoint list or parameters
    InvalidInput(String),

    /// A tour index does not address a supplied waypoint
    IndexOutOfRange { index: usize, len: usize },

    /// No leg of the tour produced any geometry; carries the first failing leg index
    LegUnavailable(usize),

    /// Assembly produced zero points without any explicit leg failure
    EmptyRoute,

    /// The operation was cancelled before it completed
    Cancelled,

    /// Travel profile identifier not recognized
    UnknownProfile(String),

    /// An external cost matrix or geometry provider failed
    ProviderError(String),

    /// File I/O error
    IoError(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(msg) => {
                write!(f, "Invalid input: {msg}")
            }
            Error::IndexOutOfRange { index, len } => {
                write!(f, "Tour index {index} is out of range for {len} waypoints")
            }
            Error::LegUnavailable(leg) => {
                write!(f, "No geometry available for leg {leg}")
            }
            Error::EmptyRoute => {
                write!(f, "Assembled route contains no points")
            }
            Error::Cancelled => {
                write!(f, "Operation cancelled")
            }
            Error::UnknownProfile(profile) => match suggest_profile(profile) {
                Some(suggestion) => write!(
                    f,
                    "Unknown travel profile '{profile}'. Did you mean '{suggestion}'?"
                ),
                None => write!(
                    f,
                    "Unknown travel profile '{profile}'. Known profiles: {}",
                    KNOWN_PROFILES.join(", ")
                ),
            },
            Error::ProviderError(msg) => {
                write!(f, "Provider error: {msg}")
            }
            Error::IoError(err) => {
                write!(f, "I/O error: {err}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

/// Convenience result type for butterfly-trip operations
pub type Result<T> = std::result::Result<T, Error>;
