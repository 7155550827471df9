//! Core type definitions used throughout the codebase

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Milliseconds since match start
pub type Timestamp = u32;

/// Decoder-assigned identifier of a game object within one player's stream
pub type EntityIndex = String;

/// Blueprint identifier (PBGID) of a unit, building, upgrade or battlegroup
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Serialize, Deserialize,
)]
pub struct Pbgid(pub u32);

impl Pbgid {
    /// Parse a decoder identifier string, `None` if it is not a plain decimal u32
    pub fn parse(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }

    /// Decimal-string form used as the lookup key into the reference databases
    pub fn key(&self) -> String {
        self.0.to_string()
    }
}

/// Reason an identifier string could not be read as a PBGID
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PbgidParseError {
    #[error("empty identifier")]
    Empty,
    #[error("identifier '{0}' is not a decimal number")]
    NotNumeric(String),
    #[error("identifier '{0}' does not fit in 32 bits")]
    OutOfRange(String),
}

impl FromStr for Pbgid {
    type Err = PbgidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PbgidParseError::Empty);
        }
        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PbgidParseError::NotNumeric(trimmed.to_string()));
        }
        trimmed
            .parse::<u32>()
            .map(Pbgid)
            .map_err(|_| PbgidParseError::OutOfRange(trimmed.to_string()))
    }
}

/// Format a millisecond timestamp as `mm:ss`
pub fn format_timestamp(timestamp: Timestamp) -> String {
    let seconds = timestamp / 1000;
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Render an internal key for display: separators become spaces and every
/// word starts upper-case (`"afrika_korps"` -> `"Afrika Korps"`)
pub fn title_case(key: &str) -> String {
    key.split(|c: char| c == '_' || c == ' ')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
