//! Extraction mode definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How much of a tweet's media an extraction returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMode {
    /// Only the clicked media item.
    Single,
    /// Every media item in the clicked tweet (default).
    #[default]
    #[serde(alias = "all")]
    AllFromPost,
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMode::Single => write!(f, "single"),
            ExtractionMode::AllFromPost => write!(f, "all-from-post"),
        }
    }
}

impl FromStr for ExtractionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" => Ok(ExtractionMode::Single),
            "all" | "all-from-post" => Ok(ExtractionMode::AllFromPost),
            _ => Err(format!("Unknown extraction mode: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_round_trips_through_display() {
        for mode in [ExtractionMode::Single, ExtractionMode::AllFromPost] {
            assert_eq!(mode.to_string().parse::<ExtractionMode>().unwrap(), mode);
        }
        assert_eq!("ALL".parse::<ExtractionMode>().unwrap(), ExtractionMode::AllFromPost);
        assert!("gallery".parse::<ExtractionMode>().is_err());
    }
}
