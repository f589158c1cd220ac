use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Difficulty tier a session is generated for, and the tier a score awards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    /// Lowest score that awards `Advanced`.
    pub const ADVANCED_FROM: f64 = 71.0;
    /// Lowest score that awards `Intermediate`.
    pub const INTERMEDIATE_FROM: f64 = 41.0;

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
        }
    }

    /// Parse leniently: unknown or blank input falls back to `Beginner`.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }

    /// Level a percentage score maps to.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= Self::ADVANCED_FROM {
            SkillLevel::Advanced
        } else if score >= Self::INTERMEDIATE_FROM {
            SkillLevel::Intermediate
        } else {
            SkillLevel::Beginner
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelError {
    raw: String,
}

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown skill level: {}", self.raw)
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for SkillLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(SkillLevel::Beginner),
            "intermediate" => Ok(SkillLevel::Intermediate),
            "advanced" => Ok(SkillLevel::Advanced),
            _ => Err(ParseLevelError { raw: s.to_string() }),
        }
    }
}
