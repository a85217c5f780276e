use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dataset::types::Question;

pub const EASY_TAGS: &[&str] = &["1-hop", "0-hop"];
pub const MEDIUM_TAGS: &[&str] = &[
    "multi-constraint",
    "qualifier-constraint",
    "reverse",
    "exclusion",
];
pub const HARD_TAGS: &[&str] = &[
    "multi-hop",
    "count",
    "ranking",
    "duration",
    "no_answer",
    "qualifier-answer",
];

/// Difficulty bucket of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Bucket of a question by its tags: hard > medium > easy, medium when
    /// nothing matches.
    pub fn of(question: &Question) -> Self {
        Self::from_tags(&question.tags)
    }

    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Self {
        let has_any = |table: &[&str]| tags.iter().any(|t| table.contains(&t.as_ref()));
        if has_any(HARD_TAGS) {
            Difficulty::Hard
        } else if has_any(MEDIUM_TAGS) {
            Difficulty::Medium
        } else if has_any(EASY_TAGS) {
            Difficulty::Easy
        } else {
            Difficulty::Medium
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "🟢 Easy",
            Difficulty::Medium => "🟡 Medium",
            Difficulty::Hard => "🔴 Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(anyhow::anyhow!("unknown difficulty: {}", other)),
        }
    }
}

/// A user's question filter. Stored as `"all" | "easy" | "medium" | "hard"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyPreference {
    #[default]
    All,
    Easy,
    Medium,
    Hard,
}

impl DifficultyPreference {
    pub const CHOICES: [DifficultyPreference; 4] = [
        DifficultyPreference::All,
        DifficultyPreference::Easy,
        DifficultyPreference::Medium,
        DifficultyPreference::Hard,
    ];

    /// The bucket to filter on, `None` for no filter.
    pub fn bucket(&self) -> Option<Difficulty> {
        match self {
            DifficultyPreference::All => None,
            DifficultyPreference::Easy => Some(Difficulty::Easy),
            DifficultyPreference::Medium => Some(Difficulty::Medium),
            DifficultyPreference::Hard => Some(Difficulty::Hard),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self.bucket() {
            Some(d) => d.as_str(),
            None => "all",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DifficultyPreference::All => "🌐 All questions",
            DifficultyPreference::Easy => "🟢 Easy (1-hop, 0-hop)",
            DifficultyPreference::Medium => "🟡 Medium (multi-constraint, reverse, ...)",
            DifficultyPreference::Hard => "🔴 Hard (multi-hop, count, ranking, ...)",
        }
    }
}

impl FromStr for DifficultyPreference {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "all" {
            return Ok(DifficultyPreference::All);
        }
        Ok(match s.parse::<Difficulty>()? {
            Difficulty::Easy => DifficultyPreference::Easy,
            Difficulty::Medium => DifficultyPreference::Medium,
            Difficulty::Hard => DifficultyPreference::Hard,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hard_tags_win_over_easy_and_medium() {
        assert_eq!(
            Difficulty::from_tags(&["1-hop", "reverse", "count"]),
            Difficulty::Hard
        );
        for hard in HARD_TAGS {
            assert_eq!(Difficulty::from_tags(&["0-hop", hard]), Difficulty::Hard);
        }
    }

    #[test]
    fn medium_beats_easy() {
        assert_eq!(
            Difficulty::from_tags(&["1-hop", "exclusion"]),
            Difficulty::Medium
        );
    }

    #[test]
    fn easy_only_when_nothing_stronger() {
        assert_eq!(Difficulty::from_tags(&["0-hop"]), Difficulty::Easy);
    }

    #[test]
    fn unknown_or_missing_tags_default_to_medium() {
        let none: [&str; 0] = [];
        assert_eq!(Difficulty::from_tags(&none), Difficulty::Medium);
        assert_eq!(Difficulty::from_tags(&["whatever"]), Difficulty::Medium);
    }

    #[test]
    fn preference_round_trips_through_its_stored_form() {
        for pref in DifficultyPreference::CHOICES {
            let json = serde_json::to_string(&pref).unwrap();
            assert_eq!(json, format!("\"{}\"", pref.as_str()));
            assert_eq!(pref.as_str().parse::<DifficultyPreference>().unwrap(), pref);
        }
        assert!("extreme".parse::<DifficultyPreference>().is_err());
        assert_eq!(DifficultyPreference::All.bucket(), None);
    }
}
