use std::str::FromStr;

use super::progression::accuracy;

/// Streak needed for [`Achievement::Perfect10`].
const STREAK_10: u32 = 10;
const STREAK_50: u32 = 50;
const HUNDRED: u32 = 100;
const ACCURACY_MIN_QUESTIONS: u32 = 20;
const ACCURACY_THRESHOLD: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Achievement {
    FirstQuestion,
    Perfect10,
    Perfect50,
    HundredQuestions,
    PerfectDay,
    Accuracy90,
    Top10,
}

impl Achievement {
    /// Evaluation order.
    pub const ALL: [Achievement; 7] = [
        Achievement::FirstQuestion,
        Achievement::Perfect10,
        Achievement::Perfect50,
        Achievement::HundredQuestions,
        Achievement::PerfectDay,
        Achievement::Accuracy90,
        Achievement::Top10,
    ];

    /// Key stored in `achievements.json`.
    pub fn key(&self) -> &'static str {
        match self {
            Achievement::FirstQuestion => "FIRST_QUESTION",
            Achievement::Perfect10 => "PERFECT_10",
            Achievement::Perfect50 => "PERFECT_50",
            Achievement::HundredQuestions => "HUNDRED_QUESTIONS",
            Achievement::PerfectDay => "PERFECT_DAY",
            Achievement::Accuracy90 => "ACCURACY_90",
            Achievement::Top10 => "TOP_10",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Achievement::FirstQuestion => "🎯 First Step",
            Achievement::Perfect10 => "🔥 Perfect Ten",
            Achievement::Perfect50 => "⭐ Master",
            Achievement::HundredQuestions => "💯 Centurion",
            Achievement::PerfectDay => "📅 Perfect Day",
            Achievement::Accuracy90 => "🎯 Sniper",
            Achievement::Top10 => "🏆 Top 10",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Achievement::FirstQuestion => "Answer your first question",
            Achievement::Perfect10 => "10 correct answers in a row",
            Achievement::Perfect50 => "50 correct answers in a row",
            Achievement::HundredQuestions => "Answer 100 questions",
            Achievement::PerfectDay => "30 of 30 correct in one day",
            Achievement::Accuracy90 => "Accuracy above 90%",
            Achievement::Top10 => "Reach the top 10 players",
        }
    }

    fn is_satisfied(&self, p: &Progress) -> bool {
        match self {
            Achievement::FirstQuestion => p.total_questions >= 1,
            Achievement::Perfect10 => p.streak >= STREAK_10,
            Achievement::Perfect50 => p.streak >= STREAK_50,
            Achievement::HundredQuestions => p.total_questions >= HUNDRED,
            Achievement::PerfectDay => {
                p.daily_limit > 0
                    && p.answered_today == p.daily_limit
                    && p.correct_today == p.daily_limit
            }
            Achievement::Accuracy90 => {
                p.total_questions >= ACCURACY_MIN_QUESTIONS
                    && accuracy(p.correct_answers, p.total_questions) >= ACCURACY_THRESHOLD
            }
            Achievement::Top10 => p.in_top_10,
        }
    }
}

impl FromStr for Achievement {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Achievement::ALL
            .into_iter()
            .find(|a| a.key() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown achievement: {}", s))
    }
}

/// Snapshot of the counters the achievement rules look at.
#[derive(Debug, Clone, Copy, Default)]
pub struct Progress {
    pub total_questions: u32,
    pub correct_answers: u32,
    pub streak: u32,
    pub answered_today: u32,
    pub correct_today: u32,
    pub daily_limit: u32,
    pub in_top_10: bool,
}

/// Grant every satisfied achievement not already in `owned`, in rule order.
/// Returns only the newly granted ones.
pub fn grant(owned: &mut Vec<String>, progress: &Progress) -> Vec<Achievement> {
    let mut granted = Vec::new();
    for achievement in Achievement::ALL {
        if owned.iter().any(|k| k == achievement.key()) {
            continue;
        }
        if achievement.is_satisfied(progress) {
            owned.push(achievement.key().to_string());
            granted.push(achievement);
        }
    }
    granted
}

/// Known achievements among stored keys; unknown keys are skipped.
pub fn parse_keys(keys: &[String]) -> Vec<Achievement> {
    keys.iter().filter_map(|k| k.parse().ok()).collect()
}
