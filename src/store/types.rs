use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::dataset::types::{null_as_default, QuestionId};
use crate::quiz::difficulty::{Difficulty, DifficultyPreference};
use crate::quiz::progression::MAX_LEVEL;

/// External (chat platform) user identifier.
pub type UserId = u64;
/// External chat / channel identifier.
pub type ChatId = u64;

fn one() -> u32 {
    1
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Per-user progression record (`users.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default = "Utc::now")]
    pub registered_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chats: Vec<ChatId>,
    #[serde(default)]
    pub is_group_member: bool,
    #[serde(default)]
    pub total_questions: u32,
    #[serde(default)]
    pub correct_answers: u32,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub best_streak: u32,
    #[serde(default)]
    pub last_question_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rating: u32,
    #[serde(default = "one")]
    pub consecutive_days: u32,
    #[serde(default)]
    pub last_active_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub level: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub experience: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub difficulty: DifficultyPreference,
    #[serde(default)]
    pub current_question_id: Option<QuestionId>,
}

impl User {
    pub fn new(id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            first_name: String::new(),
            last_name: String::new(),
            username: String::new(),
            registered_at: now,
            chats: Vec::new(),
            is_group_member: false,
            total_questions: 0,
            correct_answers: 0,
            streak: 0,
            best_streak: 0,
            last_question_date: None,
            rating: 0,
            consecutive_days: 1,
            last_active_date: Some(now.date_naive()),
            level: 1,
            experience: 0,
            difficulty: DifficultyPreference::All,
            current_question_id: None,
        }
    }

    /// Human-readable name: full name, else username, else `User {id}`.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if !full.is_empty() {
            full.to_string()
        } else if !self.username.is_empty() {
            self.username.clone()
        } else {
            format!("User {}", self.id)
        }
    }

    /// Clamp legacy records into the valid level range. Returns true when
    /// anything changed.
    pub fn normalize(&mut self) -> bool {
        let level = self.level.clamp(1, MAX_LEVEL);
        let changed = level != self.level;
        self.level = level;
        changed
    }
}

/// One answered or timed-out question (`results.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEntry {
    pub date: DateTime<Utc>,
    pub is_correct: bool,
    #[serde(default)]
    pub question_id: Option<QuestionId>,
    #[serde(default)]
    pub chat_id: Option<ChatId>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub timeout: bool,
}

/// Audit record of one answer (`logs.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub user_id: UserId,
    pub chat_id: ChatId,
    pub question_id: QuestionId,
    pub user_answer: String,
    pub is_correct: bool,
    pub correct_answer: String,
    pub user_name: String,
    pub is_group: bool,
}

/// Per-member answer tally inside a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub correct: u32,
    pub total: u32,
}

impl Tally {
    pub fn accuracy(&self) -> f64 {
        crate::quiz::progression::accuracy(self.correct, self.total)
    }
}

/// Group chat record (`groups.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: ChatId,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub members: Vec<UserId>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub total_questions: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub leaderboard: BTreeMap<UserId, Tally>,
}
