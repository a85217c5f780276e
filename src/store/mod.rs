pub mod logs;
pub mod types;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::dataset::types::QuestionId;
use types::{ChatId, Group, LogEntry, ResultEntry, User, UserId};

pub const USERS_FILE: &str = "users.json";
pub const RESULTS_FILE: &str = "results.json";
pub const LOGS_FILE: &str = "logs.json";
pub const DAILY_STATS_FILE: &str = "daily_stats.json";
pub const ACHIEVEMENTS_FILE: &str = "achievements.json";
pub const GROUPS_FILE: &str = "groups.json";
pub const QUESTION_HISTORY_FILE: &str = "question_history.json";

/// Question history kept per user.
pub const HISTORY_CAP: usize = 100;

/// One persisted document. Each is rewritten as a whole when it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concern {
    Users,
    Results,
    Logs,
    DailyStats,
    Achievements,
    Groups,
    QuestionHistory,
}

impl Concern {
    pub const ALL: [Concern; 7] = [
        Concern::Users,
        Concern::Results,
        Concern::Logs,
        Concern::DailyStats,
        Concern::Achievements,
        Concern::Groups,
        Concern::QuestionHistory,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Concern::Users => USERS_FILE,
            Concern::Results => RESULTS_FILE,
            Concern::Logs => LOGS_FILE,
            Concern::DailyStats => DAILY_STATS_FILE,
            Concern::Achievements => ACHIEVEMENTS_FILE,
            Concern::Groups => GROUPS_FILE,
            Concern::QuestionHistory => QUESTION_HISTORY_FILE,
        }
    }
}

/// Mutable quiz state, mirrored to one JSON file per concern.
///
/// `data_dir == None` keeps everything in memory (tests, dry runs).
#[derive(Debug, Default)]
pub struct QuizStore {
    data_dir: Option<PathBuf>,
    log_ceiling: usize,
    pub users: BTreeMap<UserId, User>,
    pub results: BTreeMap<UserId, Vec<ResultEntry>>,
    pub logs: Vec<LogEntry>,
    /// `"{user_id}_{YYYY-MM-DD}"` → answered questions that day.
    pub daily_stats: BTreeMap<String, u32>,
    /// Earned achievement keys per user.
    pub achievements: BTreeMap<UserId, Vec<String>>,
    pub groups: BTreeMap<ChatId, Group>,
    pub question_history: BTreeMap<UserId, Vec<QuestionId>>,
}

impl QuizStore {
    pub fn in_memory() -> Self {
        Self {
            log_ceiling: logs::MAX_LOG_BYTES,
            ..Default::default()
        }
    }

    /// Load every document from `data_dir`, creating the directory if needed.
    /// A missing file is an empty document; an unreadable one is logged and
    /// treated as empty.
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        let mut store = Self {
            data_dir: Some(data_dir.to_path_buf()),
            log_ceiling: logs::MAX_LOG_BYTES,
            users: load_or_default(&data_dir.join(USERS_FILE)),
            results: load_or_default(&data_dir.join(RESULTS_FILE)),
            logs: load_or_default(&data_dir.join(LOGS_FILE)),
            daily_stats: load_or_default(&data_dir.join(DAILY_STATS_FILE)),
            achievements: load_or_default(&data_dir.join(ACHIEVEMENTS_FILE)),
            groups: load_or_default(&data_dir.join(GROUPS_FILE)),
            question_history: load_or_default(&data_dir.join(QUESTION_HISTORY_FILE)),
        };

        let migrated = store
            .users
            .values_mut()
            .fold(false, |changed, user| user.normalize() || changed);
        if migrated {
            info!("Normalized legacy user records");
            store.persist(Concern::Users);
        }

        info!(
            users = store.users.len(),
            groups = store.groups.len(),
            log_entries = store.logs.len(),
            "Quiz store opened at {:?}",
            data_dir
        );
        Ok(store)
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    #[cfg(test)]
    pub(crate) fn set_log_ceiling(&mut self, ceiling: usize) {
        self.log_ceiling = ceiling;
    }

    /// Rewrite one document. Errors are returned to the caller.
    pub fn save(&mut self, concern: Concern) -> Result<()> {
        let Some(dir) = self.data_dir.clone() else {
            return Ok(());
        };
        let path = dir.join(concern.file_name());
        match concern {
            Concern::Users => write_json(&path, &self.users),
            Concern::Results => write_json(&path, &self.results),
            Concern::DailyStats => write_json(&path, &self.daily_stats),
            Concern::Achievements => write_json(&path, &self.achievements),
            Concern::Groups => write_json(&path, &self.groups),
            Concern::QuestionHistory => write_json(&path, &self.question_history),
            Concern::Logs => {
                let encoded = logs::encode_logs(&mut self.logs, self.log_ceiling)?;
                std::fs::write(&path, &encoded)
                    .with_context(|| format!("Failed to write {:?}", path))?;
                if encoded.len() * 5 > self.log_ceiling * 4 {
                    warn!(
                        size_bytes = encoded.len(),
                        ceiling_bytes = self.log_ceiling,
                        "Answer log is close to its size limit"
                    );
                }
                Ok(())
            }
        }
    }

    /// Rewrite one document, logging instead of failing. In-memory state stays
    /// authoritative.
    pub fn persist(&mut self, concern: Concern) {
        if let Err(e) = self.save(concern) {
            error!(file = concern.file_name(), "Failed to save: {:#}", e);
        }
    }

    pub fn persist_all(&mut self) {
        for concern in Concern::ALL {
            self.persist(concern);
        }
        debug!("All quiz documents saved");
    }

    pub fn daily_count(&self, user_id: UserId, date: NaiveDate) -> u32 {
        self.daily_stats
            .get(&daily_key(user_id, date))
            .copied()
            .unwrap_or(0)
    }

    pub fn increment_daily(&mut self, user_id: UserId, date: NaiveDate) -> u32 {
        let count = self.daily_stats.entry(daily_key(user_id, date)).or_insert(0);
        *count += 1;
        *count
    }

    /// Correct answers a user gave on `date` (UTC).
    pub fn daily_correct(&self, user_id: UserId, date: NaiveDate) -> u32 {
        self.results
            .get(&user_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|r| r.is_correct && r.date.date_naive() == date)
                    .count() as u32
            })
            .unwrap_or(0)
    }

    pub fn history(&self, user_id: UserId) -> &[QuestionId] {
        self.question_history
            .get(&user_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Append to a user's question history, keeping the newest
    /// [`HISTORY_CAP`] entries.
    pub fn push_history(&mut self, user_id: UserId, uid: QuestionId) {
        let history = self.question_history.entry(user_id).or_default();
        history.push(uid);
        if history.len() > HISTORY_CAP {
            let excess = history.len() - HISTORY_CAP;
            history.drain(..excess);
        }
    }

    pub fn results_of(&self, user_id: UserId) -> &[ResultEntry] {
        self.results
            .get(&user_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn achievement_keys(&self, user_id: UserId) -> &[String] {
        self.achievements
            .get(&user_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

pub fn daily_key(user_id: UserId, date: NaiveDate) -> String {
    format!("{}_{}", user_id, date.format("%Y-%m-%d"))
}

fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match read_json(path) {
        Ok(value) => value,
        Err(e) => {
            error!("Failed to load {:?}, starting empty: {:#}", path, e);
            T::default()
        }
    }
}

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {:?}", path))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let contents = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {:?}", path))?;
    std::fs::write(path, contents).with_context(|| format!("Failed to write {:?}", path))
}
