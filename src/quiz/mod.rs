pub mod achievements;
pub mod difficulty;
pub mod matcher;
pub mod progression;
pub mod selector;

use std::cmp::Reverse;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::dataset::types::{Question, QuestionId};
use crate::dataset::Dataset;
use crate::store::types::{ChatId, Group, LogEntry, ResultEntry, Tally, User, UserId};
use crate::store::{Concern, QuizStore};

use achievements::{Achievement, Progress};
use difficulty::{Difficulty, DifficultyPreference};
use matcher::MatchOutcome;
use progression::MAX_LEVEL;

/// Default number of answers a user may give per UTC day.
pub const DEFAULT_DAILY_LIMIT: u32 = 30;
/// Size of the leaderboard that earns [`Achievement::Top10`].
pub const TOP_SIZE: usize = 10;

/// Who is talking to the bot.
#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
}

/// Where the conversation happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRef {
    pub id: ChatId,
    pub is_group: bool,
    pub title: Option<String>,
}

impl ChatRef {
    pub fn private(id: ChatId) -> Self {
        Self {
            id,
            is_group: false,
            title: None,
        }
    }
}

/// Outcome of asking for a new question.
#[derive(Debug, Clone)]
pub enum Draw {
    Question(Question),
    LimitReached,
    NoData,
}

/// Everything the presentation layer shows after an answer.
#[derive(Debug, Clone)]
pub struct AnswerReport {
    pub outcome: MatchOutcome,
    pub difficulty: Difficulty,
    pub experience_gained: u32,
    pub rating_gained: u32,
    pub leveled_up: bool,
    pub new_achievements: Vec<Achievement>,
    pub stats: UserStats,
}

#[derive(Debug, Clone)]
pub struct TimeoutReport {
    pub correct_answer: String,
    pub difficulty: Difficulty,
}

/// Derived per-user statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct UserStats {
    pub name: String,
    pub total_questions: u32,
    pub correct_answers: u32,
    /// Rounded percent.
    pub accuracy: u32,
    pub streak: u32,
    pub best_streak: u32,
    pub today_questions: u32,
    pub remaining_today: u32,
    pub daily_limit: u32,
    pub rating: u32,
    pub level: u32,
    pub experience: u32,
    pub experience_for_next: u32,
    pub progress: u32,
    pub consecutive_days: u32,
    pub achievements: usize,
    pub difficulty: DifficultyPreference,
}

impl UserStats {
    pub fn at_max_level(&self) -> bool {
        self.level >= MAX_LEVEL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopOrder {
    Rating,
    Accuracy,
    Questions,
}

impl TopOrder {
    pub fn label(&self) -> &'static str {
        match self {
            TopOrder::Rating => "by rating",
            TopOrder::Accuracy => "by accuracy",
            TopOrder::Questions => "by questions answered",
        }
    }
}

impl FromStr for TopOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rating" => Ok(TopOrder::Rating),
            "accuracy" => Ok(TopOrder::Accuracy),
            "questions" => Ok(TopOrder::Questions),
            other => anyhow::bail!("unknown leaderboard order: {}", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRow {
    pub user_id: UserId,
    pub name: String,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub accuracy: u32,
    pub best_streak: u32,
    pub level: u32,
    pub rating: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    pub user_id: UserId,
    pub name: String,
    pub tally: Tally,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupReport {
    pub title: String,
    pub rows: Vec<GroupRow>,
}

/// The quiz engine: read-only dataset plus the mutable store behind one lock,
/// so state changes are applied one at a time in arrival order.
pub struct QuizEngine {
    dataset: Arc<Dataset>,
    store: RwLock<QuizStore>,
    daily_limit: u32,
}

impl QuizEngine {
    pub fn new(dataset: Arc<Dataset>, store: QuizStore, daily_limit: u32) -> Self {
        Self {
            dataset,
            store: RwLock::new(store),
            daily_limit,
        }
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    /// Create the user on first contact, otherwise refresh chats and the
    /// consecutive-days counter. Group chats get a group record.
    pub async fn register(&self, profile: &Profile, chat: &ChatRef) -> User {
        let mut store = self.store.write().await;
        register_locked(&mut store, profile, chat, Utc::now())
    }

    pub async fn user(&self, user_id: UserId) -> Option<User> {
        self.store.read().await.users.get(&user_id).cloned()
    }

    pub async fn can_answer_more(&self, user_id: UserId) -> bool {
        let store = self.store.read().await;
        store.daily_count(user_id, today()) < self.daily_limit
    }

    /// Pick the next question for a user, honoring the daily cap, their
    /// difficulty preference and recent history.
    pub async fn next_question(&self, user_id: UserId) -> Draw {
        let mut store = self.store.write().await;
        if store.daily_count(user_id, today()) >= self.daily_limit {
            return Draw::LimitReached;
        }

        let bucket = store
            .users
            .get(&user_id)
            .and_then(|u| u.difficulty.bucket());
        let picked = selector::select(
            self.dataset.questions(),
            store.history(user_id),
            bucket,
            &mut rand::thread_rng(),
        )
        .cloned();

        let Some(question) = picked else {
            return Draw::NoData;
        };

        store.push_history(user_id, question.uid);
        store.persist(Concern::QuestionHistory);
        if let Some(user) = store.users.get_mut(&user_id) {
            user.current_question_id = Some(question.uid);
            store.persist(Concern::Users);
        }
        debug!(user_id, question_uid = question.uid, "Question drawn");
        Draw::Question(question)
    }

    /// Score a free-text answer. `None` when the question is unknown.
    pub async fn submit_answer(
        &self,
        user_id: UserId,
        chat: &ChatRef,
        question_uid: QuestionId,
        answer: &str,
    ) -> Option<AnswerReport> {
        let question = self.dataset.get(question_uid)?;
        let now = Utc::now();
        let today = now.date_naive();
        let outcome = matcher::check_answer(question, answer);
        let difficulty = Difficulty::of(question);

        let mut store = self.store.write().await;
        if !store.users.contains_key(&user_id) {
            return None;
        }
        store.increment_daily(user_id, today);
        store.persist(Concern::DailyStats);

        let user = store.users.get_mut(&user_id)?;
        let applied = progression::apply_answer(user, outcome.is_correct, difficulty, now);
        let user_name = user.display_name();

        store.results.entry(user_id).or_default().push(ResultEntry {
            date: now,
            is_correct: outcome.is_correct,
            question_id: Some(question_uid),
            chat_id: Some(chat.id),
            difficulty: Some(difficulty),
            timeout: false,
        });
        refresh_rating(&mut store, user_id);
        store.persist(Concern::Users);
        store.persist(Concern::Results);

        if chat.is_group {
            if let Some(group) = store.groups.get_mut(&chat.id) {
                group.total_questions += 1;
                let tally = group.leaderboard.entry(user_id).or_default();
                tally.total += 1;
                if outcome.is_correct {
                    tally.correct += 1;
                }
                store.persist(Concern::Groups);
            }
        }

        store.logs.push(LogEntry {
            timestamp: now,
            user_id,
            chat_id: chat.id,
            question_id: question_uid,
            user_answer: answer.to_string(),
            is_correct: outcome.is_correct,
            correct_answer: outcome.correct_answer.clone(),
            user_name,
            is_group: chat.is_group,
        });
        store.persist(Concern::Logs);

        let new_achievements = self.grant_achievements(&mut store, user_id, today);
        let stats = self.stats_locked(&store, user_id)?;

        info!(
            user_id,
            question_uid,
            is_correct = outcome.is_correct,
            difficulty = %difficulty,
            "Answer scored"
        );

        Some(AnswerReport {
            outcome,
            difficulty,
            experience_gained: applied.experience_gained,
            rating_gained: applied.rating_gained,
            leveled_up: applied.leveled_up,
            new_achievements,
            stats,
        })
    }

    /// Record a question that ran out of time. `None` when the question is
    /// unknown.
    pub async fn record_timeout(
        &self,
        user_id: UserId,
        chat: &ChatRef,
        question_uid: QuestionId,
    ) -> Option<TimeoutReport> {
        let question = self.dataset.get(question_uid)?;
        let now = Utc::now();
        let difficulty = Difficulty::of(question);
        let correct_answer = matcher::display_answer(question);

        let mut store = self.store.write().await;
        if let Some(user) = store.users.get_mut(&user_id) {
            progression::apply_timeout(user, now);
            let user_name = user.display_name();
            store.results.entry(user_id).or_default().push(ResultEntry {
                date: now,
                is_correct: false,
                question_id: Some(question_uid),
                chat_id: Some(chat.id),
                difficulty: Some(difficulty),
                timeout: true,
            });
            refresh_rating(&mut store, user_id);
            store.persist(Concern::Results);
            store.persist(Concern::Users);

            store.logs.push(LogEntry {
                timestamp: now,
                user_id,
                chat_id: chat.id,
                question_id: question_uid,
                user_answer: "TIMEOUT".to_string(),
                is_correct: false,
                correct_answer: correct_answer.clone(),
                user_name,
                is_group: chat.is_group,
            });
            store.persist(Concern::Logs);
        }

        info!(user_id, question_uid, "Question timed out");
        Some(TimeoutReport {
            correct_answer,
            difficulty,
        })
    }

    pub async fn stats(&self, user_id: UserId) -> Option<UserStats> {
        let store = self.store.read().await;
        self.stats_locked(&store, user_id)
    }

    pub async fn top_players(&self, limit: usize, order: TopOrder) -> Vec<PlayerRow> {
        let store = self.store.read().await;
        top_locked(&store, limit, order)
    }

    pub async fn achievements(&self, user_id: UserId) -> Vec<Achievement> {
        let store = self.store.read().await;
        achievements::parse_keys(store.achievement_keys(user_id))
    }

    /// Top members of a group chat by accuracy. `None` when the group has no
    /// answers yet.
    pub async fn group_stats(&self, chat_id: ChatId, limit: usize) -> Option<GroupReport> {
        let store = self.store.read().await;
        let group = store.groups.get(&chat_id)?;
        if group.leaderboard.is_empty() {
            return None;
        }

        let mut rows: Vec<GroupRow> = group
            .leaderboard
            .iter()
            .map(|(&user_id, &tally)| GroupRow {
                user_id,
                name: store
                    .users
                    .get(&user_id)
                    .map(User::display_name)
                    .unwrap_or_else(|| format!("User {}", user_id)),
                tally,
            })
            .collect();
        rows.sort_by_key(|row| accuracy_rank(row.tally.correct, row.tally.total));
        rows.truncate(limit);

        Some(GroupReport {
            title: group.title.clone(),
            rows,
        })
    }

    pub async fn difficulty_of(&self, user_id: UserId) -> DifficultyPreference {
        let store = self.store.read().await;
        store
            .users
            .get(&user_id)
            .map(|u| u.difficulty)
            .unwrap_or_default()
    }

    /// Returns false when the user is unknown.
    pub async fn set_difficulty(&self, user_id: UserId, pref: DifficultyPreference) -> bool {
        let mut store = self.store.write().await;
        let Some(user) = store.users.get_mut(&user_id) else {
            return false;
        };
        user.difficulty = pref;
        store.persist(Concern::Users);
        info!(user_id, difficulty = pref.as_str(), "Difficulty preference changed");
        true
    }

    pub async fn save_all(&self) {
        self.store.write().await.persist_all();
    }

    /// Rewrite every document on a fixed interval. Runs until the task is
    /// dropped.
    pub async fn autosave(self: Arc<Self>, every: Duration) {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            self.save_all().await;
            info!("Autosave complete");
        }
    }

    fn grant_achievements(
        &self,
        store: &mut QuizStore,
        user_id: UserId,
        today: chrono::NaiveDate,
    ) -> Vec<Achievement> {
        let Some(user) = store.users.get(&user_id) else {
            return Vec::new();
        };
        let in_top_10 = top_locked(store, TOP_SIZE, TopOrder::Rating)
            .iter()
            .any(|row| row.user_id == user_id);
        let progress = Progress {
            total_questions: user.total_questions,
            correct_answers: user.correct_answers,
            streak: user.streak,
            answered_today: store.daily_count(user_id, today),
            correct_today: store.daily_correct(user_id, today),
            daily_limit: self.daily_limit,
            in_top_10,
        };

        let owned = store.achievements.entry(user_id).or_default();
        let granted = achievements::grant(owned, &progress);
        if !granted.is_empty() {
            store.persist(Concern::Achievements);
            info!(
                user_id,
                granted = ?granted.iter().map(Achievement::key).collect::<Vec<_>>(),
                "Achievements granted"
            );
        }
        granted
    }

    fn stats_locked(&self, store: &QuizStore, user_id: UserId) -> Option<UserStats> {
        let user = store.users.get(&user_id)?;
        let today_questions = store.daily_count(user_id, today());
        let (experience_for_next, progress) = progression::level_progress(user);
        Some(UserStats {
            name: user.display_name(),
            total_questions: user.total_questions,
            correct_answers: user.correct_answers,
            accuracy: rounded_accuracy(user.correct_answers, user.total_questions),
            streak: user.streak,
            best_streak: user.best_streak,
            today_questions,
            remaining_today: self.daily_limit.saturating_sub(today_questions),
            daily_limit: self.daily_limit,
            rating: progression::calculate_rating(user, store.results_of(user_id)),
            level: user.level.clamp(1, MAX_LEVEL),
            experience: user.experience,
            experience_for_next,
            progress,
            consecutive_days: user.consecutive_days,
            achievements: store.achievement_keys(user_id).len(),
            difficulty: user.difficulty,
        })
    }
}

fn today() -> chrono::NaiveDate {
    Utc::now().date_naive()
}

fn rounded_accuracy(correct: u32, total: u32) -> u32 {
    progression::accuracy(correct, total).round() as u32
}

fn refresh_rating(store: &mut QuizStore, user_id: UserId) {
    let rating = match store.users.get(&user_id) {
        Some(user) => progression::calculate_rating(user, store.results_of(user_id)),
        None => return,
    };
    if let Some(user) = store.users.get_mut(&user_id) {
        user.rating = rating;
    }
}

/// Sort key for accuracy leaderboards: higher accuracy first, measured in
/// tenths of a percent, then more questions answered.
fn accuracy_rank(correct: u32, total: u32) -> Reverse<(u64, u32)> {
    let tenths = if total == 0 {
        0
    } else {
        (u64::from(correct) * 1000 + u64::from(total) / 2) / u64::from(total)
    };
    Reverse((tenths, total))
}

fn top_locked(store: &QuizStore, limit: usize, order: TopOrder) -> Vec<PlayerRow> {
    let mut rows: Vec<PlayerRow> = store
        .users
        .values()
        .map(|u| PlayerRow {
            user_id: u.id,
            name: u.display_name(),
            correct_answers: u.correct_answers,
            total_questions: u.total_questions,
            accuracy: rounded_accuracy(u.correct_answers, u.total_questions),
            best_streak: u.best_streak,
            level: u.level.clamp(1, MAX_LEVEL),
            rating: progression::calculate_rating(u, store.results_of(u.id)),
        })
        .collect();

    match order {
        TopOrder::Rating => rows.sort_by_key(|row| Reverse(row.rating)),
        TopOrder::Accuracy => {
            rows.sort_by_key(|row| accuracy_rank(row.correct_answers, row.total_questions))
        }
        TopOrder::Questions => rows.sort_by_key(|row| Reverse(row.total_questions)),
    }
    rows.truncate(limit);
    rows
}

fn register_locked(
    store: &mut QuizStore,
    profile: &Profile,
    chat: &ChatRef,
    now: DateTime<Utc>,
) -> User {
    let today = now.date_naive();
    let mut users_changed = false;

    let user = store.users.entry(profile.id).or_insert_with(|| {
        users_changed = true;
        let mut user = User::new(profile.id, now);
        user.first_name = profile.first_name.clone();
        user.last_name = profile.last_name.clone();
        user.username = profile.username.clone();
        user.is_group_member = chat.is_group;
        user
    });

    if !user.chats.contains(&chat.id) {
        user.chats.push(chat.id);
        users_changed = true;
    }
    if user.username.is_empty() && !profile.username.is_empty() {
        user.username = profile.username.clone();
        users_changed = true;
    }
    if user.last_active_date != Some(today) {
        let yesterday = today.pred_opt();
        user.consecutive_days = if user.last_active_date.is_some() && user.last_active_date == yesterday {
            user.consecutive_days + 1
        } else {
            1
        };
        user.last_active_date = Some(today);
        users_changed = true;
    }
    let user = user.clone();

    if users_changed {
        store.persist(Concern::Users);
    }

    if chat.is_group {
        let group = store.groups.entry(chat.id).or_insert_with(|| Group {
            id: chat.id,
            title: chat.title.clone().unwrap_or_else(|| "Group".to_string()),
            members: Vec::new(),
            created_at: now,
            total_questions: 0,
            leaderboard: Default::default(),
        });
        if !group.members.contains(&profile.id) {
            group.members.push(profile.id);
            store.persist(Concern::Groups);
        }
    }

    user
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::types::{Answer, AnswerKind, LocalizedNames, ParagraphRefs};
    use chrono::Duration as ChronoDuration;

    fn question(uid: QuestionId, answer: &str, tag: &str) -> Question {
        Question {
            uid,
            question_text: format!("Question {}?", uid),
            question_eng: None,
            answer_text: None,
            answers: vec![Answer {
                kind: AnswerKind::Uri,
                label: Some(answer.to_string()),
                value: None,
                wd_names: LocalizedNames::default(),
                wp_names: vec![],
            }],
            tags: vec![tag.to_string()],
            paragraphs_uids: ParagraphRefs::default(),
        }
    }

    fn quiz_with(questions: Vec<Question>) -> QuizEngine {
        QuizEngine::new(
            Arc::new(Dataset::new(questions, vec![])),
            QuizStore::in_memory(),
            DEFAULT_DAILY_LIMIT,
        )
    }

    fn profile(id: UserId) -> Profile {
        Profile {
            id,
            first_name: format!("Player{}", id),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn correct_answer_updates_progression() {
        let quiz = quiz_with(vec![question(1, "Moscow", "count")]);
        let chat = ChatRef::private(10);
        quiz.register(&profile(10), &chat).await;

        let report = quiz.submit_answer(10, &chat, 1, "moscow city").await.unwrap();
        assert!(report.outcome.is_correct);
        assert_eq!(report.difficulty, Difficulty::Hard);
        assert_eq!(report.experience_gained, 20);
        assert_eq!(report.rating_gained, 20);
        assert_eq!(report.new_achievements[0], Achievement::FirstQuestion);
        assert!(report.new_achievements.contains(&Achievement::Top10));
        assert_eq!(report.stats.streak, 1);
        assert_eq!(report.stats.remaining_today, 29);
        // 20 weight + 1*5 streak + 100%*2
        assert_eq!(report.stats.rating, 20 + 5 + 200);

        let user = quiz.user(10).await.unwrap();
        assert_eq!(user.experience, 20);
        assert_eq!(user.rating, 225);
    }

    #[tokio::test]
    async fn wrong_answer_resets_streak() {
        let quiz = quiz_with(vec![question(1, "Moscow", "1-hop")]);
        let chat = ChatRef::private(3);
        quiz.register(&profile(3), &chat).await;
        quiz.submit_answer(3, &chat, 1, "Moscow").await.unwrap();
        let report = quiz.submit_answer(3, &chat, 1, "Paris").await.unwrap();
        assert!(!report.outcome.is_correct);
        assert_eq!(report.outcome.correct_answer, "Moscow");
        assert_eq!(report.experience_gained, 1);
        assert_eq!(report.stats.streak, 0);
        assert_eq!(report.stats.best_streak, 1);
    }

    #[tokio::test]
    async fn daily_cap_blocks_new_questions() {
        let quiz = quiz_with(vec![question(1, "a", "1-hop"), question(2, "b", "1-hop")]);
        let chat = ChatRef::private(4);
        quiz.register(&profile(4), &chat).await;
        for _ in 0..DEFAULT_DAILY_LIMIT {
            assert!(matches!(quiz.next_question(4).await, Draw::Question(_)));
            quiz.submit_answer(4, &chat, 1, "a").await.unwrap();
        }
        assert!(!quiz.can_answer_more(4).await);
        assert!(matches!(quiz.next_question(4).await, Draw::LimitReached));

        let stats = quiz.stats(4).await.unwrap();
        assert_eq!(stats.today_questions, 30);
        assert_eq!(stats.remaining_today, 0);
        assert!(quiz.achievements(4).await.contains(&Achievement::PerfectDay));
    }

    #[tokio::test]
    async fn empty_dataset_reports_no_data() {
        let quiz = quiz_with(vec![]);
        quiz.register(&profile(1), &ChatRef::private(1)).await;
        assert!(matches!(quiz.next_question(1).await, Draw::NoData));
        assert!(quiz.submit_answer(1, &ChatRef::private(1), 99, "x").await.is_none());
    }

    #[tokio::test]
    async fn difficulty_preference_filters_questions() {
        let quiz = quiz_with(vec![question(1, "a", "1-hop"), question(2, "b", "count")]);
        quiz.register(&profile(2), &ChatRef::private(2)).await;
        assert!(quiz.set_difficulty(2, DifficultyPreference::Hard).await);
        for _ in 0..5 {
            match quiz.next_question(2).await {
                Draw::Question(q) => assert_eq!(q.uid, 2),
                other => panic!("unexpected draw: {:?}", other),
            }
        }
        assert_eq!(quiz.difficulty_of(2).await, DifficultyPreference::Hard);
        assert!(!quiz.set_difficulty(999, DifficultyPreference::Easy).await);
    }

    #[tokio::test]
    async fn timeout_counts_as_miss_without_experience() {
        let quiz = quiz_with(vec![question(1, "Moscow", "1-hop")]);
        let chat = ChatRef::private(5);
        quiz.register(&profile(5), &chat).await;
        quiz.submit_answer(5, &chat, 1, "Moscow").await.unwrap();

        let report = quiz.record_timeout(5, &chat, 1).await.unwrap();
        assert_eq!(report.correct_answer, "Moscow");
        let stats = quiz.stats(5).await.unwrap();
        assert_eq!(stats.total_questions, 2);
        assert_eq!(stats.streak, 0);
        assert_eq!(stats.experience, 5);
        assert_eq!(stats.today_questions, 1);
    }

    #[tokio::test]
    async fn group_answers_feed_the_group_leaderboard() {
        let quiz = quiz_with(vec![question(1, "Moscow", "1-hop")]);
        let group = ChatRef {
            id: 500,
            is_group: true,
            title: Some("Trivia Club".into()),
        };
        quiz.register(&profile(1), &group).await;
        quiz.register(&profile(2), &group).await;
        quiz.submit_answer(1, &group, 1, "Moscow").await.unwrap();
        quiz.submit_answer(2, &group, 1, "Paris").await.unwrap();
        quiz.submit_answer(2, &group, 1, "Moscow").await.unwrap();

        let report = quiz.group_stats(500, 10).await.unwrap();
        assert_eq!(report.title, "Trivia Club");
        assert_eq!(report.rows[0].user_id, 1);
        assert_eq!(report.rows[1].tally, Tally { correct: 1, total: 2 });
        assert!(quiz.group_stats(501, 10).await.is_none());
    }

    #[tokio::test]
    async fn top_players_sorted_by_rating() {
        let quiz = quiz_with(vec![question(1, "a", "1-hop"), question(2, "b", "count")]);
        let chat = ChatRef::private(1);
        quiz.register(&profile(1), &chat).await;
        quiz.register(&profile(2), &chat).await;
        quiz.submit_answer(1, &chat, 1, "a").await.unwrap();
        quiz.submit_answer(2, &chat, 2, "b").await.unwrap();

        let top = quiz.top_players(10, TopOrder::Rating).await;
        assert_eq!(top[0].user_id, 2);
        assert_eq!(top[1].user_id, 1);
        assert_eq!(quiz.top_players(1, TopOrder::Questions).await.len(), 1);
    }

    #[test]
    fn consecutive_days_follow_the_calendar() {
        let mut store = QuizStore::in_memory();
        let chat = ChatRef::private(1);
        let day1 = Utc::now() - ChronoDuration::days(5);
        let user = register_locked(&mut store, &profile(1), &chat, day1);
        assert_eq!(user.consecutive_days, 1);

        let user = register_locked(&mut store, &profile(1), &chat, day1 + ChronoDuration::days(1));
        assert_eq!(user.consecutive_days, 2);
        let user = register_locked(&mut store, &profile(1), &chat, day1 + ChronoDuration::days(1));
        assert_eq!(user.consecutive_days, 2);

        let user = register_locked(&mut store, &profile(1), &chat, day1 + ChronoDuration::days(4));
        assert_eq!(user.consecutive_days, 1);
    }

    #[test]
    fn accuracy_ordering_breaks_ties_by_volume() {
        assert!(accuracy_rank(9, 10) < accuracy_rank(50, 100));
        // Same accuracy: the larger sample wins.
        assert!(accuracy_rank(1800, 2000) < accuracy_rank(900, 1000));
        // 90.04% rounds to 90.0%.
        assert_eq!(accuracy_rank(2251, 2500).0 .0, 900);
        assert!(accuracy_rank(2251, 2500) < accuracy_rank(1800, 2000));
        assert!(accuracy_rank(0, 0) > accuracy_rank(1, 100));
    }

    fn near_tie_tallies() -> Vec<(UserId, Tally)> {
        (0..60u32)
            .map(|i| {
                let total = 1000 + i * 33;
                let correct = total / 2 + i % 7;
                (u64::from(i) + 1, Tally { correct, total })
            })
            .collect()
    }

    fn assert_accuracy_sorted(rows: &[(u32, u32)]) {
        for pair in rows.windows(2) {
            assert!(accuracy_rank(pair[0].0, pair[0].1) <= accuracy_rank(pair[1].0, pair[1].1));
        }
    }

    #[tokio::test]
    async fn group_leaderboard_sorts_many_near_ties() {
        let quiz = quiz_with(vec![question(1, "Moscow", "1-hop")]);
        let group = ChatRef {
            id: 1,
            is_group: true,
            title: Some("Regulars".into()),
        };
        quiz.register(&profile(1), &group).await;
        {
            let mut store = quiz.store.write().await;
            let entry = store.groups.get_mut(&1).unwrap();
            entry.leaderboard = near_tie_tallies().into_iter().collect();
        }

        let report = quiz.group_stats(1, 100).await.unwrap();
        assert_eq!(report.rows.len(), 60);
        let tallies: Vec<(u32, u32)> =
            report.rows.iter().map(|r| (r.tally.correct, r.tally.total)).collect();
        assert_accuracy_sorted(&tallies);
        assert_eq!(quiz.group_stats(1, 10).await.unwrap().rows.len(), 10);
    }

    #[tokio::test]
    async fn top_by_accuracy_sorts_many_near_ties() {
        let quiz = quiz_with(vec![question(1, "Moscow", "1-hop")]);
        for (id, tally) in near_tie_tallies() {
            quiz.register(&profile(id), &ChatRef::private(id)).await;
            let mut store = quiz.store.write().await;
            let user = store.users.get_mut(&id).unwrap();
            user.correct_answers = tally.correct;
            user.total_questions = tally.total;
        }

        let rows = quiz.top_players(100, TopOrder::Accuracy).await;
        assert_eq!(rows.len(), 60);
        let tallies: Vec<(u32, u32)> =
            rows.iter().map(|r| (r.correct_answers, r.total_questions)).collect();
        assert_accuracy_sorted(&tallies);

        assert_eq!("Accuracy".parse::<TopOrder>().unwrap(), TopOrder::Accuracy);
        assert!("speed".parse::<TopOrder>().is_err());
        let by_volume = quiz.top_players(3, TopOrder::Questions).await;
        assert_eq!(by_volume[0].total_questions, 1000 + 59 * 33);
    }

    #[tokio::test]
    async fn answer_from_unknown_user_is_not_counted() {
        let quiz = quiz_with(vec![question(1, "Moscow", "1-hop")]);
        let chat = ChatRef::private(9);
        assert!(quiz.submit_answer(9, &chat, 1, "Moscow").await.is_none());
        assert!(quiz.can_answer_more(9).await);
        assert_eq!(quiz.store.read().await.daily_count(9, today()), 0);
    }
}
