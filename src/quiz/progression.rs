//! Experience, levels, streaks and rating.

use chrono::{DateTime, Utc};

use super::difficulty::Difficulty;
use crate::store::types::{ResultEntry, User};

pub const MAX_LEVEL: u32 = 20;

const LEVEL_NAMES: [&str; MAX_LEVEL as usize] = [
    "🐛 Caterpillar",
    "🐌 Snail",
    "🐭 Mouse",
    "🐰 Rabbit",
    "🐱 Cat",
    "🐶 Dog",
    "🐺 Wolf",
    "🦊 Fox",
    "🐻 Bear",
    "🐯 Tiger",
    "🦁 Lion",
    "🐉 Dragon",
    "🦅 Eagle",
    "🦈 Shark",
    "🐘 Elephant",
    "🦏 Rhino",
    "🦍 Gorilla",
    "🐲 Dragon Lord",
    "👑 King of Beasts",
    "🌟 QUIZ GOD",
];

/// Experience for a correct / incorrect answer at a given difficulty.
pub fn experience_reward(difficulty: Difficulty, is_correct: bool) -> u32 {
    match (difficulty, is_correct) {
        (Difficulty::Easy, true) => 5,
        (Difficulty::Easy, false) => 1,
        (Difficulty::Medium, true) => 10,
        (Difficulty::Medium, false) => 2,
        (Difficulty::Hard, true) => 20,
        (Difficulty::Hard, false) => 4,
    }
}

/// Rating weight of one correct answer.
pub fn rating_weight(difficulty: Difficulty) -> u32 {
    match difficulty {
        Difficulty::Easy => 5,
        Difficulty::Medium => 10,
        Difficulty::Hard => 20,
    }
}

/// Experience needed to leave `level`.
pub fn experience_for_level(level: u32) -> u32 {
    level * 100
}

pub fn level_name(level: u32) -> &'static str {
    let idx = level.clamp(1, MAX_LEVEL) as usize - 1;
    LEVEL_NAMES[idx]
}

/// Percentage of correct answers, 0 when nothing was answered.
pub fn accuracy(correct: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    }
}

/// Add experience and apply level-ups. Users at [`MAX_LEVEL`] gain nothing.
/// Returns the experience actually added and whether the level changed.
pub fn add_experience(user: &mut User, gain: u32) -> (u32, bool) {
    if user.level >= MAX_LEVEL {
        return (0, false);
    }
    user.level = user.level.max(1);
    user.experience += gain;

    let mut leveled_up = false;
    while user.level < MAX_LEVEL && user.experience >= experience_for_level(user.level) {
        user.experience -= experience_for_level(user.level);
        user.level += 1;
        leveled_up = true;
    }
    (gain, leveled_up)
}

/// What one answer changed for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub experience_gained: u32,
    pub rating_gained: u32,
    pub leveled_up: bool,
}

/// Apply one answered question to the user's counters.
pub fn apply_answer(
    user: &mut User,
    is_correct: bool,
    difficulty: Difficulty,
    now: DateTime<Utc>,
) -> AnswerOutcome {
    user.total_questions += 1;
    let (experience_gained, leveled_up) =
        add_experience(user, experience_reward(difficulty, is_correct));

    if is_correct {
        user.correct_answers += 1;
        user.streak += 1;
        user.best_streak = user.best_streak.max(user.streak);
    } else {
        user.streak = 0;
    }
    user.last_question_date = Some(now);

    AnswerOutcome {
        experience_gained,
        rating_gained: if is_correct { rating_weight(difficulty) } else { 0 },
        leveled_up,
    }
}

/// A question that ran out of time counts as asked and breaks the streak,
/// without any experience.
pub fn apply_timeout(user: &mut User, now: DateTime<Utc>) {
    user.total_questions += 1;
    user.streak = 0;
    user.last_question_date = Some(now);
}

/// Rating: weighted correct answers + `best_streak * 5` + `floor(accuracy) * 2`.
/// Users without result history fall back to `correct_answers * 10`.
pub fn calculate_rating(user: &User, results: &[ResultEntry]) -> u32 {
    let base: u32 = if results.is_empty() {
        user.correct_answers * 10
    } else {
        results
            .iter()
            .filter(|r| r.is_correct)
            .map(|r| r.difficulty.map(rating_weight).unwrap_or(10))
            .sum()
    };
    let streak_bonus = user.best_streak * 5;
    let accuracy_bonus = accuracy(user.correct_answers, user.total_questions).floor() as u32 * 2;
    base + streak_bonus + accuracy_bonus
}

/// Experience needed for the next level and percent progress towards it.
/// At the cap the progress is always 100.
pub fn level_progress(user: &User) -> (u32, u32) {
    if user.level >= MAX_LEVEL {
        return (experience_for_level(MAX_LEVEL), 100);
    }
    let needed = experience_for_level(user.level.max(1));
    let progress = (user.experience as f64 / needed as f64 * 100.0).round() as u32;
    (needed, progress.min(100))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(1, Utc::now())
    }

    fn result(is_correct: bool, difficulty: Option<Difficulty>) -> ResultEntry {
        ResultEntry {
            date: Utc::now(),
            is_correct,
            question_id: None,
            chat_id: None,
            difficulty,
            timeout: false,
        }
    }

    #[test]
    fn reward_table() {
        assert_eq!(experience_reward(Difficulty::Easy, true), 5);
        assert_eq!(experience_reward(Difficulty::Medium, false), 2);
        assert_eq!(experience_reward(Difficulty::Hard, true), 20);
        assert_eq!(experience_reward(Difficulty::Hard, false), 4);
        assert_eq!(rating_weight(Difficulty::Easy), 5);
    }

    #[test]
    fn level_up_keeps_the_remainder() {
        let mut u = user();
        u.experience = 95;
        let (gained, up) = add_experience(&mut u, 10);
        assert_eq!(gained, 10);
        assert!(up);
        assert_eq!(u.level, 2);
        assert_eq!(u.experience, 5);
    }

    #[test]
    fn remainder_equals_old_minus_threshold_for_every_level() {
        for level in 1..MAX_LEVEL {
            let mut u = user();
            u.level = level;
            let threshold = experience_for_level(level);
            u.experience = threshold - 3;
            add_experience(&mut u, 20);
            assert_eq!(u.level, level + 1);
            assert_eq!(u.experience, threshold - 3 + 20 - threshold);
        }
    }

    #[test]
    fn no_gains_at_the_cap() {
        let mut u = user();
        u.level = MAX_LEVEL;
        u.experience = 40;
        assert_eq!(add_experience(&mut u, 20), (0, false));
        assert_eq!(u.experience, 40);
        assert_eq!(level_progress(&u), (2000, 100));
    }

    #[test]
    fn reaching_the_cap_stops_there() {
        let mut u = user();
        u.level = MAX_LEVEL - 1;
        u.experience = experience_for_level(MAX_LEVEL - 1) - 1;
        let (_, up) = add_experience(&mut u, 20);
        assert!(up);
        assert_eq!(u.level, MAX_LEVEL);
        assert_eq!(u.experience, 19);
    }

    #[test]
    fn streak_resets_and_best_streak_never_drops() {
        let mut u = user();
        let now = Utc::now();
        let pattern = [true, true, true, false, true, false, false, true, true];
        let mut best_seen = 0;
        for correct in pattern {
            apply_answer(&mut u, correct, Difficulty::Medium, now);
            assert!(u.best_streak >= best_seen);
            best_seen = u.best_streak;
            if !correct {
                assert_eq!(u.streak, 0);
            }
        }
        assert_eq!(u.best_streak, 3);
        assert_eq!(u.streak, 2);
        assert_eq!(u.total_questions, 9);
        assert_eq!(u.correct_answers, 6);
    }

    #[test]
    fn rating_only_for_correct_answers() {
        let mut u = user();
        let now = Utc::now();
        assert_eq!(apply_answer(&mut u, true, Difficulty::Hard, now).rating_gained, 20);
        assert_eq!(apply_answer(&mut u, false, Difficulty::Hard, now).rating_gained, 0);
    }

    #[test]
    fn timeout_breaks_streak_without_experience() {
        let mut u = user();
        u.streak = 4;
        u.experience = 30;
        apply_timeout(&mut u, Utc::now());
        assert_eq!(u.streak, 0);
        assert_eq!(u.experience, 30);
        assert_eq!(u.total_questions, 1);
    }

    #[test]
    fn rating_combines_weights_streak_and_accuracy() {
        let mut u = user();
        u.total_questions = 3;
        u.correct_answers = 2;
        u.best_streak = 2;
        let results = vec![
            result(true, Some(Difficulty::Hard)),
            result(true, None),
            result(false, Some(Difficulty::Easy)),
        ];
        // 20 + 10 + 2*5 + floor(66.6)*2
        assert_eq!(calculate_rating(&u, &results), 20 + 10 + 10 + 132);
    }

    #[test]
    fn rating_falls_back_without_history() {
        let mut u = user();
        u.total_questions = 4;
        u.correct_answers = 4;
        assert_eq!(calculate_rating(&u, &[]), 40 + 200);
    }

    #[test]
    fn accuracy_example_from_nineteen_of_twenty() {
        assert_eq!(accuracy(19, 20), 95.0);
        assert_eq!(accuracy(0, 0), 0.0);
    }

    #[test]
    fn level_names_are_clamped() {
        assert_eq!(level_name(0), "🐛 Caterpillar");
        assert_eq!(level_name(20), "🌟 QUIZ GOD");
        assert_eq!(level_name(99), "🌟 QUIZ GOD");
    }

    #[test]
    fn progress_is_rounded_percent() {
        let mut u = user();
        u.level = 2;
        u.experience = 50;
        assert_eq!(level_progress(&u), (200, 25));
    }
}
