use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use super::difficulty::Difficulty;
use crate::dataset::types::{Question, QuestionId};

/// How many of the most recent questions are skipped when choosing.
pub const RECENT_WINDOW: usize = 50;

/// Pick a random question.
///
/// Tries, in order: unseen questions in the bucket, any question in the
/// bucket, any question at all. `recent` is the user's history, oldest first;
/// only its last [`RECENT_WINDOW`] entries are excluded.
pub fn select<'a, R: Rng + ?Sized>(
    questions: &'a [Question],
    recent: &[QuestionId],
    bucket: Option<Difficulty>,
    rng: &mut R,
) -> Option<&'a Question> {
    let window = &recent[recent.len().saturating_sub(RECENT_WINDOW)..];
    let seen: HashSet<QuestionId> = window.iter().copied().collect();
    let in_bucket = |q: &Question| bucket.map_or(true, |b| Difficulty::of(q) == b);

    let fresh: Vec<&Question> = questions
        .iter()
        .filter(|q| !seen.contains(&q.uid) && in_bucket(*q))
        .collect();
    if let Some(q) = fresh.choose(rng) {
        return Some(*q);
    }

    let bucketed: Vec<&Question> = questions.iter().filter(|q| in_bucket(*q)).collect();
    if let Some(q) = bucketed.choose(rng) {
        return Some(*q);
    }

    questions.choose(rng)
}
