//! Free-text answer checking.
//!
//! After trimming and lower-casing, an answer is correct when it equals,
//! contains, or is contained by any accepted string of the question.

use std::collections::HashSet;

use crate::dataset::types::{AnswerKind, Question};

/// Result of checking one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub is_correct: bool,
    /// The accepted string that matched, lower-cased.
    pub matched: Option<String>,
    /// The answer to show the user.
    pub correct_answer: String,
}

/// All accepted answer strings of a question, lower-cased, first occurrence
/// order, without duplicates.
pub fn candidate_answers(question: &Question) -> Vec<String> {
    let mut raw: Vec<String> = Vec::new();

    if let Some(text) = &question.answer_text {
        raw.push(text.clone());
    }

    for answer in &question.answers {
        match answer.kind {
            AnswerKind::Uri => {
                raw.extend(answer.label.iter().cloned());
                raw.extend(answer.wd_names.ru.iter().cloned());
                raw.extend(answer.wd_names.en.iter().cloned());
                raw.extend(answer.wp_names.iter().cloned());
            }
            AnswerKind::Literal => {
                raw.extend(answer.value_text());
            }
            AnswerKind::Other => {}
        }
    }

    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|s| s.to_lowercase())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// Find the first candidate that the user's answer matches in either
/// containment direction.
pub fn find_match<'a>(candidates: &'a [String], user_answer: &str) -> Option<&'a str> {
    let answer = user_answer.trim().to_lowercase();
    if answer.is_empty() {
        return None;
    }
    candidates
        .iter()
        .map(String::as_str)
        .find(|c| answer == *c || answer.contains(c) || c.contains(answer.as_str()))
}

/// The canonical answer shown after a question: `answer_text`, else the first
/// answer's label or literal value.
pub fn display_answer(question: &Question) -> String {
    if let Some(text) = question.answer_text.as_deref().filter(|t| !t.is_empty()) {
        return text.to_string();
    }
    let Some(first) = question.answers.first() else {
        return String::new();
    };
    match first.kind {
        AnswerKind::Uri => first.label.clone().unwrap_or_default(),
        AnswerKind::Literal => first.value_text().unwrap_or_default(),
        AnswerKind::Other => String::new(),
    }
}

pub fn check_answer(question: &Question, user_answer: &str) -> MatchOutcome {
    let candidates = candidate_answers(question);
    let matched = find_match(&candidates, user_answer).map(str::to_string);
    MatchOutcome {
        is_correct: matched.is_some(),
        matched,
        correct_answer: display_answer(question),
    }
}
