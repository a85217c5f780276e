pub mod types;

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use types::{Paragraph, ParagraphId, Question, QuestionId};

pub const QUESTIONS_FILE: &str = "RuBQ_2.0_test.json";
pub const PARAGRAPHS_FILE: &str = "RuBQ_2.0_paragraphs.json";

/// Hints show this many characters of the first related paragraph.
pub const HINT_CHARS: usize = 500;

/// Read-only question and paragraph set, loaded once at startup.
#[derive(Debug, Default)]
pub struct Dataset {
    questions: Vec<Question>,
    by_uid: HashMap<QuestionId, usize>,
    paragraphs: HashMap<ParagraphId, Paragraph>,
}

impl Dataset {
    pub fn new(questions: Vec<Question>, paragraphs: Vec<Paragraph>) -> Self {
        let by_uid = questions
            .iter()
            .enumerate()
            .map(|(i, q)| (q.uid, i))
            .collect();
        let paragraphs = paragraphs.into_iter().map(|p| (p.uid, p)).collect();
        Self {
            questions,
            by_uid,
            paragraphs,
        }
    }

    /// Load both dataset files from `dir`. Never fails: a missing or broken
    /// file leaves that part of the dataset empty.
    pub fn load(dir: &Path) -> Self {
        let questions = match read_records::<Question>(&dir.join(QUESTIONS_FILE)) {
            Ok(questions) => {
                info!(count = questions.len(), "Questions loaded");
                questions
            }
            Err(e) => {
                warn!("Questions not loaded, continuing with an empty set: {:#}", e);
                Vec::new()
            }
        };

        let paragraphs = match read_records::<Paragraph>(&dir.join(PARAGRAPHS_FILE)) {
            Ok(paragraphs) => {
                info!(count = paragraphs.len(), "Paragraphs loaded");
                paragraphs
            }
            Err(e) => {
                warn!("Paragraphs not loaded: {:#}", e);
                Vec::new()
            }
        };

        Self::new(questions, paragraphs)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn get(&self, uid: QuestionId) -> Option<&Question> {
        self.by_uid.get(&uid).map(|&i| &self.questions[i])
    }

    pub fn paragraph(&self, uid: ParagraphId) -> Option<&Paragraph> {
        self.paragraphs.get(&uid)
    }

    /// Opening of the first known related paragraph, falling back to the
    /// answer-bearing ones.
    pub fn hint(&self, question: &Question) -> Option<String> {
        let refs = &question.paragraphs_uids;
        refs.all_related
            .iter()
            .chain(refs.with_answer.iter())
            .find_map(|uid| self.paragraph(*uid))
            .map(|p| format!("{}...", clip(&p.text, HINT_CHARS)))
    }

    /// Number of questions carrying each tag.
    pub fn tag_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for tag in self.questions.iter().flat_map(|q| q.tags.iter()) {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
        counts
    }
}

fn read_records<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&data).with_context(|| format!("Failed to parse {:?}", path))
}

/// The first `max_chars` characters of `text`, cut on a char boundary.
pub fn clip(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
