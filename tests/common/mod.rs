#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use quiz_bot::dataset::{PARAGRAPHS_FILE, QUESTIONS_FILE};

/// Fresh directory under the system temp dir.
pub fn temp_dir(tag: &str) -> PathBuf {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!(
        "quiz-bot-it-{}-{}-{}",
        tag,
        std::process::id(),
        seq
    ));
    let _ = std::fs::remove_dir_all(&path);
    std::fs::create_dir_all(&path).unwrap();
    path
}

/// Write a small RuBQ-shaped dataset into `dir`.
pub fn write_dataset(dir: &Path) {
    let questions = r#"[
        {
            "uid": 1,
            "question_text": "Какая столица России?",
            "question_eng": "What is the capital of Russia?",
            "answer_text": "Москва",
            "answers": [
                {"type": "uri", "label": "Москва", "value": "http://www.wikidata.org/entity/Q649",
                 "wd_names": {"ru": ["Москва"], "en": ["Moscow"]}, "wp_names": ["Москва (город)"]}
            ],
            "tags": ["1-hop"],
            "paragraphs_uids": {"with_answer": [100], "all_related": [100, 101]}
        },
        {
            "uid": 2,
            "question_text": "Сколько дней в високосном году?",
            "question_eng": null,
            "answer_text": null,
            "answers": [{"type": "literal", "value": 366}],
            "tags": ["count"],
            "paragraphs_uids": {"with_answer": [], "all_related": []}
        },
        {
            "uid": 3,
            "question_text": "Кто написал «Войну и мир»?",
            "answers": [
                {"type": "uri", "label": "Лев Толстой", "wd_names": {"ru": ["Толстой"], "en": ["Leo Tolstoy"]}}
            ],
            "tags": ["reverse", "1-hop"]
        }
    ]"#;
    let paragraphs = r#"[
        {"uid": 100, "text": "Москва — столица России."},
        {"uid": 101, "text": "Москва стоит на Москве-реке."}
    ]"#;
    std::fs::write(dir.join(QUESTIONS_FILE), questions).unwrap();
    std::fs::write(dir.join(PARAGRAPHS_FILE), paragraphs).unwrap();
}
