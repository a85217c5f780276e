//! HTTP API as plain handler functions: request in, `(status, JSON)` out.
//! Any HTTP server can mount [`handle`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::dataset::types::{Question, QuestionId};
use crate::dataset::Dataset;
use crate::quiz::difficulty::{Difficulty, DifficultyPreference};
use crate::quiz::{matcher, selector};

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok<T: Serialize>(body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self { status: 200, body },
            Err(e) => Self::error(500, &format!("Failed to encode response: {}", e)),
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }
}

/// A question without its answers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionView {
    pub uid: QuestionId,
    pub question_text: String,
    pub question_eng: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hint_paragraph: Option<String>,
}

impl QuestionView {
    fn new(question: &Question) -> Self {
        Self {
            uid: question.uid,
            question_text: question.question_text.clone(),
            question_eng: question.question_eng.clone().unwrap_or_default(),
            tags: question.tags.clone(),
            hint_paragraph: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckAnswerRequest {
    #[serde(default)]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckAnswerResponse {
    pub correct: bool,
    pub correct_answer: String,
    pub matched_answer: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DifficultyCounts {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatsResponse {
    pub total_questions: usize,
    pub tags: std::collections::BTreeMap<String, usize>,
    pub difficulty: DifficultyCounts,
}

/// `GET /api/question/random?difficulty=`. Unknown values and `all` mean no
/// filter; an empty bucket falls back to every question.
pub fn random_question(dataset: &Dataset, difficulty: Option<&str>) -> ApiResponse {
    if dataset.is_empty() {
        return ApiResponse::error(500, "Questions are not loaded");
    }
    let bucket = difficulty
        .and_then(|d| d.parse::<DifficultyPreference>().ok())
        .and_then(|p| p.bucket());

    let Some(question) =
        selector::select(dataset.questions(), &[], bucket, &mut rand::thread_rng())
    else {
        return ApiResponse::error(500, "No questions available for this difficulty");
    };

    let mut view = QuestionView::new(question);
    view.hint_paragraph = dataset.hint(question);
    ApiResponse::ok(&view)
}

/// `GET /api/question/{uid}`.
pub fn question(dataset: &Dataset, uid: &str) -> ApiResponse {
    let uid = match parse_uid(uid) {
        Ok(uid) => uid,
        Err(resp) => return resp,
    };
    match dataset.get(uid) {
        Some(q) => ApiResponse::ok(&QuestionView::new(q)),
        None => ApiResponse::error(404, "Question not found"),
    }
}

/// `POST /api/check-answer/{uid}` with `{"answer": ".."}`. A missing answer
/// is checked as empty, which never matches.
pub fn check_answer(dataset: &Dataset, uid: &str, request: &CheckAnswerRequest) -> ApiResponse {
    let uid = match parse_uid(uid) {
        Ok(uid) => uid,
        Err(resp) => return resp,
    };
    let Some(q) = dataset.get(uid) else {
        return ApiResponse::error(404, "Question not found");
    };
    let outcome = matcher::check_answer(q, request.answer.as_deref().unwrap_or_default());
    debug!(question_uid = uid, correct = outcome.is_correct, "API answer checked");
    ApiResponse::ok(&CheckAnswerResponse {
        correct: outcome.is_correct,
        correct_answer: outcome.correct_answer,
        matched_answer: outcome.matched,
    })
}

/// `GET /api/stats`.
pub fn stats(dataset: &Dataset) -> ApiResponse {
    let mut difficulty = DifficultyCounts::default();
    for q in dataset.questions() {
        match Difficulty::of(q) {
            Difficulty::Easy => difficulty.easy += 1,
            Difficulty::Medium => difficulty.medium += 1,
            Difficulty::Hard => difficulty.hard += 1,
        }
    }
    ApiResponse::ok(&StatsResponse {
        total_questions: dataset.len(),
        tags: dataset.tag_counts(),
        difficulty,
    })
}

/// Route a request. `path` may carry a query string.
pub fn handle(dataset: &Dataset, method: &str, path: &str, body: &str) -> ApiResponse {
    let (path, query) = path.split_once('?').unwrap_or((path, ""));
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (method.to_ascii_uppercase().as_str(), segments.as_slice()) {
        ("GET", ["api", "question", "random"]) => {
            random_question(dataset, query_param(query, "difficulty").as_deref())
        }
        ("GET", ["api", "question", uid]) => question(dataset, uid),
        ("POST", ["api", "check-answer", uid]) => {
            let request = if body.trim().is_empty() {
                CheckAnswerRequest::default()
            } else {
                match serde_json::from_str::<CheckAnswerRequest>(body) {
                    Ok(request) => request,
                    Err(e) => {
                        warn!("Rejected check-answer body: {}", e);
                        return ApiResponse::error(400, "Invalid JSON body");
                    }
                }
            };
            check_answer(dataset, uid, &request)
        }
        ("GET", ["api", "stats"]) => stats(dataset),
        _ => ApiResponse::error(404, "Not found"),
    }
}

fn parse_uid(raw: &str) -> Result<QuestionId, ApiResponse> {
    raw.trim()
        .parse()
        .map_err(|_| ApiResponse::error(400, "Question id must be an integer"))
}

/// First value of `key` in a urlencoded query string, decoded.
fn query_param(query: &str, key: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| url_decode(k) == key)
        .map(|(_, v)| url_decode(v))
}

/// `+` becomes a space and `%XX` a byte; malformed escapes pass through.
fn url_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len()
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit() =>
            {
                let hex = &raw[i + 1..i + 3];
                out.push(u8::from_str_radix(hex, 16).unwrap_or(b'?'));
                i += 2;
            }
            other => out.push(other),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
