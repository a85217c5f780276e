use serde::{Deserialize, Deserializer, Serialize};

/// Question identifier as it appears in the dataset (`uid`).
pub type QuestionId = u64;
/// Paragraph identifier as it appears in the dataset (`uid`).
pub type ParagraphId = u64;

/// Treat an explicit JSON `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A question record from `RuBQ_2.0_test.json`. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub uid: QuestionId,
    pub question_text: String,
    #[serde(default)]
    pub question_eng: Option<String>,
    #[serde(default)]
    pub answer_text: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub answers: Vec<Answer>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub paragraphs_uids: ParagraphRefs,
}

impl Question {
    pub fn has_answer_paragraphs(&self) -> bool {
        !self.paragraphs_uids.with_answer.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerKind {
    /// Knowledge-base entity; matched by label and localized aliases.
    Uri,
    /// Plain value (date, number, string); matched by `value`.
    Literal,
    #[serde(other)]
    Other,
}

/// One accepted answer of a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    #[serde(rename = "type")]
    pub kind: AnswerKind,
    #[serde(default)]
    pub label: Option<String>,
    /// URI for entities, string or number for literals.
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub wd_names: LocalizedNames,
    #[serde(default, deserialize_with = "null_as_default")]
    pub wp_names: Vec<String>,
}

impl Answer {
    /// The literal value rendered the way it reads in text.
    pub fn value_text(&self) -> Option<String> {
        match self.value.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Wikidata aliases, per language.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalizedNames {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ru: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub en: Vec<String>,
}

/// Paragraph references attached to a question.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParagraphRefs {
    /// Paragraphs that contain the answer.
    #[serde(default, deserialize_with = "null_as_default")]
    pub with_answer: Vec<ParagraphId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub all_related: Vec<ParagraphId>,
}

/// A paragraph record from `RuBQ_2.0_paragraphs.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paragraph {
    pub uid: ParagraphId,
    pub text: String,
}
