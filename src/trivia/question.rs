//! Question records and their answer-free projection.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::str::FromStr;
use strum::{Display, EnumString};

/// Answer format of a question, selecting the correctness rule.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "String")]
pub enum QuestionFormat {
    /// Pick one of the listed choices.
    MultipleChoice,
    /// Answer is a single letter token.
    Letter,
    /// Answer is an ordered, comma-separated sequence.
    Order,
    /// Answer is an integer.
    Number,
    /// Answer must match exactly.
    #[default]
    Exact,
}

// Unknown or missing formats fall back to exact matching.
impl From<String> for QuestionFormat {
    fn from(raw: String) -> Self {
        QuestionFormat::from_str(raw.trim()).unwrap_or_default()
    }
}

/// Canonical answer as stored in a question file.
///
/// ORDER answers show up both as `"A,B,C"` and as `["A", "B", "C"]`; both
/// shapes are accepted and normalised by [`AnswerKey::tokens`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerKey {
    /// Plain string answer.
    Text(String),
    /// Pre-split sequence answer.
    Sequence(Vec<String>),
}

impl AnswerKey {
    /// Returns the answer as a single string. Sequences are joined with commas.
    pub fn canonical(&self) -> Cow<'_, str> {
        match self {
            AnswerKey::Text(text) => Cow::Borrowed(text.as_str()),
            AnswerKey::Sequence(items) => Cow::Owned(items.join(",")),
        }
    }

    /// Returns the answer as a sequence of trimmed tokens.
    pub fn tokens(&self) -> Vec<String> {
        match self {
            AnswerKey::Text(text) => split_sequence(text),
            AnswerKey::Sequence(items) => items.iter().map(|s| s.trim().to_string()).collect(),
        }
    }
}

impl From<&str> for AnswerKey {
    fn from(text: &str) -> Self {
        AnswerKey::Text(text.to_string())
    }
}

impl From<String> for AnswerKey {
    fn from(text: String) -> Self {
        AnswerKey::Text(text)
    }
}

impl From<Vec<String>> for AnswerKey {
    fn from(items: Vec<String>) -> Self {
        AnswerKey::Sequence(items)
    }
}

/// Splits a comma-delimited answer into trimmed tokens.
pub(crate) fn split_sequence(raw: &str) -> Vec<String> {
    raw.split(',').map(|s| s.trim().to_string()).collect()
}

fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A single trivia question, answer included.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct Question {
    /// Question identifier.
    #[serde(default = "generate_id")]
    id: String,
    /// Prompt shown to contestants.
    #[serde(rename = "question")]
    prompt: String,
    /// Answer format.
    #[serde(rename = "type", default)]
    format: QuestionFormat,
    /// Optional list of choices.
    #[serde(rename = "options", default)]
    choices: Option<Vec<String>>,
    /// Canonical answer.
    answer: AnswerKey,
    /// Optional long-form explanation revealed with the answer.
    #[serde(rename = "full_answer", default)]
    explanation: Option<String>,
    /// Optional image reference.
    #[serde(default)]
    image: Option<String>,
}

impl Question {
    /// Creates a question with a generated id and no choices, explanation or image.
    pub fn new(
        prompt: impl Into<String>,
        format: QuestionFormat,
        answer: impl Into<AnswerKey>,
    ) -> Self {
        Self {
            id: generate_id(),
            prompt: prompt.into(),
            format,
            choices: None,
            answer: answer.into(),
            explanation: None,
            image: None,
        }
    }

    /// Sets the choice list.
    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the long-form explanation.
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    /// Sets the image reference.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Returns the answer-free projection sent to contestants.
    pub fn trimmed(&self) -> QuestionTrimmed {
        QuestionTrimmed {
            id: self.id.clone(),
            prompt: self.prompt.clone(),
            format: self.format,
            choices: self.choices.clone(),
            image: self.image.clone(),
        }
    }

    /// Returns the canonical answer and explanation.
    pub fn reveal(&self) -> AnswerReveal {
        AnswerReveal {
            question_id: self.id.clone(),
            answer: self.answer.canonical().into_owned(),
            explanation: self.explanation.clone(),
        }
    }
}

/// Question without its answer.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct QuestionTrimmed {
    id: String,
    #[serde(rename = "question")]
    prompt: String,
    #[serde(rename = "type")]
    format: QuestionFormat,
    #[serde(rename = "options")]
    choices: Option<Vec<String>>,
    image: Option<String>,
}

/// Correct answer for a round, as revealed after the window closes.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct AnswerReveal {
    question_id: String,
    answer: String,
    #[serde(rename = "full_answer")]
    explanation: Option<String>,
}
