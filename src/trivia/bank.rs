//! Question bank sources consumed when a session starts.

use super::question::Question;
use async_trait::async_trait;
use derive_more::{Display, Error};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Source of ordered question lists keyed by question-set identifier.
#[async_trait]
pub trait QuestionBank: std::fmt::Debug + Send + Sync {
    /// Fetches every question of a set, in order.
    ///
    /// # Errors
    ///
    /// Returns [`QuestionBankError`] when the set is missing or malformed.
    async fn fetch(&self, question_set_id: &str) -> Result<Vec<Question>, QuestionBankError>;
}

/// Question bank backed by a directory of `<set>.json` files.
#[derive(Debug, Clone)]
pub struct JsonQuestionBank {
    dir: PathBuf,
}

impl JsonQuestionBank {
    /// Creates a bank reading from `dir`.
    #[instrument(skip(dir), fields(dir = %dir.as_ref().display()))]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        info!("Creating JSON question bank");
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Returns the directory questions are read from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolves a set id to its file, refusing anything that could escape `dir`.
    fn resolve(&self, question_set_id: &str) -> Result<PathBuf, QuestionBankError> {
        let invalid = question_set_id.is_empty()
            || question_set_id.contains(['/', '\\'])
            || question_set_id.contains("..");
        if invalid {
            return Err(QuestionBankError::new(format!(
                "Invalid question set id: {:?}",
                question_set_id
            )));
        }
        Ok(self.dir.join(format!("{}.json", question_set_id)))
    }
}

#[async_trait]
impl QuestionBank for JsonQuestionBank {
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn fetch(&self, question_set_id: &str) -> Result<Vec<Question>, QuestionBankError> {
        let path = self.resolve(question_set_id)?;
        debug!(path = %path.display(), "Reading question set");

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            QuestionBankError::new(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let questions: Vec<Question> = serde_json::from_str(&content).map_err(|e| {
            QuestionBankError::new(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        info!(count = questions.len(), "Question set loaded");
        Ok(questions)
    }
}

/// Question bank holding sets in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQuestionBank {
    sets: HashMap<String, Vec<Question>>,
}

impl InMemoryQuestionBank {
    /// Creates an empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a question set.
    pub fn with_set(mut self, question_set_id: impl Into<String>, questions: Vec<Question>) -> Self {
        self.sets.insert(question_set_id.into(), questions);
        self
    }
}

#[async_trait]
impl QuestionBank for InMemoryQuestionBank {
    async fn fetch(&self, question_set_id: &str) -> Result<Vec<Question>, QuestionBankError> {
        self.sets
            .get(question_set_id)
            .cloned()
            .ok_or_else(|| {
                QuestionBankError::new(format!("Unknown question set: {}", question_set_id))
            })
    }
}

/// Question bank failure with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Question bank error: {} at {}:{}", message, file, line)]
pub struct QuestionBankError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl QuestionBankError {
    /// Creates a new question bank error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
