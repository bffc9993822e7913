//! The ordered, immutable question deck owned by one session.

use super::bank::QuestionBank;
use super::question::Question;
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Outcome of loading a deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeckStatus {
    /// Questions were fetched from the bank.
    Loaded,
    /// The bank failed; the deck holds zero questions.
    LoadFailed {
        /// Why the bank failed.
        reason: String,
    },
}

/// Ordered question sequence for one session.
///
/// Built once by [`QuestionDeck::load`] and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct QuestionDeck {
    source_id: String,
    requested_rounds: u32,
    status: DeckStatus,
    questions: Vec<Question>,
}

impl QuestionDeck {
    /// Loads a deck from `bank`, keeping at most `requested_rounds` questions.
    ///
    /// A bank failure never propagates: the deck is returned loaded with zero
    /// questions and [`DeckStatus::LoadFailed`].
    #[instrument(skip(bank))]
    pub async fn load(bank: &dyn QuestionBank, source_id: &str, requested_rounds: u32) -> Self {
        match bank.fetch(source_id).await {
            Ok(questions) => Self::from_questions(source_id, requested_rounds, questions),
            Err(e) => {
                warn!(error = %e, "Question set unavailable, continuing with an empty deck");
                Self::failed(source_id, requested_rounds, e.message)
            }
        }
    }

    /// Builds a loaded deck, truncating to `requested_rounds`.
    pub fn from_questions(
        source_id: impl Into<String>,
        requested_rounds: u32,
        mut questions: Vec<Question>,
    ) -> Self {
        questions.truncate(requested_rounds as usize);
        let source_id = source_id.into();
        info!(
            source_id = %source_id,
            requested_rounds,
            available = questions.len(),
            "Deck loaded"
        );
        Self {
            source_id,
            requested_rounds,
            status: DeckStatus::Loaded,
            questions,
        }
    }

    /// Builds an empty deck recording a load failure.
    pub fn failed(
        source_id: impl Into<String>,
        requested_rounds: u32,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            requested_rounds,
            status: DeckStatus::LoadFailed {
                reason: reason.into(),
            },
            questions: Vec::new(),
        }
    }

    /// Question set this deck was loaded from.
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Rounds originally asked for.
    pub fn requested_rounds(&self) -> u32 {
        self.requested_rounds
    }

    /// Load outcome.
    pub fn status(&self) -> &DeckStatus {
        &self.status
    }

    /// Number of playable rounds, never more than requested.
    pub fn rounds(&self) -> u32 {
        // Truncated to requested_rounds, so this fits in u32.
        self.questions.len() as u32
    }

    /// Returns the question for 1-based `round`, if the deck has one.
    pub fn question(&self, round: u32) -> Option<&Question> {
        if round == 0 || round > self.rounds() {
            return None;
        }
        self.questions.get(round as usize - 1)
    }
}
