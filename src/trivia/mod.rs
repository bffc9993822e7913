//! Trivia match domain: questions, decks, rosters and the session state machine.

mod bank;
mod deck;
mod error;
mod evaluator;
mod player;
mod question;
mod session;

pub use bank::{InMemoryQuestionBank, JsonQuestionBank, QuestionBank, QuestionBankError};
pub use deck::{DeckStatus, QuestionDeck};
pub use error::SessionError;
pub use evaluator::AnswerEvaluator;
pub use player::{Player, PlayerId, Roster, Standing};
pub use question::{AnswerKey, AnswerReveal, Question, QuestionFormat, QuestionTrimmed};
pub use session::{
    AnswerVerdict, BASE_POINTS, FIRST_CORRECT_BONUS, GameSession, LeaveOutcome, MIN_PLAYERS,
    RoundOutcome, RoundStart, SessionId, SessionSettings, SessionStatus, SessionSummary,
};
