//! Trivia Arena library - live multiplayer trivia matches
//!
//! A host drives a session through a fixed number of rounds; contestants
//! answer within a timed window and score by correctness and speed.
//!
//! # Architecture
//!
//! - **Trivia**: questions, answer evaluation, decks, players and the session state machine
//! - **Registry**: concurrent stores of live sessions and connected players
//! - **Events**: broadcast of session changes to every participant
//! - **Server**: MCP tool surface (stdio or HTTP)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use trivia_arena::{JsonQuestionBank, SessionRegistry, TriviaServer};
//!
//! let bank = Arc::new(JsonQuestionBank::new("questions"));
//! let registry = SessionRegistry::new(bank, Duration::from_millis(5_500));
//! let server = TriviaServer::with_registry(registry);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod events;
mod registry;
mod server;
mod trivia;

// Crate-level exports - Configuration
pub use config::{ConfigError, ServerConfig};

// Crate-level exports - Events
pub use events::{EventBus, SessionEvent};

// Crate-level exports - Registries
pub use registry::{ConnectOutcome, PlayerRegistry, SessionFilter, SessionHandle, SessionRegistry};

// Crate-level exports - Server types
pub use server::{
    ConnectionRequest, CreateSessionRequest, JoinHostRequest, JoinSessionRequest,
    ListSessionsRequest, PlayerRequest, RegisterPlayerRequest, SessionActionRequest,
    SessionRequest, SubmitAnswerRequest, TriviaServer,
};

// Crate-level exports - Trivia domain
pub use trivia::{
    AnswerEvaluator, AnswerKey, AnswerReveal, AnswerVerdict, BASE_POINTS, DeckStatus,
    FIRST_CORRECT_BONUS, GameSession, InMemoryQuestionBank, JsonQuestionBank, LeaveOutcome,
    MIN_PLAYERS, Player, PlayerId, Question, QuestionBank, QuestionBankError, QuestionDeck,
    QuestionFormat, QuestionTrimmed, Roster, RoundOutcome, RoundStart, SessionError, SessionId,
    SessionSettings, SessionStatus, SessionSummary, Standing,
};
