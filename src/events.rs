//! Broadcast bus for session events pushed to connected clients.

use crate::trivia::{AnswerReveal, Player, QuestionTrimmed, SessionId};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

const DEFAULT_CAPACITY: usize = 256;

/// Something every participant of a session should hear about.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A session was created.
    SessionCreated {
        /// New session.
        session_id: SessionId,
    },
    /// Players joined, left or reconnected.
    RosterChanged {
        /// Affected session.
        session_id: SessionId,
        /// Roster after the change.
        players: Vec<Player>,
    },
    /// A round was revealed. Carries the answer-free question only.
    RoundStarted {
        /// Affected session.
        session_id: SessionId,
        /// 1-based round.
        round: u32,
        /// Question without its answer.
        question: QuestionTrimmed,
    },
    /// The answer countdown began.
    CountdownStarted {
        /// Affected session.
        session_id: SessionId,
        /// Round being counted down.
        round: u32,
        /// Window length in milliseconds.
        window_ms: u64,
    },
    /// The answer window closed.
    AnswersClosed {
        /// Affected session.
        session_id: SessionId,
        /// Closed round.
        round: u32,
    },
    /// The correct answer was revealed.
    AnswerRevealed {
        /// Affected session.
        session_id: SessionId,
        /// Revealed answer.
        reveal: AnswerReveal,
    },
    /// A player was ejected.
    PlayerRemoved {
        /// Affected session.
        session_id: SessionId,
        /// Ejected player.
        player_id: String,
    },
    /// The session reached its terminal state.
    SessionEnded {
        /// Affected session.
        session_id: SessionId,
    },
}

/// Fan-out of [`SessionEvent`]s to any number of subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Creates a bus with the default buffer.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a bus buffering up to `capacity` events per lagging subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event; dropped silently when nobody listens.
    pub fn publish(&self, event: SessionEvent) {
        if self.sender.send(event).is_err() {
            trace!("No event subscribers");
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
