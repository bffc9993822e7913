//! Precondition failures reported by sessions and registries.

use derive_more::{Display, Error};

/// Why a session or registry operation was refused.
///
/// Every variant leaves the targeted state unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum SessionError {
    /// No session with this id.
    #[display("Session not found: {session_id}")]
    SessionNotFound {
        /// Requested session id.
        session_id: String,
    },
    /// No player with this id in the session or registry.
    #[display("Player not found: {player_id}")]
    PlayerNotFound {
        /// Requested player id.
        player_id: String,
    },
    /// Session was already started or has ended.
    #[display("Session {name} is already started or finished")]
    AlreadyStarted {
        /// Session name.
        name: String,
    },
    /// Session has ended; nothing more can happen in it.
    #[display("Session {name} has ended")]
    Ended {
        /// Session name.
        name: String,
    },
    /// Session is not running.
    #[display("Session {name} is not in progress")]
    NotInProgress {
        /// Session name.
        name: String,
    },
    /// Too few contestants to start.
    #[display("Session needs at least {required} players, has {present}")]
    NotEnoughPlayers {
        /// Minimum roster size.
        required: usize,
        /// Current roster size.
        present: usize,
    },
    /// Round state queried before the deck was loaded.
    #[display("Questions not loaded")]
    DeckNotLoaded,
    /// No round has been revealed yet.
    #[display("No round has started")]
    NoActiveRound,
    /// The answer window is closed.
    #[display("Answers are closed for round {round}")]
    AnswersClosed {
        /// Current round.
        round: u32,
    },
    /// The player already answered this round.
    #[display("Player {player_id} already answered round {round}")]
    AlreadyAnswered {
        /// Answering player.
        player_id: String,
        /// Current round.
        round: u32,
    },
    /// Mid-game join without a disconnected entry of the same name.
    #[display("Session {name} is in progress and has no disconnected seat for {player_name}")]
    NoSeatToReclaim {
        /// Session name.
        name: String,
        /// Joining player's name.
        player_name: String,
    },
    /// The player is already on this roster.
    #[display("Player {player_id} already joined")]
    AlreadyJoined {
        /// Joining player.
        player_id: String,
    },
    /// Host password mismatch.
    #[display("Wrong password")]
    WrongPassword,
    /// Contestant join code mismatch.
    #[display("Wrong code")]
    WrongJoinCode,
    /// The host slot is taken.
    #[display("Session already has a host")]
    HostPresent,
    /// A session with this name exists.
    #[display("Session with name {name} already exists")]
    DuplicateName {
        /// Requested name.
        name: String,
    },
    /// The connection already registered a player.
    #[display("Connection is already logged in as {name}")]
    AlreadyRegistered {
        /// Name registered on this connection.
        name: String,
    },
    /// The name is held by a live connection.
    #[display("Player {name} is already connected on another device")]
    NameInUse {
        /// Requested name.
        name: String,
    },
}
