//! Trivia session lifecycle state machine.
//!
//! A session moves `NotStarted -> InProgress -> Ended` and never leaves
//! `Ended`. Every method either applies its whole effect or returns a
//! [`SessionError`] with the session untouched. Callers serialize access per
//! session (see `SessionRegistry`), so methods take `&mut self` freely.

use super::bank::QuestionBank;
use super::deck::QuestionDeck;
use super::error::SessionError;
use super::evaluator::AnswerEvaluator;
use super::player::{Player, PlayerId, Roster, Standing};
use super::question::{AnswerReveal, Question, QuestionTrimmed};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::{debug, info, instrument, warn};

/// Unique identifier for a session.
pub type SessionId = String;

/// Contestants required before a session can start.
pub const MIN_PLAYERS: usize = 2;

/// Points for a correct answer.
pub const BASE_POINTS: u32 = 1;

/// Extra point for the first correct answer of a round.
pub const FIRST_CORRECT_BONUS: u32 = 1;

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Accepting contestants.
    NotStarted,
    /// Rounds are being played.
    InProgress,
    /// Terminal.
    Ended,
}

/// Parameters for creating a session.
#[derive(Debug, Clone, new)]
pub struct SessionSettings {
    /// Display name.
    pub name: String,
    /// Requested number of rounds.
    pub rounds: u32,
    /// Password gating host entry.
    pub password: String,
    /// Code gating contestant entry.
    pub join_code: String,
    /// Question set to load at start.
    pub question_set_id: String,
    /// Initial host, if any.
    pub host_id: Option<PlayerId>,
}

/// A freshly revealed round.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize)]
pub struct RoundStart {
    /// 1-based round number.
    round: u32,
    /// Answer-free question for contestants.
    question: QuestionTrimmed,
    /// Full question for the host display.
    full: Question,
}

/// Result of advancing to the next round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RoundOutcome {
    /// A new round is open for answers.
    Started(RoundStart),
    /// The deck is exhausted and the session has ended.
    Ended,
}

impl RoundOutcome {
    /// Returns the round if one started.
    pub fn round(&self) -> Option<&RoundStart> {
        match self {
            RoundOutcome::Started(start) => Some(start),
            RoundOutcome::Ended => None,
        }
    }
}

/// What `leave` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveOutcome {
    /// The leaver was the host; the host slot is now empty.
    HostCleared,
    /// The contestant was marked disconnected.
    Disconnected,
}

/// Result of an accepted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, Serialize)]
pub struct AnswerVerdict {
    /// Round the answer counted for.
    round: u32,
    /// Whether the answer was correct.
    correct: bool,
    /// Whether it earned the first-correct bonus.
    first_correct: bool,
    /// Points awarded.
    points: u32,
}

/// Listing projection of a session. Never carries secrets or the host id.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Display name.
    name: String,
    /// Session id.
    id: SessionId,
    /// Playable rounds.
    rounds: u32,
    /// Roster size, connected or not.
    player_count: usize,
    /// Lifecycle status.
    status: SessionStatus,
    /// Creation time.
    created_at: DateTime<Utc>,
    /// Question set the deck is drawn from.
    question_set_id: String,
    /// Last revealed round, 0 before the first.
    current_round: u32,
}

/// One trivia match.
#[derive(Debug)]
pub struct GameSession {
    id: SessionId,
    name: String,
    status: SessionStatus,
    requested_rounds: u32,
    rounds: u32,
    current_round: u32,
    password: String,
    join_code: String,
    question_set_id: String,
    host_id: Option<PlayerId>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    answers_open: bool,
    first_correct_claimed: bool,
    roster: Roster,
    deck: Option<QuestionDeck>,
}

impl GameSession {
    /// Creates a session in `NotStarted` with an empty roster and no deck.
    #[instrument(skip(settings), fields(name = %settings.name, rounds = settings.rounds))]
    pub fn new(id: SessionId, settings: SessionSettings) -> Self {
        info!(session_id = %id, "Creating trivia session");
        Self {
            id,
            name: settings.name,
            status: SessionStatus::NotStarted,
            requested_rounds: settings.rounds,
            rounds: settings.rounds,
            current_round: 0,
            password: settings.password,
            join_code: settings.join_code,
            question_set_id: settings.question_set_id,
            host_id: settings.host_id,
            created_at: Utc::now(),
            started_at: None,
            answers_open: false,
            first_correct_claimed: false,
            roster: Roster::new(),
            deck: None,
        }
    }

    /// Session id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lifecycle status.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Playable rounds; shrinks to the deck size at start.
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Rounds asked for at creation.
    pub fn requested_rounds(&self) -> u32 {
        self.requested_rounds
    }

    /// Current 1-based round, 0 before the first reveal.
    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    /// Question set identifier.
    pub fn question_set_id(&self) -> &str {
        &self.question_set_id
    }

    /// Current host, if any.
    pub fn host_id(&self) -> Option<&str> {
        self.host_id.as_deref()
    }

    /// Creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Start time, once started.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Whether answers are currently accepted.
    pub fn answers_open(&self) -> bool {
        self.answers_open
    }

    /// Contestants.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Loaded deck, if the session has started.
    pub fn deck(&self) -> Option<&QuestionDeck> {
        self.deck.as_ref()
    }

    /// Checks the host password.
    pub fn password_matches(&self, password: &str) -> bool {
        self.password == password
    }

    /// Checks the contestant join code.
    pub fn join_code_matches(&self, code: &str) -> bool {
        self.join_code == code
    }

    /// Listing projection.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            name: self.name.clone(),
            id: self.id.clone(),
            rounds: self.rounds,
            player_count: self.roster.len(),
            status: self.status,
            created_at: self.created_at,
            question_set_id: self.question_set_id.clone(),
            current_round: self.current_round,
        }
    }

    /// Adds a contestant.
    ///
    /// Before the start anyone is appended. While in progress the join only
    /// succeeds by reclaiming a disconnected entry with the same name; the
    /// entry takes the new connection id and keeps its score and round state.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoSeatToReclaim`] mid-game without a matching seat,
    /// [`SessionError::Ended`] once the session is over.
    #[instrument(skip(self, player), fields(session_id = %self.id, player_id = %player.id(), player_name = %player.name()))]
    pub fn join(&mut self, mut player: Player) -> Result<(), SessionError> {
        match self.status {
            SessionStatus::NotStarted => {
                player.set_session(Some(self.id.clone()));
                info!("Player joined session");
                self.roster.push(player);
                Ok(())
            }
            SessionStatus::InProgress => {
                let Some(seat) = self.roster.disconnected_by_name_mut(player.name()) else {
                    warn!("Mid-game join without a seat to reclaim");
                    return Err(SessionError::NoSeatToReclaim {
                        name: self.name.clone(),
                        player_name: player.name().clone(),
                    });
                };
                seat.reconnect(player.id().clone());
                info!(score = *seat.score(), "Player reclaimed seat");
                Ok(())
            }
            SessionStatus::Ended => {
                warn!("Join attempted on ended session");
                Err(SessionError::Ended {
                    name: self.name.clone(),
                })
            }
        }
    }

    /// Soft leave: clears the host slot for the host, otherwise marks the
    /// contestant disconnected and keeps the entry for a later reconnect.
    ///
    /// # Errors
    ///
    /// [`SessionError::PlayerNotFound`] if `player_id` is neither host nor on
    /// the roster.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn leave(&mut self, player_id: &str) -> Result<LeaveOutcome, SessionError> {
        if self.host_id.as_deref() == Some(player_id) {
            info!("Host left, session is now host-less");
            self.host_id = None;
            return Ok(LeaveOutcome::HostCleared);
        }

        let player = self.roster.get_mut(player_id).ok_or_else(|| {
            debug!("Leaving player not on roster");
            SessionError::PlayerNotFound {
                player_id: player_id.to_string(),
            }
        })?;
        player.set_connected(false);
        info!("Player disconnected from session");
        Ok(LeaveOutcome::Disconnected)
    }

    /// Drops a connection from every role it holds here: the host slot is
    /// cleared and a roster seat is marked disconnected, keeping it open for
    /// a later reconnect.
    ///
    /// Returns `true` if the connection held either role.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn disconnect(&mut self, connection_id: &str) -> bool {
        let was_host = self.host_id.as_deref() == Some(connection_id);
        if was_host {
            self.host_id = None;
        }
        let seated = match self.roster.get_mut(connection_id) {
            Some(player) => {
                player.set_connected(false);
                true
            }
            None => false,
        };
        if was_host || seated {
            info!(was_host, seated, "Connection dropped from session");
        }
        was_host || seated
    }

    /// Hard removal of a roster entry.
    ///
    /// # Errors
    ///
    /// [`SessionError::PlayerNotFound`] if the player is not on the roster.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn remove_player(&mut self, player_id: &str) -> Result<Player, SessionError> {
        let mut removed =
            self.roster
                .remove(player_id)
                .ok_or_else(|| SessionError::PlayerNotFound {
                    player_id: player_id.to_string(),
                })?;
        removed.set_session(None);
        info!(name = %removed.name(), "Player removed from session");
        Ok(removed)
    }

    /// Assigns the host slot, overwriting any previous host.
    #[instrument(skip(self), fields(session_id = %self.id, previous = ?self.host_id))]
    pub fn set_new_host(&mut self, host_id: impl Into<PlayerId> + std::fmt::Debug) {
        let host_id = host_id.into();
        info!(host_id = %host_id, "Assigning host");
        self.host_id = Some(host_id);
    }

    /// Checks every start precondition without touching state.
    ///
    /// # Errors
    ///
    /// [`SessionError::AlreadyStarted`] outside `NotStarted`,
    /// [`SessionError::NotEnoughPlayers`] below [`MIN_PLAYERS`].
    pub fn ensure_startable(&self) -> Result<(), SessionError> {
        if self.status != SessionStatus::NotStarted {
            return Err(SessionError::AlreadyStarted {
                name: self.name.clone(),
            });
        }
        if self.roster.len() < MIN_PLAYERS {
            return Err(SessionError::NotEnoughPlayers {
                required: MIN_PLAYERS,
                present: self.roster.len(),
            });
        }
        Ok(())
    }

    /// Loads the deck and moves to `InProgress`.
    ///
    /// The round count shrinks to the deck size. Scores and pending answers
    /// are reset. A failed deck load still starts the session, with zero
    /// rounds.
    ///
    /// # Errors
    ///
    /// See [`GameSession::ensure_startable`]. Nothing changes on error.
    #[instrument(skip(self, bank), fields(session_id = %self.id, question_set_id = %self.question_set_id))]
    pub async fn start(&mut self, bank: &dyn QuestionBank) -> Result<(), SessionError> {
        if let Err(e) = self.ensure_startable() {
            warn!(error = %e, "Cannot start session");
            return Err(e);
        }
        let deck = QuestionDeck::load(bank, &self.question_set_id, self.requested_rounds).await;
        self.start_with_deck(deck)
    }

    /// Moves to `InProgress` with an already loaded deck.
    ///
    /// # Errors
    ///
    /// See [`GameSession::ensure_startable`]. Nothing changes on error.
    #[instrument(skip(self, deck), fields(session_id = %self.id, deck_rounds = deck.rounds()))]
    pub fn start_with_deck(&mut self, deck: QuestionDeck) -> Result<(), SessionError> {
        self.ensure_startable()?;

        self.rounds = self.requested_rounds.min(deck.rounds());
        if self.rounds < self.requested_rounds {
            info!(
                requested = self.requested_rounds,
                available = self.rounds,
                "Fewer questions than requested rounds"
            );
        }
        for player in self.roster.iter_mut() {
            player.reset_score();
            player.clear_answer();
        }
        self.deck = Some(deck);
        self.status = SessionStatus::InProgress;
        self.started_at = Some(Utc::now());
        info!(rounds = self.rounds, "Session started");
        Ok(())
    }

    /// Reveals the next round and opens the answer window.
    ///
    /// When the deck has no question for the next round the session ends and
    /// [`RoundOutcome::Ended`] is returned; the round counter does not move.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotInProgress`] or [`SessionError::DeckNotLoaded`].
    #[instrument(skip(self), fields(session_id = %self.id, current_round = self.current_round))]
    pub fn next_round(&mut self) -> Result<RoundOutcome, SessionError> {
        if self.status != SessionStatus::InProgress {
            warn!("Next round requested outside a running session");
            return Err(SessionError::NotInProgress {
                name: self.name.clone(),
            });
        }
        let Some(deck) = self.deck.as_ref() else {
            warn!("Next round requested before questions loaded");
            return Err(SessionError::DeckNotLoaded);
        };

        let next = self.current_round + 1;
        let question = match deck.question(next) {
            Some(question) if next <= self.rounds => question.clone(),
            _ => {
                info!(round = next, "No question left, ending session");
                self.end();
                return Ok(RoundOutcome::Ended);
            }
        };

        self.current_round = next;
        self.answers_open = true;
        self.first_correct_claimed = false;
        for player in self.roster.iter_mut() {
            player.clear_answer();
        }

        info!(round = next, question_id = %question.id(), "Round started");
        Ok(RoundOutcome::Started(RoundStart {
            round: next,
            question: question.trimmed(),
            full: question,
        }))
    }

    /// Forces the session to `Ended`.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotInProgress`] unless the session is running.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn finish(&mut self) -> Result<(), SessionError> {
        if self.status != SessionStatus::InProgress {
            warn!(status = %self.status, "Finish requested outside a running session");
            return Err(SessionError::NotInProgress {
                name: self.name.clone(),
            });
        }
        self.end();
        Ok(())
    }

    fn end(&mut self) {
        self.status = SessionStatus::Ended;
        self.answers_open = false;
        info!(rounds_played = self.current_round, "Session ended");
    }

    /// Fails unless the session is running with an open window.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotInProgress`] or [`SessionError::AnswersClosed`].
    pub fn ensure_answers_open(&self) -> Result<(), SessionError> {
        if self.status != SessionStatus::InProgress {
            return Err(SessionError::NotInProgress {
                name: self.name.clone(),
            });
        }
        if !self.answers_open {
            return Err(SessionError::AnswersClosed {
                round: self.current_round,
            });
        }
        Ok(())
    }

    /// Closes the answer window if `round` is still the current round.
    ///
    /// Returns `true` if the window was open and is now closed.
    #[instrument(skip(self), fields(session_id = %self.id, current_round = self.current_round))]
    pub fn close_answers(&mut self, round: u32) -> bool {
        if round != self.current_round || !self.answers_open {
            debug!("Close ignored, window already closed or round moved on");
            return false;
        }
        self.answers_open = false;
        info!("Answers closed");
        true
    }

    /// Records and scores a player's answer for the current round.
    ///
    /// Only the first submission per player per round is evaluated. A correct
    /// answer earns [`BASE_POINTS`]; the first correct answer of the round
    /// additionally earns [`FIRST_CORRECT_BONUS`].
    ///
    /// # Errors
    ///
    /// [`SessionError::NotInProgress`], [`SessionError::AnswersClosed`],
    /// [`SessionError::PlayerNotFound`] or [`SessionError::AlreadyAnswered`].
    #[instrument(skip(self, answer), fields(session_id = %self.id, round = self.current_round))]
    pub fn submit_answer(
        &mut self,
        player_id: &str,
        answer: &str,
    ) -> Result<AnswerVerdict, SessionError> {
        if let Err(e) = self.ensure_answers_open() {
            warn!(error = %e, "Answer rejected");
            return Err(e);
        }
        let round = self.current_round;
        let question = self
            .deck
            .as_ref()
            .and_then(|deck| deck.question(round))
            .ok_or(SessionError::NoActiveRound)?;

        let player = self
            .roster
            .get_mut(player_id)
            .ok_or_else(|| SessionError::PlayerNotFound {
                player_id: player_id.to_string(),
            })?;
        if player.has_answered() {
            debug!("Duplicate answer ignored");
            return Err(SessionError::AlreadyAnswered {
                player_id: player_id.to_string(),
                round,
            });
        }

        player.record_answer(answer);
        let correct = AnswerEvaluator::is_correct(question, answer);
        let first_correct = correct && !self.first_correct_claimed;
        let points = match (correct, first_correct) {
            (false, _) => 0,
            (true, false) => BASE_POINTS,
            (true, true) => BASE_POINTS + FIRST_CORRECT_BONUS,
        };
        player.award(points);
        if first_correct {
            self.first_correct_claimed = true;
        }

        info!(correct, first_correct, points, "Answer recorded");
        Ok(AnswerVerdict {
            round,
            correct,
            first_correct,
            points,
        })
    }

    /// Canonical answer and explanation for the current round, regardless of
    /// the answer window.
    ///
    /// # Errors
    ///
    /// [`SessionError::DeckNotLoaded`] before start,
    /// [`SessionError::NoActiveRound`] before the first reveal.
    #[instrument(skip(self), fields(session_id = %self.id, round = self.current_round))]
    pub fn correct_answer(&self) -> Result<AnswerReveal, SessionError> {
        let deck = self.deck.as_ref().ok_or(SessionError::DeckNotLoaded)?;
        deck.question(self.current_round)
            .map(Question::reveal)
            .ok_or(SessionError::NoActiveRound)
    }

    /// Current ranking.
    pub fn standings(&self) -> Vec<Standing> {
        self.roster.standings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trivia::{InMemoryQuestionBank, QuestionFormat};

    fn settings(rounds: u32) -> SessionSettings {
        SessionSettings::new(
            "Friday Quiz".to_string(),
            rounds,
            "hostpw".to_string(),
            "quiz-code".to_string(),
            "general".to_string(),
            Some("host".to_string()),
        )
    }

    fn deck(count: usize) -> QuestionDeck {
        let questions = (1..=count)
            .map(|i| Question::new(format!("Q{}", i), QuestionFormat::Number, i.to_string()))
            .collect();
        QuestionDeck::from_questions("general", count as u32, questions)
    }

    fn session_with_players(rounds: u32) -> GameSession {
        let mut session = GameSession::new("s1".to_string(), settings(rounds));
        session.join(Player::new("p1", "Ada")).expect("join");
        session.join(Player::new("p2", "Grace")).expect("join");
        session
    }

    fn running(rounds: u32, questions: usize) -> GameSession {
        let mut session = session_with_players(rounds);
        session.start_with_deck(deck(questions)).expect("start");
        session
    }

    #[test]
    fn test_new_session_defaults() {
        let session = GameSession::new("s1".to_string(), settings(5));
        assert_eq!(session.status(), SessionStatus::NotStarted);
        assert_eq!(session.current_round(), 0);
        assert_eq!(session.host_id(), Some("host"));
        assert!(session.deck().is_none());
        assert!(!session.answers_open());
    }

    #[test]
    fn test_start_requires_two_players() {
        let mut session = GameSession::new("s1".to_string(), settings(5));
        session.join(Player::new("p1", "Ada")).expect("join");
        let err = session.start_with_deck(deck(5)).unwrap_err();
        assert_eq!(
            err,
            SessionError::NotEnoughPlayers {
                required: 2,
                present: 1
            }
        );
        assert_eq!(session.status(), SessionStatus::NotStarted);
        assert!(session.deck().is_none());
    }

    #[tokio::test]
    async fn test_start_clamps_rounds_to_bank() {
        let questions = (1..=6)
            .map(|i| Question::new(format!("Q{}", i), QuestionFormat::Exact, "x"))
            .collect();
        let bank = InMemoryQuestionBank::new().with_set("general", questions);
        let mut session = session_with_players(10);
        session.start(&bank).await.expect("start");
        assert_eq!(session.rounds(), 6);
        assert_eq!(session.status(), SessionStatus::InProgress);
        assert!(session.started_at().is_some());
    }

    #[test]
    fn test_start_twice_fails() {
        let mut session = running(3, 3);
        let err = session.start_with_deck(deck(3)).unwrap_err();
        assert!(matches!(err, SessionError::AlreadyStarted { .. }));
    }

    #[test]
    fn test_join_in_progress_requires_disconnected_namesake() {
        let mut session = running(3, 3);
        let err = session.join(Player::new("p3", "Linus")).unwrap_err();
        assert!(matches!(err, SessionError::NoSeatToReclaim { .. }));

        // Connected namesake cannot be displaced.
        assert!(session.join(Player::new("p9", "Ada")).is_err());

        session.leave("p1").expect("leave");
        session.join(Player::new("p1b", "Ada")).expect("reclaim");
        assert_eq!(session.roster().len(), 2);
        let ada = session.roster().get("p1b").expect("reclaimed seat");
        assert!(*ada.connected());
    }

    #[test]
    fn test_reconnect_keeps_score_and_answer() {
        let mut session = running(3, 3);
        session.next_round().expect("round");
        session.submit_answer("p1", "1").expect("answer");
        session.leave("p1").expect("leave");
        session.join(Player::new("p1b", "Ada")).expect("reclaim");

        let ada = session.roster().get("p1b").expect("seat");
        assert_eq!(*ada.score(), BASE_POINTS + FIRST_CORRECT_BONUS);
        assert!(matches!(
            session.submit_answer("p1b", "1"),
            Err(SessionError::AlreadyAnswered { .. })
        ));
    }

    #[test]
    fn test_join_after_end_fails() {
        let mut session = running(1, 1);
        session.finish().expect("finish");
        let err = session.join(Player::new("p3", "Linus")).unwrap_err();
        assert!(matches!(err, SessionError::Ended { .. }));
    }

    #[test]
    fn test_host_leave_clears_slot_only() {
        let mut session = session_with_players(3);
        assert_eq!(session.leave("host").expect("leave"), LeaveOutcome::HostCleared);
        assert_eq!(session.host_id(), None);
        assert_eq!(session.roster().len(), 2);
    }

    #[test]
    fn test_disconnect_releases_host_slot_and_seat() {
        let mut session = running(3, 3);
        session.set_new_host("p1");

        assert!(session.disconnect("p1"));
        assert_eq!(session.host_id(), None);
        assert!(!*session.roster().get("p1").expect("seat kept").connected());

        // The freed seat can be reclaimed by name mid-game.
        session.join(Player::new("p1b", "Ada")).expect("reclaim");
        assert!(session.roster().contains("p1b"));

        assert!(!session.disconnect("ghost"));
    }

    #[test]
    fn test_player_leave_keeps_entry() {
        let mut session = session_with_players(3);
        assert_eq!(session.leave("p2").expect("leave"), LeaveOutcome::Disconnected);
        let grace = session.roster().get("p2").expect("still on roster");
        assert!(!*grace.connected());
        assert!(session.leave("ghost").is_err());
    }

    #[test]
    fn test_remove_player_deletes_entry() {
        let mut session = session_with_players(3);
        let removed = session.remove_player("p2").expect("remove");
        assert_eq!(removed.name(), "Grace");
        assert!(!session.roster().contains("p2"));
        assert!(session.remove_player("p2").is_err());
    }

    #[test]
    fn test_set_new_host_overwrites() {
        let mut session = session_with_players(3);
        session.set_new_host("other");
        assert_eq!(session.host_id(), Some("other"));
    }

    #[test]
    fn test_start_resets_scores() {
        let mut session = session_with_players(3);
        for player in session.roster.iter_mut() {
            player.award(5);
            player.record_answer("stale");
        }
        session.start_with_deck(deck(3)).expect("start");
        assert!(session.roster().iter().all(|p| *p.score() == 0 && !p.has_answered()));
    }

    #[test]
    fn test_next_round_reveals_trimmed_question() {
        let mut session = running(3, 3);
        let outcome = session.next_round().expect("round");
        let start = outcome.round().expect("started");
        assert_eq!(*start.round(), 1);
        assert_eq!(start.question().prompt(), "Q1");
        assert_eq!(start.full().answer().canonical(), "1");
        assert!(session.answers_open());
    }

    #[test]
    fn test_round_exhaustion_ends_session() {
        let mut session = running(2, 2);
        session.next_round().expect("round 1");
        session.next_round().expect("round 2");
        let outcome = session.next_round().expect("no error");
        assert_eq!(outcome, RoundOutcome::Ended);
        assert_eq!(session.status(), SessionStatus::Ended);
        assert_eq!(session.current_round(), 2);
        assert!(session.current_round() <= session.rounds());
        assert!(!session.answers_open());
    }

    #[test]
    fn test_empty_deck_ends_on_first_round() {
        let mut session = session_with_players(5);
        session
            .start_with_deck(QuestionDeck::failed("general", 5, "missing"))
            .expect("start");
        assert_eq!(session.status(), SessionStatus::InProgress);
        assert_eq!(session.rounds(), 0);
        assert_eq!(session.next_round().expect("no error"), RoundOutcome::Ended);
        assert_eq!(session.status(), SessionStatus::Ended);
        assert_eq!(session.current_round(), 0);
    }

    #[test]
    fn test_next_round_requires_running_session() {
        let mut session = session_with_players(3);
        assert!(matches!(
            session.next_round(),
            Err(SessionError::NotInProgress { .. })
        ));
    }

    #[test]
    fn test_answer_scored_once() {
        let mut session = running(3, 3);
        session.next_round().expect("round");
        let verdict = session.submit_answer("p1", "1").expect("first answer");
        assert!(*verdict.correct());

        let err = session.submit_answer("p1", "1").unwrap_err();
        assert!(matches!(err, SessionError::AlreadyAnswered { .. }));
        let ada = session.roster().get("p1").expect("player");
        assert_eq!(*ada.score(), BASE_POINTS + FIRST_CORRECT_BONUS);
    }

    #[test]
    fn test_first_correct_bonus_only_once_per_round() {
        let mut session = running(3, 3);
        session.next_round().expect("round");
        let first = session.submit_answer("p1", "1").expect("p1");
        let second = session.submit_answer("p2", "1").expect("p2");
        assert_eq!(*first.points(), BASE_POINTS + FIRST_CORRECT_BONUS);
        assert!(*first.first_correct());
        assert_eq!(*second.points(), BASE_POINTS);
        assert!(!*second.first_correct());

        // Bonus is available again next round.
        session.next_round().expect("round 2");
        let again = session.submit_answer("p2", "2").expect("p2");
        assert!(*again.first_correct());
    }

    #[test]
    fn test_wrong_answer_does_not_claim_bonus() {
        let mut session = running(3, 3);
        session.next_round().expect("round");
        let wrong = session.submit_answer("p1", "9").expect("p1");
        assert_eq!(*wrong.points(), 0);
        let right = session.submit_answer("p2", "1").expect("p2");
        assert!(*right.first_correct());
    }

    #[test]
    fn test_closed_window_rejects_answers() {
        let mut session = running(3, 3);
        session.next_round().expect("round");
        assert!(session.close_answers(1));
        let err = session.submit_answer("p1", "1").unwrap_err();
        assert_eq!(err, SessionError::AnswersClosed { round: 1 });
        assert!(!session.roster().get("p1").expect("player").has_answered());
    }

    #[test]
    fn test_close_for_stale_round_is_ignored() {
        let mut session = running(3, 3);
        session.next_round().expect("round 1");
        session.next_round().expect("round 2");
        assert!(!session.close_answers(1));
        assert!(session.answers_open());
    }

    #[test]
    fn test_answers_before_first_round_rejected() {
        let mut session = running(3, 3);
        assert!(matches!(
            session.submit_answer("p1", "1"),
            Err(SessionError::AnswersClosed { round: 0 })
        ));
    }

    #[test]
    fn test_correct_answer_available_after_close() {
        let mut session = running(3, 3);
        assert_eq!(session.correct_answer(), Err(SessionError::NoActiveRound));
        session.next_round().expect("round");
        session.close_answers(1);
        assert_eq!(session.correct_answer().expect("reveal").answer(), "1");
    }

    #[test]
    fn test_correct_answer_before_start_is_absent() {
        let session = session_with_players(3);
        assert_eq!(session.correct_answer(), Err(SessionError::DeckNotLoaded));
    }

    #[test]
    fn test_finish_only_from_in_progress() {
        let mut session = session_with_players(3);
        assert!(session.finish().is_err());
        session.start_with_deck(deck(3)).expect("start");
        session.finish().expect("finish");
        assert_eq!(session.status(), SessionStatus::Ended);
        assert!(session.finish().is_err());
        assert!(session.next_round().is_err());
    }

    #[test]
    fn test_summary_hides_secrets() {
        let session = session_with_players(3);
        let json = serde_json::to_string(&session.summary()).expect("serializable");
        assert!(!json.contains("hostpw"));
        assert!(!json.contains("quiz-code"));
        assert!(json.contains("\"playerCount\":2"));
        assert!(json.contains("\"status\":\"NOT_STARTED\""));
    }
}
