//! Live session and player stores.
//!
//! Each session sits behind its own async mutex, so every mutating operation
//! on one session is serialized while different sessions proceed in parallel.
//! The maps themselves are only locked long enough to clone a handle.

use crate::events::{EventBus, SessionEvent};
use crate::trivia::{
    AnswerReveal, AnswerVerdict, GameSession, Player, PlayerId, QuestionBank, QuestionDeck,
    RoundOutcome, SessionError, SessionId, SessionSettings, SessionStatus, SessionSummary, Standing,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::{Instrument, debug, info, info_span, instrument, warn};

/// Shared, serialized access to one session.
pub type SessionHandle = Arc<Mutex<GameSession>>;

/// Which sessions a listing includes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionFilter {
    /// Sessions still accepting contestants.
    Available,
    /// Every session that has not ended.
    #[default]
    Active,
}

impl SessionFilter {
    fn admits(self, status: SessionStatus) -> bool {
        match self {
            SessionFilter::Available => status == SessionStatus::NotStarted,
            SessionFilter::Active => status != SessionStatus::Ended,
        }
    }
}

/// Result of registering a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "player", rename_all = "snake_case")]
pub enum ConnectOutcome {
    /// A new player record was created.
    Created(Player),
    /// A disconnected record with the same name took over the connection.
    Reconnected(Player),
}

impl ConnectOutcome {
    /// The registered player.
    pub fn player(&self) -> &Player {
        match self {
            ConnectOutcome::Created(player) | ConnectOutcome::Reconnected(player) => player,
        }
    }
}

/// Connected identities mapped to player records, independent of sessions.
#[derive(Debug, Clone, Default)]
pub struct PlayerRegistry {
    players: Arc<RwLock<HashMap<PlayerId, Player>>>,
}

impl PlayerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` on `connection_id`, reclaiming a disconnected record
    /// of the same name if one exists.
    ///
    /// # Errors
    ///
    /// [`SessionError::AlreadyRegistered`] if the connection already has a
    /// player, [`SessionError::NameInUse`] if the name is live elsewhere.
    #[instrument(skip(self))]
    pub async fn connect(
        &self,
        connection_id: &str,
        name: &str,
    ) -> Result<ConnectOutcome, SessionError> {
        let mut players = self.players.write().await;

        if let Some(existing) = players.get(connection_id) {
            warn!(existing = %existing.name(), "Connection already registered");
            return Err(SessionError::AlreadyRegistered {
                name: existing.name().clone(),
            });
        }

        let namesake = players
            .iter()
            .find(|(_, p)| p.name() == name)
            .map(|(id, p)| (id.clone(), *p.connected()));

        match namesake {
            Some((_, true)) => {
                warn!("Name already connected on another device");
                Err(SessionError::NameInUse {
                    name: name.to_string(),
                })
            }
            Some((old_id, false)) => {
                let Some(mut player) = players.remove(&old_id) else {
                    return Err(SessionError::PlayerNotFound { player_id: old_id });
                };
                player.reconnect(connection_id.to_string());
                players.insert(connection_id.to_string(), player.clone());
                info!(old_id = %old_id, "Player re-joined");
                Ok(ConnectOutcome::Reconnected(player))
            }
            None => {
                let player = Player::new(connection_id, name);
                players.insert(connection_id.to_string(), player.clone());
                info!("Player created");
                Ok(ConnectOutcome::Created(player))
            }
        }
    }

    /// Marks a connection's player disconnected. The record is kept so the
    /// name can reconnect later.
    #[instrument(skip(self))]
    pub async fn disconnect(&self, connection_id: &str) -> Option<Player> {
        let mut players = self.players.write().await;
        let player = players.get_mut(connection_id)?;
        player.set_connected(false);
        debug!(name = %player.name(), "Player disconnected");
        Some(player.clone())
    }

    /// Looks up the player registered on a connection.
    pub async fn get(&self, connection_id: &str) -> Option<Player> {
        self.players.read().await.get(connection_id).cloned()
    }

    /// Number of known players, connected or not.
    pub async fn len(&self) -> usize {
        self.players.read().await.len()
    }

    /// Returns `true` if nobody ever registered.
    pub async fn is_empty(&self) -> bool {
        self.players.read().await.is_empty()
    }
}

#[derive(Debug)]
struct SessionEntry {
    name: String,
    handle: SessionHandle,
}

/// All live sessions, plus the collaborators they need.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
    players: PlayerRegistry,
    bank: Arc<dyn QuestionBank>,
    events: EventBus,
    answer_window: Duration,
}

impl SessionRegistry {
    /// Creates an empty registry loading decks from `bank`.
    #[instrument(skip(bank))]
    pub fn new(bank: Arc<dyn QuestionBank>, answer_window: Duration) -> Self {
        info!("Creating session registry");
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            players: PlayerRegistry::new(),
            bank,
            events: EventBus::new(),
            answer_window,
        }
    }

    /// Player store shared by all sessions.
    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    /// Event bus for broadcasts.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribes to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Length of the answer window started by [`SessionRegistry::start_countdown`].
    pub fn answer_window(&self) -> Duration {
        self.answer_window
    }

    /// Creates a session.
    ///
    /// # Errors
    ///
    /// [`SessionError::DuplicateName`] if a session with the same name exists.
    #[instrument(skip(self, settings), fields(name = %settings.name))]
    pub async fn create_session(&self, settings: SessionSettings) -> Result<SessionId, SessionError> {
        let mut sessions = self.sessions.write().await;
        if sessions.values().any(|entry| entry.name == settings.name) {
            warn!("Session name already taken");
            return Err(SessionError::DuplicateName {
                name: settings.name,
            });
        }

        let id = uuid::Uuid::new_v4().to_string();
        let name = settings.name.clone();
        let session = GameSession::new(id.clone(), settings);
        sessions.insert(
            id.clone(),
            SessionEntry {
                name,
                handle: Arc::new(Mutex::new(session)),
            },
        );
        drop(sessions);

        info!(session_id = %id, "Session registered");
        self.events.publish(SessionEvent::SessionCreated {
            session_id: id.clone(),
        });
        Ok(id)
    }

    /// Returns the handle for a session.
    pub async fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|entry| Arc::clone(&entry.handle))
    }

    async fn session(&self, session_id: &str) -> Result<SessionHandle, SessionError> {
        self.get(session_id).await.ok_or_else(|| {
            debug!(session_id, "Session not found");
            SessionError::SessionNotFound {
                session_id: session_id.to_string(),
            }
        })
    }

    /// Removes a session and everything it owns.
    ///
    /// # Errors
    ///
    /// [`SessionError::SessionNotFound`] if the id is unknown.
    #[instrument(skip(self))]
    pub async fn delete_session(&self, session_id: &str) -> Result<(), SessionError> {
        let removed = self.sessions.write().await.remove(session_id);
        match removed {
            Some(_) => {
                info!("Session deleted");
                Ok(())
            }
            None => Err(SessionError::SessionNotFound {
                session_id: session_id.to_string(),
            }),
        }
    }

    /// Lists sessions matching `filter`, oldest first, without secrets.
    #[instrument(skip(self))]
    pub async fn list_sessions(&self, filter: SessionFilter) -> Vec<SessionSummary> {
        let handles: Vec<SessionHandle> = self
            .sessions
            .read()
            .await
            .values()
            .map(|entry| Arc::clone(&entry.handle))
            .collect();

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            let summary = handle.lock().await.summary();
            if filter.admits(*summary.status()) {
                summaries.push(summary);
            }
        }
        summaries.sort_by_key(|s| *s.created_at());
        info!(count = summaries.len(), "Listed sessions");
        summaries
    }

    /// Joins a registered connection to a session as a contestant.
    ///
    /// # Errors
    ///
    /// Session or player missing, wrong join code, already on the roster, or
    /// whatever [`GameSession::join`] refuses.
    #[instrument(skip(self, join_code))]
    pub async fn join_session(
        &self,
        session_id: &str,
        join_code: &str,
        connection_id: &str,
    ) -> Result<Vec<Player>, SessionError> {
        let handle = self.session(session_id).await?;
        let player = self.players.get(connection_id).await.ok_or_else(|| {
            warn!("Joining connection has no player");
            SessionError::PlayerNotFound {
                player_id: connection_id.to_string(),
            }
        })?;

        let mut session = handle.lock().await;
        if !session.join_code_matches(join_code) {
            warn!("Wrong join code");
            return Err(SessionError::WrongJoinCode);
        }
        if session.roster().contains(connection_id) {
            return Err(SessionError::AlreadyJoined {
                player_id: connection_id.to_string(),
            });
        }
        session.join(player)?;

        let players = session.roster().snapshot();
        self.events.publish(SessionEvent::RosterChanged {
            session_id: session_id.to_string(),
            players: players.clone(),
        });
        Ok(players)
    }

    /// Claims the host slot with the session password.
    ///
    /// # Errors
    ///
    /// Session missing, [`SessionError::WrongPassword`], or
    /// [`SessionError::HostPresent`].
    #[instrument(skip(self, password))]
    pub async fn join_host(
        &self,
        session_id: &str,
        password: &str,
        connection_id: &str,
    ) -> Result<(), SessionError> {
        let handle = self.session(session_id).await?;
        let mut session = handle.lock().await;
        if !session.password_matches(password) {
            warn!("Wrong host password");
            return Err(SessionError::WrongPassword);
        }
        if session.host_id().is_some() {
            warn!("Host slot already taken");
            return Err(SessionError::HostPresent);
        }
        session.set_new_host(connection_id);
        Ok(())
    }

    /// Starts a session and reveals its first round.
    ///
    /// The caller becomes host if it is not already. The deck is loaded with
    /// the session unlocked, so other operations on this and every other
    /// session keep running meanwhile; the start conditions are checked again
    /// once the deck is in.
    ///
    /// # Errors
    ///
    /// Session missing or any start precondition failure; nothing changes.
    #[instrument(skip(self))]
    pub async fn start_session(
        &self,
        session_id: &str,
        caller_id: &str,
    ) -> Result<RoundOutcome, SessionError> {
        let handle = self.session(session_id).await?;
        let (question_set_id, requested_rounds) = {
            let session = handle.lock().await;
            if let Err(e) = session.ensure_startable() {
                warn!(error = %e, "Cannot start session");
                return Err(e);
            }
            (
                session.question_set_id().to_string(),
                session.requested_rounds(),
            )
        };

        let deck = QuestionDeck::load(self.bank.as_ref(), &question_set_id, requested_rounds).await;

        let mut session = handle.lock().await;
        session.start_with_deck(deck)?;
        if session.host_id() != Some(caller_id) {
            session.set_new_host(caller_id);
        }

        let outcome = session.next_round()?;
        self.publish_round(session_id, &outcome);
        Ok(outcome)
    }

    /// Advances a running session to its next round.
    ///
    /// # Errors
    ///
    /// Session missing or not running.
    #[instrument(skip(self))]
    pub async fn next_round(&self, session_id: &str) -> Result<RoundOutcome, SessionError> {
        let handle = self.session(session_id).await?;
        let outcome = handle.lock().await.next_round()?;
        self.publish_round(session_id, &outcome);
        Ok(outcome)
    }

    fn publish_round(&self, session_id: &str, outcome: &RoundOutcome) {
        let event = match outcome {
            RoundOutcome::Started(start) => SessionEvent::RoundStarted {
                session_id: session_id.to_string(),
                round: *start.round(),
                question: start.question().clone(),
            },
            RoundOutcome::Ended => SessionEvent::SessionEnded {
                session_id: session_id.to_string(),
            },
        };
        self.events.publish(event);
    }

    /// Starts the answer countdown for the current round.
    ///
    /// After [`SessionRegistry::answer_window`] the window is closed through
    /// the same per-session lock as every other operation, so a submission
    /// either lands before the close or is rejected. Returns the round being
    /// counted down.
    ///
    /// # Errors
    ///
    /// Session missing, not running, or window already closed.
    #[instrument(skip(self))]
    pub async fn start_countdown(&self, session_id: &str) -> Result<u32, SessionError> {
        let handle = self.session(session_id).await?;
        let round = {
            let session = handle.lock().await;
            session.ensure_answers_open()?;
            session.current_round()
        };

        let window = self.answer_window;
        let events = self.events.clone();
        let session_id = session_id.to_string();
        self.events.publish(SessionEvent::CountdownStarted {
            session_id: session_id.clone(),
            round,
            window_ms: u64::try_from(window.as_millis()).unwrap_or(u64::MAX),
        });

        let span = info_span!("answer_window", session_id = %session_id, round);
        tokio::spawn(
            async move {
                tokio::time::sleep(window).await;
                let closed = handle.lock().await.close_answers(round);
                if closed {
                    info!("Answer window elapsed");
                    events.publish(SessionEvent::AnswersClosed { session_id, round });
                }
            }
            .instrument(span),
        );

        Ok(round)
    }

    /// Submits a player's answer for the current round.
    ///
    /// # Errors
    ///
    /// Session missing, window closed, player unknown, or already answered.
    #[instrument(skip(self, answer))]
    pub async fn submit_answer(
        &self,
        session_id: &str,
        player_id: &str,
        answer: &str,
    ) -> Result<AnswerVerdict, SessionError> {
        let handle = self.session(session_id).await?;
        let verdict = handle.lock().await.submit_answer(player_id, answer)?;
        Ok(verdict)
    }

    /// Reveals the current round's answer to everyone.
    ///
    /// # Errors
    ///
    /// Session missing or no round revealed yet.
    #[instrument(skip(self))]
    pub async fn reveal_answer(&self, session_id: &str) -> Result<AnswerReveal, SessionError> {
        let handle = self.session(session_id).await?;
        let reveal = handle.lock().await.correct_answer()?;
        self.events.publish(SessionEvent::AnswerRevealed {
            session_id: session_id.to_string(),
            reveal: reveal.clone(),
        });
        Ok(reveal)
    }

    /// Current ranking of a session.
    ///
    /// # Errors
    ///
    /// [`SessionError::SessionNotFound`].
    #[instrument(skip(self))]
    pub async fn reveal_scores(&self, session_id: &str) -> Result<Vec<Standing>, SessionError> {
        let handle = self.session(session_id).await?;
        let standings = handle.lock().await.standings();
        Ok(standings)
    }

    /// Ejects a player from a session.
    ///
    /// # Errors
    ///
    /// Session or player missing.
    #[instrument(skip(self))]
    pub async fn remove_player(
        &self,
        session_id: &str,
        player_id: &str,
    ) -> Result<Vec<Player>, SessionError> {
        let handle = self.session(session_id).await?;
        let mut session = handle.lock().await;
        session.remove_player(player_id)?;
        let players = session.roster().snapshot();
        drop(session);

        self.events.publish(SessionEvent::PlayerRemoved {
            session_id: session_id.to_string(),
            player_id: player_id.to_string(),
        });
        self.events.publish(SessionEvent::RosterChanged {
            session_id: session_id.to_string(),
            players: players.clone(),
        });
        Ok(players)
    }

    /// Soft-leaves a session (host slot cleared, or contestant disconnected).
    ///
    /// # Errors
    ///
    /// Session or player missing.
    #[instrument(skip(self))]
    pub async fn leave_session(
        &self,
        session_id: &str,
        player_id: &str,
    ) -> Result<Vec<Player>, SessionError> {
        let handle = self.session(session_id).await?;
        let mut session = handle.lock().await;
        session.leave(player_id)?;
        let players = session.roster().snapshot();
        drop(session);

        self.events.publish(SessionEvent::RosterChanged {
            session_id: session_id.to_string(),
            players: players.clone(),
        });
        Ok(players)
    }

    /// Ends a running session.
    ///
    /// # Errors
    ///
    /// Session missing or not running.
    #[instrument(skip(self))]
    pub async fn finish_session(&self, session_id: &str) -> Result<Vec<Standing>, SessionError> {
        let handle = self.session(session_id).await?;
        let mut session = handle.lock().await;
        session.finish()?;
        let standings = session.standings();
        drop(session);

        self.events.publish(SessionEvent::SessionEnded {
            session_id: session_id.to_string(),
        });
        Ok(standings)
    }

    /// Handles a dropped connection: releases its host slot and roster seat in
    /// every session it belongs to and marks its player disconnected. Returns
    /// the affected session ids.
    #[instrument(skip(self))]
    pub async fn disconnect(&self, connection_id: &str) -> Vec<SessionId> {
        let handles: Vec<(SessionId, SessionHandle)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, entry)| (id.clone(), Arc::clone(&entry.handle)))
            .collect();

        let mut affected = Vec::new();
        for (session_id, handle) in handles {
            let mut session = handle.lock().await;
            if !session.disconnect(connection_id) {
                continue;
            }
            let players = session.roster().snapshot();
            drop(session);
            self.events.publish(SessionEvent::RosterChanged {
                session_id: session_id.clone(),
                players,
            });
            affected.push(session_id);
        }

        self.players.disconnect(connection_id).await;
        info!(sessions = affected.len(), "Connection dropped");
        affected
    }
}
