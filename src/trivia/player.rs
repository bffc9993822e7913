//! Contestant records and the per-session roster.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Unique identifier for a player (the transport's connection id).
pub type PlayerId = String;

/// A contestant.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct Player {
    /// Connection identity; replaced on reconnect.
    id: PlayerId,
    /// Display name, stable across reconnects.
    name: String,
    /// Whether the player's connection is live.
    connected: bool,
    /// Cumulative score, never decreases during a match.
    score: u32,
    /// Answer submitted in the current round, if any. Never serialized.
    #[serde(skip)]
    pending_answer: Option<String>,
    /// Session the record belongs to, when it sits in a roster.
    session_id: Option<String>,
}

impl Player {
    /// Creates a connected player with zero score.
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            connected: true,
            score: 0,
            pending_answer: None,
            session_id: None,
        }
    }

    /// Whether an answer was already recorded this round.
    pub fn has_answered(&self) -> bool {
        self.pending_answer.is_some()
    }

    pub(crate) fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub(crate) fn set_session(&mut self, session_id: Option<String>) {
        self.session_id = session_id;
    }

    pub(crate) fn record_answer(&mut self, answer: impl Into<String>) {
        self.pending_answer = Some(answer.into());
    }

    pub(crate) fn clear_answer(&mut self) {
        self.pending_answer = None;
    }

    pub(crate) fn award(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    pub(crate) fn reset_score(&mut self) {
        self.score = 0;
    }

    /// Takes over a new connection id, keeping score and round state.
    pub(crate) fn reconnect(&mut self, id: PlayerId) {
        debug!(old_id = %self.id, new_id = %id, name = %self.name, "Player reconnected");
        self.id = id;
        self.connected = true;
    }
}

/// A player's place in the final or current ranking.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct Standing {
    /// 1-based rank; tied scores share a rank.
    rank: usize,
    /// Ranked player.
    player_id: PlayerId,
    /// Display name.
    name: String,
    /// Score at the time of ranking.
    score: u32,
    /// Whether the player is currently connected.
    connected: bool,
}

/// Ordered set of contestants in one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    /// Creates an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, connected or not.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Returns `true` if nobody has joined.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Iterates players in join order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    /// Copies the roster for a response or broadcast.
    pub fn snapshot(&self) -> Vec<Player> {
        self.players.clone()
    }

    /// Looks up a player by id.
    pub fn get(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Returns `true` if `id` is on the roster.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub(crate) fn disconnected_by_name_mut(&mut self, name: &str) -> Option<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.name == name && !p.connected)
    }

    pub(crate) fn push(&mut self, player: Player) {
        self.players.push(player);
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<Player> {
        let index = self.players.iter().position(|p| p.id == id)?;
        Some(self.players.remove(index))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut()
    }

    /// Ranks players by score, highest first; ties keep join order.
    pub fn standings(&self) -> Vec<Standing> {
        let mut ordered: Vec<&Player> = self.players.iter().collect();
        // Stable sort keeps join order within equal scores.
        ordered.sort_by(|a, b| b.score.cmp(&a.score));

        let mut standings = Vec::with_capacity(ordered.len());
        let mut rank = 0;
        let mut previous: Option<u32> = None;
        for (index, player) in ordered.into_iter().enumerate() {
            if previous != Some(player.score) {
                rank = index + 1;
                previous = Some(player.score);
            }
            standings.push(Standing {
                rank,
                player_id: player.id.clone(),
                name: player.name.clone(),
                score: player.score,
                connected: player.connected,
            });
        }
        standings
    }
}
