use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::kob::{DoublesGame, Pairing, ValidatedSession};

/// Doubles game row as persisted by the game source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoublesGameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// When the game was played; sessions are ordered by this field.
    pub played_at: SystemTime,
    /// First winning player.
    pub winner1: String,
    /// Second winning player.
    pub winner2: String,
    /// Points of the winning side.
    pub winner_score: u32,
    /// First losing player.
    pub loser1: String,
    /// Second losing player.
    pub loser2: String,
    /// Points of the losing side.
    pub loser_score: u32,
}

impl From<DoublesGameEntity> for DoublesGame {
    fn from(entity: DoublesGameEntity) -> Self {
        Self {
            id: entity.id,
            played_at: entity.played_at,
            winners: Pairing::new(entity.winner1, entity.winner2),
            losers: Pairing::new(entity.loser1, entity.loser2),
            winner_score: entity.winner_score,
            loser_score: entity.loser_score,
        }
    }
}

/// Confirmed round-robin session as persisted by the session store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionEntity {
    /// Sequential, 1-based number assigned in discovery order.
    pub session_number: u32,
    /// Timestamp of the earliest game in the session.
    pub start_time: SystemTime,
    /// Timestamp of the latest game in the session.
    pub end_time: SystemTime,
    /// Number of games in the session.
    pub total_games: u32,
    /// The four players, sorted by name.
    pub players: Vec<String>,
    /// Games making up the session, in play order.
    pub game_ids: Vec<Uuid>,
    /// Round-robin shape (`balanced`, `one_tiebreaker`, `two_tiebreakers`).
    pub pattern: String,
    /// When this rebuild recorded the session.
    pub created_at: SystemTime,
}

impl SessionEntity {
    /// Snapshot a validated session for persistence.
    pub fn from_session(session: &ValidatedSession, created_at: SystemTime) -> Self {
        Self {
            session_number: session.session_number,
            start_time: session.start_time,
            end_time: session.end_time,
            total_games: u32::try_from(session.total_games).unwrap_or(u32::MAX),
            players: session.players.clone(),
            game_ids: session.game_ids.clone(),
            pattern: session.pattern.as_str().to_owned(),
            created_at,
        }
    }
}
