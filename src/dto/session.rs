use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::SessionEntity,
    dto::{
        format_system_time,
        game::{CreateGameRequest, GameSummary},
    },
    kob::{Pairing, PairingTally, PlayerStanding},
};

/// A recorded king-of-the-beach session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSummary {
    pub session_number: u32,
    pub start_time: String,
    pub end_time: String,
    pub total_games: u32,
    pub players: Vec<String>,
    /// `balanced`, `one_tiebreaker` or `two_tiebreakers`.
    pub pattern: String,
    pub game_ids: Vec<Uuid>,
    pub created_at: String,
}

impl From<SessionEntity> for SessionSummary {
    fn from(session: SessionEntity) -> Self {
        Self {
            session_number: session.session_number,
            start_time: format_system_time(session.start_time),
            end_time: format_system_time(session.end_time),
            total_games: session.total_games,
            players: session.players,
            pattern: session.pattern,
            game_ids: session.game_ids,
            created_at: format_system_time(session.created_at),
        }
    }
}

/// A player's record within one session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerStandingDto {
    pub player: String,
    pub wins: usize,
    pub losses: usize,
    pub points_for: i64,
    pub points_against: i64,
    pub point_differential: i64,
}

impl From<PlayerStanding> for PlayerStandingDto {
    fn from(standing: PlayerStanding) -> Self {
        Self {
            point_differential: standing.point_differential(),
            player: standing.player,
            wins: standing.wins,
            losses: standing.losses,
            points_for: standing.points_for,
            points_against: standing.points_against,
        }
    }
}

/// Session with its games and standings, best player first.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionDetail {
    pub session: SessionSummary,
    pub games: Vec<GameSummary>,
    pub standings: Vec<PlayerStandingDto>,
}

/// Outcome of a full session rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct RebuildReport {
    /// Stored games fed to the scan.
    pub games_scanned: usize,
    /// Candidates cut from the game stream.
    pub candidates: usize,
    /// Candidates accepted and written as sessions.
    pub sessions_recorded: usize,
}

/// Largest game list accepted by the ad-hoc validation endpoint.
pub const MAX_VALIDATE_GAMES: u64 = 300;

/// Games to check as a round robin without storing them.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ValidateRequest {
    #[validate(length(min = 1, max = MAX_VALIDATE_GAMES), nested)]
    pub games: Vec<CreateGameRequest>,
}

/// Appearance record of one pairing.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PairingTallyDto {
    pub players: Vec<String>,
    pub appearances: usize,
    pub wins: usize,
    pub losses: usize,
}

impl From<(&Pairing, &PairingTally)> for PairingTallyDto {
    fn from((pairing, tally): (&Pairing, &PairingTally)) -> Self {
        let (first, second) = pairing.players();
        Self {
            players: vec![first.to_owned(), second.to_owned()],
            appearances: tally.appearances,
            wins: tally.wins,
            losses: tally.losses,
        }
    }
}

/// Verdict category returned by the ad-hoc validation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Accepted,
    Rejected,
    Invalid,
}

/// Verdict on a submitted set of games.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ValidationReport {
    pub status: ValidationStatus,
    /// Round-robin shape when accepted.
    pub pattern: Option<String>,
    /// Appearances shared by every non-tiebreaker pairing when accepted.
    pub base_count: Option<usize>,
    pub players: Vec<String>,
    pub pairings: Vec<PairingTallyDto>,
    /// Human-readable reason when not accepted.
    pub reason: Option<String>,
}
