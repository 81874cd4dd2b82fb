//! Splits a time-ordered stream of doubles games into candidate sessions and
//! keeps the ones that validate as round robins.

use std::ops::Range;
use std::time::{Duration, SystemTime};

use tracing::debug;
use uuid::Uuid;

use super::{
    game::DoublesGame,
    validator::{self, InvalidInputError, Rejection, RoundRobin, RoundRobinPattern, Verdict},
};

/// Largest gap between consecutive games of one session.
pub const DEFAULT_MAX_GAP: Duration = Duration::from_secs(2 * 60 * 60);

/// Decision taken for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The candidate is a round robin.
    Accepted(RoundRobin),
    /// Well-formed, but not a round robin.
    Rejected(Rejection),
    /// Malformed candidate; treated like a rejection by the scan.
    Invalid(InvalidInputError),
}

/// A candidate and the verdict it received.
#[derive(Debug, Clone)]
pub struct Evaluation<'a> {
    /// Index range of the candidate inside the scanned slice.
    pub span: Range<usize>,
    /// The games inside `span`.
    pub games: &'a [DoublesGame],
    /// What the validator made of them.
    pub outcome: Outcome,
}

/// A confirmed round-robin session, numbered in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSession {
    /// 1-based position among the accepted sessions.
    pub session_number: u32,
    /// Time of the first game.
    pub start_time: SystemTime,
    /// Time of the last game.
    pub end_time: SystemTime,
    /// Number of games in the session.
    pub total_games: usize,
    /// Games in play order.
    pub game_ids: Vec<Uuid>,
    /// The four players, sorted by name.
    pub players: Vec<String>,
    /// Round-robin shape the session matched.
    pub pattern: RoundRobinPattern,
}

/// Iterator over the candidate spans of a game slice.
///
/// A candidate grows while each next game lands within `max_gap` of the last game
/// already in it. The next candidate starts right after the previous one ends, so
/// no game belongs to two candidates.
pub struct Candidates<'a> {
    games: &'a [DoublesGame],
    max_gap: Duration,
    cursor: usize,
}

impl<'a> Candidates<'a> {
    /// Candidates of `games`, splitting wherever a gap exceeds `max_gap`.
    pub fn new(games: &'a [DoublesGame], max_gap: Duration) -> Self {
        Self {
            games,
            max_gap,
            cursor: 0,
        }
    }
}

impl Iterator for Candidates<'_> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.cursor;
        if start >= self.games.len() {
            return None;
        }

        let mut end = start + 1;
        while end < self.games.len()
            && gap(&self.games[end - 1], &self.games[end]) <= self.max_gap
        {
            end += 1;
        }

        self.cursor = end;
        Some(start..end)
    }
}

/// Time elapsed between two games; games out of order count as no gap.
fn gap(previous: &DoublesGame, next: &DoublesGame) -> Duration {
    next.played_at
        .duration_since(previous.played_at)
        .unwrap_or(Duration::ZERO)
}

/// Cut `games` into candidates and validate each of them.
pub fn evaluate(games: &[DoublesGame], max_gap: Duration) -> Vec<Evaluation<'_>> {
    Candidates::new(games, max_gap)
        .map(|span| {
            let candidate = &games[span.clone()];
            let outcome = match validator::validate(candidate) {
                Ok(Verdict::Accepted(round_robin)) => Outcome::Accepted(round_robin),
                Ok(Verdict::Rejected(rejection)) => Outcome::Rejected(rejection),
                Err(invalid) => Outcome::Invalid(invalid),
            };
            match &outcome {
                Outcome::Accepted(round_robin) => debug!(
                    start = span.start,
                    games = candidate.len(),
                    pattern = round_robin.pattern.as_str(),
                    "candidate accepted"
                ),
                Outcome::Rejected(reason) => debug!(
                    start = span.start,
                    games = candidate.len(),
                    %reason,
                    "candidate rejected"
                ),
                Outcome::Invalid(reason) => debug!(
                    start = span.start,
                    games = candidate.len(),
                    %reason,
                    "candidate skipped as malformed"
                ),
            }
            Evaluation {
                span,
                games: candidate,
                outcome,
            }
        })
        .collect()
}

/// Accepted candidates turned into numbered sessions, starting at 1.
pub fn sessions_from(evaluations: &[Evaluation<'_>]) -> Vec<ValidatedSession> {
    evaluations
        .iter()
        .filter_map(|evaluation| match &evaluation.outcome {
            Outcome::Accepted(round_robin) => Some((evaluation.games, round_robin)),
            _ => None,
        })
        .zip(1..)
        .filter_map(|((games, round_robin), session_number)| {
            let start_time = games.iter().map(|game| game.played_at).min()?;
            let end_time = games.iter().map(|game| game.played_at).max()?;
            Some(ValidatedSession {
                session_number,
                start_time,
                end_time,
                total_games: games.len(),
                game_ids: games.iter().map(|game| game.id).collect(),
                players: round_robin.players.clone(),
                pattern: round_robin.pattern,
            })
        })
        .collect()
}

/// Full scan: every round-robin session found in `games`.
pub fn discover_sessions(games: &[DoublesGame], max_gap: Duration) -> Vec<ValidatedSession> {
    sessions_from(&evaluate(games, max_gap))
}
