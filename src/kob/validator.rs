//! Round-robin validity check for a candidate session.
//!
//! A session is a king-of-the-beach round robin when exactly four players rotate
//! through all six partnerships. The shape allowed depends on `games % 3`:
//!
//! * remainder 0: every pairing played the same number of times `k`;
//! * remainder 1: one tiebreaker matchup, so two pairings played `k + 1` times
//!   and split their games, the other four played `k` times;
//! * remainder 2: two tiebreaker matchups, four pairings at `k + 1` (split) and
//!   two at `k`.
//!
//! Anything else is rejected outright.

use std::collections::BTreeSet;

use thiserror::Error;
use uuid::Uuid;

use super::{
    game::{DoublesGame, Pairing},
    ledger::PairingLedger,
};

/// Number of distinct players in a round robin.
pub const ROSTER_SIZE: usize = 4;
/// Smallest number of games that can form a round robin.
pub const MIN_GAMES: usize = 3;

/// Malformed candidate: not something a round robin check can even be run on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInputError {
    /// One game names the same player twice.
    #[error("game `{game_id}` lists player `{player}` more than once")]
    RepeatedPlayer {
        /// The offending game.
        game_id: Uuid,
        /// The repeated name.
        player: String,
    },
    /// The candidate's games do not involve exactly four players.
    #[error("candidate involves {found} distinct players, expected 4")]
    PlayerCount {
        /// Distinct players seen.
        found: usize,
    },
}

/// Why a well-formed candidate is not a round robin.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum Rejection {
    /// Fewer than [`MIN_GAMES`] games.
    #[error("only {games} game(s), at least 3 required")]
    TooFewGames { games: usize },
    /// A pairing of the roster never shared a side.
    #[error("pairing {pairing} never played")]
    MissingPairing { pairing: Pairing },
    /// Balanced pattern with a pairing off the common count.
    #[error("pairing {pairing} played {found} time(s), expected {expected}")]
    Unbalanced {
        pairing: Pairing,
        expected: usize,
        found: usize,
    },
    /// Wrong number of pairings with an odd count for the pattern.
    #[error("{found} pairing(s) played an odd number of times, expected {expected}")]
    OddPairingCount { expected: usize, found: usize },
    /// Even-count pairings disagree on the base count.
    #[error("pairing {pairing} played {found} time(s), other base pairings played {expected}")]
    UnevenBaseCount {
        pairing: Pairing,
        expected: usize,
        found: usize,
    },
    /// Odd-count pairing not exactly one above the base count.
    #[error("tiebreaker pairing {pairing} played {found} time(s), expected {expected}")]
    TiebreakerCount {
        pairing: Pairing,
        expected: usize,
        found: usize,
    },
    /// Odd-count pairing that won or lost every game.
    #[error("tiebreaker pairing {pairing} went {wins}-{losses} instead of splitting")]
    Sweep {
        pairing: Pairing,
        wins: usize,
        losses: usize,
    },
    /// Pairing counts add up to a different number of games.
    #[error("pairing counts imply {expected} game(s), candidate has {found}")]
    GameCountMismatch { expected: usize, found: usize },
}

/// Accepted round-robin shape, selected by `games % 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundRobinPattern {
    /// Every pairing played `k` times.
    Balanced,
    /// One tiebreaker matchup on top of the balanced rounds.
    OneTiebreaker,
    /// Two tiebreaker matchups on top of the balanced rounds.
    TwoTiebreakers,
}

impl RoundRobinPattern {
    /// Pattern a candidate of `games` games must follow.
    pub fn for_game_count(games: usize) -> Self {
        match games % 3 {
            0 => Self::Balanced,
            1 => Self::OneTiebreaker,
            _ => Self::TwoTiebreakers,
        }
    }

    /// Pairings expected to have played an odd number of times.
    pub fn odd_pairings(self) -> usize {
        match self {
            Self::Balanced => 0,
            Self::OneTiebreaker => 2,
            Self::TwoTiebreakers => 4,
        }
    }

    /// Name used in storage and API payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::OneTiebreaker => "one_tiebreaker",
            Self::TwoTiebreakers => "two_tiebreakers",
        }
    }
}

/// A candidate confirmed as a round robin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundRobin {
    /// Shape matched.
    pub pattern: RoundRobinPattern,
    /// Appearance count `k` shared by every non-tiebreaker pairing.
    pub base_count: usize,
    /// The four players, sorted by name.
    pub players: Vec<String>,
    /// Per-pairing tallies backing the verdict.
    pub ledger: PairingLedger,
}

/// Outcome of validating a well-formed candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The candidate is a round robin.
    Accepted(RoundRobin),
    /// It is not, and this is why.
    Rejected(Rejection),
}

impl Verdict {
    /// Whether the candidate was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }
}

/// Decide whether `games` form a complete round robin among four players.
///
/// Returns `Err` only for malformed candidates (a name repeated within a game or
/// a player union other than four); every other failure is a [`Verdict::Rejected`].
pub fn validate(games: &[DoublesGame]) -> Result<Verdict, InvalidInputError> {
    if games.len() < MIN_GAMES {
        return Ok(Verdict::Rejected(Rejection::TooFewGames {
            games: games.len(),
        }));
    }

    for game in games {
        game.check_roster()?;
    }

    let roster: BTreeSet<String> = games
        .iter()
        .flat_map(|game| game.players())
        .map(str::to_owned)
        .collect();
    if roster.len() != ROSTER_SIZE {
        return Err(InvalidInputError::PlayerCount {
            found: roster.len(),
        });
    }

    let ledger = PairingLedger::build(&roster, games);
    if let Some(pairing) = ledger.missing() {
        return Ok(Verdict::Rejected(Rejection::MissingPairing {
            pairing: pairing.clone(),
        }));
    }

    let pattern = RoundRobinPattern::for_game_count(games.len());
    let checked = match pattern {
        RoundRobinPattern::Balanced => check_balanced(&ledger, games.len()),
        RoundRobinPattern::OneTiebreaker => check_one_tiebreaker(&ledger, games.len()),
        RoundRobinPattern::TwoTiebreakers => check_two_tiebreakers(&ledger, games.len()),
    };

    Ok(match checked {
        Ok(base_count) => Verdict::Accepted(RoundRobin {
            pattern,
            base_count,
            players: roster.into_iter().collect(),
            ledger,
        }),
        Err(rejection) => Verdict::Rejected(rejection),
    })
}

/// Every pairing played `k` times and the session has exactly `3k` games.
fn check_balanced(ledger: &PairingLedger, games: usize) -> Result<usize, Rejection> {
    let base = games / 3;
    if let Some((pairing, tally)) = ledger.iter().find(|(_, tally)| tally.appearances != base) {
        return Err(Rejection::Unbalanced {
            pairing: pairing.clone(),
            expected: base,
            found: tally.appearances,
        });
    }

    ensure_game_count(3 * base, games)?;
    Ok(base)
}

fn check_one_tiebreaker(ledger: &PairingLedger, games: usize) -> Result<usize, Rejection> {
    check_split_pattern(ledger, games, RoundRobinPattern::OneTiebreaker.odd_pairings())
}

fn check_two_tiebreakers(ledger: &PairingLedger, games: usize) -> Result<usize, Rejection> {
    check_split_pattern(ledger, games, RoundRobinPattern::TwoTiebreakers.odd_pairings())
}

/// Shared shape of the tiebreaker patterns: `odd_expected` pairings at `k + 1`
/// that split their games, the rest at an even `k`, and
/// `games == (even * k + odd * (k + 1)) / 2`.
fn check_split_pattern(
    ledger: &PairingLedger,
    games: usize,
    odd_expected: usize,
) -> Result<usize, Rejection> {
    let (odd, even): (Vec<_>, Vec<_>) = ledger
        .iter()
        .partition(|(_, tally)| tally.appearances % 2 == 1);

    if odd.len() != odd_expected {
        return Err(Rejection::OddPairingCount {
            expected: odd_expected,
            found: odd.len(),
        });
    }

    let Some((_, first_even)) = even.first() else {
        return Err(Rejection::OddPairingCount {
            expected: odd_expected,
            found: odd.len(),
        });
    };
    let base = first_even.appearances;

    if let Some((pairing, tally)) = even.iter().find(|(_, tally)| tally.appearances != base) {
        return Err(Rejection::UnevenBaseCount {
            pairing: (*pairing).clone(),
            expected: base,
            found: tally.appearances,
        });
    }

    for (pairing, tally) in &odd {
        if tally.appearances != base + 1 {
            return Err(Rejection::TiebreakerCount {
                pairing: (*pairing).clone(),
                expected: base + 1,
                found: tally.appearances,
            });
        }
        if !tally.is_split() {
            return Err(Rejection::Sweep {
                pairing: (*pairing).clone(),
                wins: tally.wins,
                losses: tally.losses,
            });
        }
    }

    ensure_game_count((even.len() * base + odd.len() * (base + 1)) / 2, games)?;
    Ok(base)
}

fn ensure_game_count(expected: usize, found: usize) -> Result<(), Rejection> {
    if expected == found {
        Ok(())
    } else {
        Err(Rejection::GameCountMismatch { expected, found })
    }
}
