use std::{collections::HashSet, fmt, time::SystemTime};

use uuid::Uuid;

use super::validator::InvalidInputError;

/// Unordered two-player partnership.
///
/// Names are stored in lexicographic order so `Pairing::new("a", "b")` and
/// `Pairing::new("b", "a")` compare and hash identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pairing {
    first: String,
    second: String,
}

impl Pairing {
    /// Build a pairing from two player names in any order.
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// Both players, lowest name first.
    pub fn players(&self) -> (&str, &str) {
        (&self.first, &self.second)
    }

    /// Whether `player` is one of the two partners.
    pub fn contains(&self, player: &str) -> bool {
        self.first == player || self.second == player
    }
}

impl fmt::Display for Pairing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} & {}", self.first, self.second)
    }
}

/// A finished doubles game as read from the game source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoublesGame {
    /// Identifier assigned by the store.
    pub id: Uuid,
    /// When the game was played.
    pub played_at: SystemTime,
    /// Winning side.
    pub winners: Pairing,
    /// Losing side.
    pub losers: Pairing,
    /// Points of the winning side.
    pub winner_score: u32,
    /// Points of the losing side.
    pub loser_score: u32,
}

impl DoublesGame {
    /// The four names listed on the game, winners first.
    pub fn players(&self) -> [&str; 4] {
        let (w1, w2) = self.winners.players();
        let (l1, l2) = self.losers.players();
        [w1, w2, l1, l2]
    }

    /// Ensure no player is listed twice on this game.
    pub fn check_roster(&self) -> Result<(), InvalidInputError> {
        let mut seen = HashSet::with_capacity(4);
        for player in self.players() {
            if !seen.insert(player) {
                return Err(InvalidInputError::RepeatedPlayer {
                    game_id: self.id,
                    player: player.to_owned(),
                });
            }
        }
        Ok(())
    }
}
