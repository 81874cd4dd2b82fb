use std::collections::BTreeSet;

use indexmap::IndexMap;

use super::game::{DoublesGame, Pairing};

/// How often a pairing played inside one candidate session, and how it fared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairingTally {
    /// Games the pairing took part in, on either side of the net.
    pub appearances: usize,
    /// Games the pairing won together.
    pub wins: usize,
    /// Games the pairing lost together.
    pub losses: usize,
}

impl PairingTally {
    /// A tiebreaker pairing must have both won and lost at least once.
    pub fn is_split(&self) -> bool {
        self.wins >= 1 && self.losses >= 1
    }

    fn record(&mut self, won: bool) {
        self.appearances += 1;
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
    }
}

/// Tallies for every pairing of a fixed roster, built once per candidate.
///
/// The map is seeded with all pairings of the roster (six for four players) in
/// lexicographic order, so pairings that never played still show up with a zero
/// tally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingLedger {
    tallies: IndexMap<Pairing, PairingTally>,
}

impl PairingLedger {
    /// Seed the ledger from `roster` and record every game.
    ///
    /// Pairings made of names outside the roster are recorded as extra entries;
    /// the validator only builds ledgers for games drawn from the roster itself.
    pub fn build(roster: &BTreeSet<String>, games: &[DoublesGame]) -> Self {
        let names: Vec<&String> = roster.iter().collect();
        let mut tallies = IndexMap::new();
        for (index, first) in names.iter().enumerate() {
            for second in &names[index + 1..] {
                tallies.insert(
                    Pairing::new(first.as_str(), second.as_str()),
                    PairingTally::default(),
                );
            }
        }

        for game in games {
            tallies
                .entry(game.winners.clone())
                .or_default()
                .record(true);
            tallies
                .entry(game.losers.clone())
                .or_default()
                .record(false);
        }

        Self { tallies }
    }

    /// Tally for `pairing`, if it belongs to the ledger.
    pub fn get(&self, pairing: &Pairing) -> Option<&PairingTally> {
        self.tallies.get(pairing)
    }

    /// Pairings with their tallies, in seeding order.
    pub fn iter(&self) -> impl Iterator<Item = (&Pairing, &PairingTally)> {
        self.tallies.iter()
    }

    /// Number of pairings tracked.
    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    /// Whether the ledger tracks no pairing at all.
    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }

    /// First pairing that never took the court, if any.
    pub fn missing(&self) -> Option<&Pairing> {
        self.tallies
            .iter()
            .find(|(_, tally)| tally.appearances == 0)
            .map(|(pairing, _)| pairing)
    }

    /// Sum of appearances; always twice the number of recorded games.
    pub fn total_appearances(&self) -> usize {
        self.tallies.values().map(|tally| tally.appearances).sum()
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use uuid::Uuid;

    use super::*;

    fn roster() -> BTreeSet<String> {
        ["d", "b", "a", "c"].into_iter().map(String::from).collect()
    }

    fn game(winners: (&str, &str), losers: (&str, &str)) -> DoublesGame {
        DoublesGame {
            id: Uuid::new_v4(),
            played_at: SystemTime::UNIX_EPOCH,
            winners: Pairing::new(winners.0, winners.1),
            losers: Pairing::new(losers.0, losers.1),
            winner_score: 21,
            loser_score: 19,
        }
    }

    #[test]
    fn seeds_all_six_pairings_in_order() {
        let ledger = PairingLedger::build(&roster(), &[]);
        let pairings: Vec<String> = ledger.iter().map(|(p, _)| p.to_string()).collect();
        assert_eq!(
            pairings,
            vec!["a & b", "a & c", "a & d", "b & c", "b & d", "c & d"]
        );
        assert_eq!(ledger.missing(), Some(&Pairing::new("a", "b")));
    }

    #[test]
    fn records_wins_and_losses_per_pairing() {
        let games = [
            game(("a", "b"), ("c", "d")),
            game(("c", "d"), ("a", "b")),
            game(("a", "b"), ("c", "d")),
        ];
        let ledger = PairingLedger::build(&roster(), &games);

        let ab = ledger.get(&Pairing::new("b", "a")).copied().unwrap();
        assert_eq!(
            ab,
            PairingTally {
                appearances: 3,
                wins: 2,
                losses: 1
            }
        );
        assert!(ab.is_split());

        let ac = ledger.get(&Pairing::new("a", "c")).copied().unwrap();
        assert_eq!(ac, PairingTally::default());
        assert_eq!(ledger.total_appearances(), 6);
        assert_eq!(ledger.len(), 6);
    }

    #[test]
    fn sweep_is_not_a_split() {
        let tally = PairingTally {
            appearances: 3,
            wins: 3,
            losses: 0,
        };
        assert!(!tally.is_split());
    }
}
