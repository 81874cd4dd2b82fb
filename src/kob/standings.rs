use std::cmp::Reverse;

use indexmap::IndexMap;

use super::game::DoublesGame;

/// One player's record over a set of games.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerStanding {
    /// Player name.
    pub player: String,
    /// Games won.
    pub wins: usize,
    /// Games lost.
    pub losses: usize,
    /// Points scored by the player's side.
    pub points_for: i64,
    /// Points scored against the player's side.
    pub points_against: i64,
}

impl PlayerStanding {
    /// Points for minus points against.
    pub fn point_differential(&self) -> i64 {
        self.points_for - self.points_against
    }
}

/// Per-player records, best first: most wins, then best point differential, then
/// name. The first entry is the king of the session.
pub fn standings(games: &[DoublesGame]) -> Vec<PlayerStanding> {
    let mut table: IndexMap<&str, PlayerStanding> = IndexMap::new();

    for game in games {
        let winner_score = i64::from(game.winner_score);
        let loser_score = i64::from(game.loser_score);
        let (w1, w2) = game.winners.players();
        let (l1, l2) = game.losers.players();

        for player in [w1, w2] {
            let entry = row(&mut table, player);
            entry.wins += 1;
            entry.points_for += winner_score;
            entry.points_against += loser_score;
        }
        for player in [l1, l2] {
            let entry = row(&mut table, player);
            entry.losses += 1;
            entry.points_for += loser_score;
            entry.points_against += winner_score;
        }
    }

    let mut rows: Vec<PlayerStanding> = table.into_values().collect();
    rows.sort_by(|a, b| {
        (Reverse(a.wins), Reverse(a.point_differential()), &a.player).cmp(&(
            Reverse(b.wins),
            Reverse(b.point_differential()),
            &b.player,
        ))
    });
    rows
}

fn row<'a, 'g>(
    table: &'a mut IndexMap<&'g str, PlayerStanding>,
    player: &'g str,
) -> &'a mut PlayerStanding {
    table.entry(player).or_insert_with(|| PlayerStanding {
        player: player.to_owned(),
        ..PlayerStanding::default()
    })
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use uuid::Uuid;

    use super::*;
    use crate::kob::game::Pairing;

    fn game(winners: (&str, &str), losers: (&str, &str), score: (u32, u32)) -> DoublesGame {
        DoublesGame {
            id: Uuid::new_v4(),
            played_at: SystemTime::UNIX_EPOCH,
            winners: Pairing::new(winners.0, winners.1),
            losers: Pairing::new(losers.0, losers.1),
            winner_score: score.0,
            loser_score: score.1,
        }
    }

    #[test]
    fn orders_by_wins_then_differential_then_name() {
        let games = [
            game(("a", "b"), ("c", "d"), (21, 19)),
            game(("a", "c"), ("b", "d"), (21, 10)),
            game(("b", "c"), ("a", "d"), (21, 15)),
        ];

        let table = standings(&games);
        let order: Vec<&str> = table.iter().map(|row| row.player.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b", "d"]);

        let king = &table[0];
        assert_eq!((king.wins, king.losses), (2, 1));
        assert_eq!(king.points_for, 19 + 21 + 21);
        assert_eq!(king.points_against, 21 + 10 + 15);

        let last = &table[3];
        assert_eq!((last.wins, last.losses), (0, 3));
        assert_eq!(last.point_differential(), -(2 + 11 + 6));
    }

    #[test]
    fn empty_games_produce_empty_table() {
        assert!(standings(&[]).is_empty());
    }
}
