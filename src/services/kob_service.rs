use std::collections::BTreeSet;
use std::time::{Duration, SystemTime};

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{game_store::GameStore, models::SessionEntity},
    dto::{
        game::GameSummary,
        session::{
            PairingTallyDto, PlayerStandingDto, RebuildReport, SessionDetail, SessionSummary,
            ValidateRequest, ValidationReport, ValidationStatus,
        },
    },
    error::ServiceError,
    kob::{self, DoublesGame, Outcome, PairingLedger, ROSTER_SIZE, Verdict},
    state::SharedState,
};

/// Recompute every session from the stored games and publish them in place of the old ones.
///
/// Concurrent callers are serialized; a failure at any step leaves the previously
/// published sessions untouched.
pub async fn rebuild_sessions(state: &SharedState) -> Result<RebuildReport, ServiceError> {
    let store = state.require_game_store().await?;
    let _gate = state.lock_rebuild().await;
    rebuild_with(store.as_ref(), state.config().session_gap()).await
}

async fn rebuild_with(
    store: &dyn GameStore,
    max_gap: Duration,
) -> Result<RebuildReport, ServiceError> {
    let games: Vec<DoublesGame> = store
        .all_doubles_games_ordered_by_time()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let evaluations = kob::evaluate(&games, max_gap);
    let sessions = kob::sessions_from(&evaluations);

    let created_at = SystemTime::now();
    let mut rebuild = store.begin_session_rebuild().await?;
    rebuild.clear_all_sessions().await?;
    for session in &sessions {
        rebuild
            .insert_session(SessionEntity::from_session(session, created_at))
            .await?;
    }
    rebuild.commit().await?;

    let report = RebuildReport {
        games_scanned: games.len(),
        candidates: evaluations.len(),
        sessions_recorded: sessions.len(),
    };
    info!(
        games = report.games_scanned,
        candidates = report.candidates,
        sessions = report.sessions_recorded,
        "session rebuild complete"
    );
    Ok(report)
}

/// Published sessions, in session-number order.
pub async fn list_sessions(state: &SharedState) -> Result<Vec<SessionSummary>, ServiceError> {
    let store = state.require_game_store().await?;
    let sessions = store.list_sessions().await?;
    Ok(sessions.into_iter().map(Into::into).collect())
}

/// One session with its games and per-player standings.
pub async fn get_session(
    state: &SharedState,
    session_number: u32,
) -> Result<SessionDetail, ServiceError> {
    let store = state.require_game_store().await?;
    let Some(session) = store.find_session(session_number).await? else {
        return Err(ServiceError::NotFound(format!(
            "session #{session_number} not found"
        )));
    };

    let mut games = Vec::with_capacity(session.game_ids.len());
    for id in &session.game_ids {
        match store.find_game(*id).await? {
            Some(game) => games.push(game),
            None => warn!(session_number, game_id = %id, "session references a missing game"),
        }
    }

    let standings = kob::standings(
        &games
            .iter()
            .cloned()
            .map(DoublesGame::from)
            .collect::<Vec<_>>(),
    );

    Ok(SessionDetail {
        session: session.into(),
        games: games.into_iter().map(GameSummary::from).collect(),
        standings: standings.into_iter().map(PlayerStandingDto::from).collect(),
    })
}

/// Check whether the submitted games form a round robin, without storing anything.
pub fn validate_games(request: ValidateRequest) -> Result<ValidationReport, ServiceError> {
    let games = request
        .games
        .into_iter()
        .map(|game| game.into_entity(Uuid::new_v4()).map(DoublesGame::from))
        .collect::<Result<Vec<_>, _>>()?;

    let roster: BTreeSet<String> = games
        .iter()
        .flat_map(|game| game.players())
        .map(str::to_owned)
        .collect();

    let report = match kob::validate(&games) {
        Ok(Verdict::Accepted(round_robin)) => ValidationReport {
            status: ValidationStatus::Accepted,
            pattern: Some(round_robin.pattern.as_str().to_owned()),
            base_count: Some(round_robin.base_count),
            pairings: tallies(&round_robin.ledger),
            players: round_robin.players,
            reason: None,
        },
        Ok(Verdict::Rejected(rejection)) => {
            rejected(ValidationStatus::Rejected, rejection.to_string(), roster, &games)
        }
        Err(invalid) => rejected(ValidationStatus::Invalid, invalid.to_string(), roster, &games),
    };
    Ok(report)
}

/// Dry-run the segmenter over the stored games without publishing anything.
pub async fn preview_candidates(state: &SharedState) -> Result<RebuildReport, ServiceError> {
    let store = state.require_game_store().await?;
    let games: Vec<DoublesGame> = store
        .all_doubles_games_ordered_by_time()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let evaluations = kob::evaluate(&games, state.config().session_gap());
    let accepted = evaluations
        .iter()
        .filter(|evaluation| matches!(evaluation.outcome, Outcome::Accepted(_)))
        .count();

    Ok(RebuildReport {
        games_scanned: games.len(),
        candidates: evaluations.len(),
        sessions_recorded: accepted,
    })
}

fn rejected(
    status: ValidationStatus,
    reason: String,
    roster: BTreeSet<String>,
    games: &[DoublesGame],
) -> ValidationReport {
    // Tallies are reported for four-player rosters only.
    let pairings = if roster.len() == ROSTER_SIZE {
        tallies(&PairingLedger::build(&roster, games))
    } else {
        Vec::new()
    };
    ValidationReport {
        status,
        pattern: None,
        base_count: None,
        players: roster.into_iter().collect(),
        pairings,
        reason: Some(reason),
    }
}

fn tallies(ledger: &PairingLedger) -> Vec<PairingTallyDto> {
    ledger.iter().map(PairingTallyDto::from).collect()
}

#[cfg(test)]
mod tests {
    use std::{io, sync::Arc};

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            game_store::{InMemoryGameStore, SessionRebuild},
            models::DoublesGameEntity,
            storage::{StorageError, StorageResult},
        },
        dto::game::CreateGameRequest,
        state::AppState,
    };

    const MINUTE: Duration = Duration::from_secs(60);

    fn at(minutes: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_717_200_000 + minutes * 60)
    }

    fn entity(minutes: u64, winners: (&str, &str), losers: (&str, &str)) -> DoublesGameEntity {
        DoublesGameEntity {
            id: Uuid::new_v4(),
            played_at: at(minutes),
            winner1: winners.0.into(),
            winner2: winners.1.into(),
            winner_score: 21,
            loser1: losers.0.into(),
            loser2: losers.1.into(),
            loser_score: 15,
        }
    }

    /// Three games covering AB-CD, AC-BD, AD-BC starting at `start` minutes.
    fn round(start: u64) -> Vec<DoublesGameEntity> {
        vec![
            entity(start, ("a", "b"), ("c", "d")),
            entity(start + 10, ("a", "c"), ("b", "d")),
            entity(start + 20, ("b", "c"), ("a", "d")),
        ]
    }

    async fn state_with(store: Arc<dyn GameStore>) -> SharedState {
        let state = AppState::new(AppConfig::default());
        state.install_game_store(store).await;
        state
    }

    async fn seed(store: &dyn GameStore, games: Vec<DoublesGameEntity>) {
        for game in games {
            store.save_game(game).await.unwrap();
        }
    }

    #[tokio::test]
    async fn rebuild_records_each_round_robin() {
        let store = Arc::new(InMemoryGameStore::new());
        let mut games = round(0);
        games.extend(round(24 * 60));
        seed(store.as_ref(), games).await;
        let state = state_with(store).await;

        let report = rebuild_sessions(&state).await.unwrap();
        assert_eq!(
            report,
            RebuildReport {
                games_scanned: 6,
                candidates: 2,
                sessions_recorded: 2,
            }
        );

        let sessions = list_sessions(&state).await.unwrap();
        assert_eq!(
            sessions.iter().map(|s| s.session_number).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert!(sessions.iter().all(|s| s.pattern == "balanced"));
        assert_eq!(sessions[0].players, vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn rebuild_replaces_previous_sessions() {
        let store = Arc::new(InMemoryGameStore::new());
        seed(store.as_ref(), round(0)).await;
        let state = state_with(store.clone()).await;
        rebuild_sessions(&state).await.unwrap();

        let games = store.all_doubles_games_ordered_by_time().await.unwrap();
        store.delete_game(games[0].id).await.unwrap();

        let report = rebuild_sessions(&state).await.unwrap();
        assert_eq!(report.sessions_recorded, 0);
        assert!(list_sessions(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rebuild_is_idempotent() {
        let store = Arc::new(InMemoryGameStore::new());
        seed(store.as_ref(), round(0)).await;
        let state = state_with(store).await;

        let first = rebuild_sessions(&state).await.unwrap();
        let first_sessions = list_sessions(&state).await.unwrap();
        let second = rebuild_sessions(&state).await.unwrap();
        let second_sessions = list_sessions(&state).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first_sessions.len(), second_sessions.len());
        assert_eq!(first_sessions[0].game_ids, second_sessions[0].game_ids);
    }

    #[tokio::test]
    async fn rebuild_honours_configured_gap() {
        let store = Arc::new(InMemoryGameStore::new());
        let games = vec![
            entity(0, ("a", "b"), ("c", "d")),
            entity(45, ("a", "c"), ("b", "d")),
            entity(90, ("b", "c"), ("a", "d")),
        ];
        seed(store.as_ref(), games).await;
        let state = AppState::new(AppConfig::with_session_gap(30 * MINUTE));
        state.install_game_store(store).await;

        let report = rebuild_sessions(&state).await.unwrap();
        assert_eq!(report.candidates, 3);
        assert_eq!(report.sessions_recorded, 0);
    }

    #[tokio::test]
    async fn session_detail_carries_games_and_standings() {
        let store = Arc::new(InMemoryGameStore::new());
        seed(store.as_ref(), round(0)).await;
        let state = state_with(store).await;
        rebuild_sessions(&state).await.unwrap();

        let detail = get_session(&state, 1).await.unwrap();
        assert_eq!(detail.games.len(), 3);
        assert_eq!(detail.standings.len(), 4);
        // a won twice, as did b and c; d lost every game.
        assert_eq!(detail.standings[3].player, "d");
        assert_eq!(detail.standings[3].losses, 3);
        assert_eq!(detail.standings[0].wins, 2);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let state = state_with(Arc::new(InMemoryGameStore::new())).await;
        assert!(matches!(
            get_session(&state, 7).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn degraded_state_refuses_rebuild() {
        let state = AppState::new(AppConfig::default());
        assert!(matches!(
            rebuild_sessions(&state).await,
            Err(ServiceError::Degraded)
        ));
    }

    #[tokio::test]
    async fn preview_does_not_publish() {
        let store = Arc::new(InMemoryGameStore::new());
        seed(store.as_ref(), round(0)).await;
        let state = state_with(store).await;

        let report = preview_candidates(&state).await.unwrap();
        assert_eq!(report.sessions_recorded, 1);
        assert!(list_sessions(&state).await.unwrap().is_empty());
    }

    /// Store whose rebuilds fail after staging the first session.
    #[derive(Clone)]
    struct FailingRebuildStore {
        inner: InMemoryGameStore,
    }

    struct FailingRebuild {
        inner: Box<dyn SessionRebuild>,
        staged: usize,
    }

    fn refused() -> StorageError {
        StorageError::unavailable(
            "connection reset".into(),
            io::Error::new(io::ErrorKind::ConnectionReset, "reset"),
        )
    }

    impl SessionRebuild for FailingRebuild {
        fn clear_all_sessions(&mut self) -> BoxFuture<'_, StorageResult<()>> {
            self.inner.clear_all_sessions()
        }

        fn insert_session(&mut self, session: SessionEntity) -> BoxFuture<'_, StorageResult<()>> {
            Box::pin(async move {
                if self.staged >= 1 {
                    return Err(refused());
                }
                self.staged += 1;
                self.inner.insert_session(session).await
            })
        }

        fn commit(self: Box<Self>) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.commit()
        }
    }

    impl GameStore for FailingRebuildStore {
        fn save_game(&self, game: DoublesGameEntity) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.save_game(game)
        }

        fn find_game(
            &self,
            id: Uuid,
        ) -> BoxFuture<'static, StorageResult<Option<DoublesGameEntity>>> {
            self.inner.find_game(id)
        }

        fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
            self.inner.delete_game(id)
        }

        fn all_doubles_games_ordered_by_time(
            &self,
        ) -> BoxFuture<'static, StorageResult<Vec<DoublesGameEntity>>> {
            self.inner.all_doubles_games_ordered_by_time()
        }

        fn list_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>> {
            self.inner.list_sessions()
        }

        fn find_session(
            &self,
            session_number: u32,
        ) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
            self.inner.find_session(session_number)
        }

        fn begin_session_rebuild(
            &self,
        ) -> BoxFuture<'static, StorageResult<Box<dyn SessionRebuild>>> {
            let begin = self.inner.begin_session_rebuild();
            Box::pin(async move {
                let inner = begin.await?;
                let rebuild: Box<dyn SessionRebuild> =
                    Box::new(FailingRebuild { inner, staged: 0 });
                Ok(rebuild)
            })
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.health_check()
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.try_reconnect()
        }
    }

    #[tokio::test]
    async fn failed_rebuild_keeps_published_sessions() {
        let memory = InMemoryGameStore::new();
        seed(&memory, round(0)).await;

        let healthy = state_with(Arc::new(memory.clone())).await;
        rebuild_sessions(&healthy).await.unwrap();
        let before = list_sessions(&healthy).await.unwrap();
        assert_eq!(before.len(), 1);

        seed(&memory, round(24 * 60)).await;
        let failing = state_with(Arc::new(FailingRebuildStore {
            inner: memory.clone(),
        }))
        .await;

        assert!(matches!(
            rebuild_sessions(&failing).await,
            Err(ServiceError::Unavailable(_))
        ));

        let after = list_sessions(&failing).await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].game_ids, before[0].game_ids);
    }

    fn request(w: (&str, &str), l: (&str, &str)) -> CreateGameRequest {
        CreateGameRequest {
            played_at: "2024-06-01T10:00:00Z".into(),
            winner1: w.0.into(),
            winner2: w.1.into(),
            loser1: l.0.into(),
            loser2: l.1.into(),
            winner_score: 21,
            loser_score: 18,
        }
    }

    #[test]
    fn ad_hoc_validation_accepts_tiebreaker_round() {
        let report = validate_games(ValidateRequest {
            games: vec![
                request(("a", "b"), ("c", "d")),
                request(("a", "c"), ("b", "d")),
                request(("a", "d"), ("b", "c")),
                request(("c", "d"), ("a", "b")),
                request(("b", "d"), ("a", "c")),
                request(("b", "c"), ("a", "d")),
                request(("a", "b"), ("c", "d")),
            ],
        })
        .unwrap();

        assert_eq!(report.status, ValidationStatus::Accepted);
        assert_eq!(report.pattern.as_deref(), Some("one_tiebreaker"));
        assert_eq!(report.base_count, Some(2));
        assert_eq!(report.pairings.len(), 6);
        assert!(report.reason.is_none());
    }

    #[test]
    fn ad_hoc_validation_explains_rejection() {
        let report = validate_games(ValidateRequest {
            games: vec![
                request(("a", "b"), ("c", "d")),
                request(("a", "b"), ("c", "d")),
                request(("a", "c"), ("b", "d")),
            ],
        })
        .unwrap();

        assert_eq!(report.status, ValidationStatus::Rejected);
        assert!(report.pattern.is_none());
        assert!(report.reason.is_some());
        assert_eq!(report.players, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn ad_hoc_validation_flags_five_players_as_invalid() {
        let report = validate_games(ValidateRequest {
            games: vec![
                request(("a", "b"), ("c", "d")),
                request(("a", "c"), ("b", "e")),
                request(("b", "c"), ("a", "d")),
            ],
        })
        .unwrap();

        assert_eq!(report.status, ValidationStatus::Invalid);
        assert_eq!(report.players.len(), 5);
        assert!(report.pairings.is_empty());
    }

    #[test]
    fn large_roster_reports_no_pairings() {
        let games = (0..50)
            .map(|round| {
                let name = |seat: u32| format!("p{round}-{seat}");
                CreateGameRequest {
                    winner1: name(0),
                    winner2: name(1),
                    loser1: name(2),
                    loser2: name(3),
                    ..request(("a", "b"), ("c", "d"))
                }
            })
            .collect();

        let report = validate_games(ValidateRequest { games }).unwrap();

        assert_eq!(report.status, ValidationStatus::Invalid);
        assert_eq!(report.players.len(), 200);
        assert!(report.pairings.is_empty());
    }
}
