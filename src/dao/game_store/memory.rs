//! Process-local store used when no database is configured and by tests.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dao::{
    game_store::{GameStore, SessionRebuild},
    models::{DoublesGameEntity, SessionEntity},
    storage::StorageResult,
};

/// Game store kept entirely in memory.
#[derive(Clone, Default)]
pub struct InMemoryGameStore {
    inner: Arc<RwLock<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    /// Insertion order; sorted on read so equal timestamps keep that order.
    games: Vec<DoublesGameEntity>,
    sessions: Vec<SessionEntity>,
}

impl InMemoryGameStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameStore for InMemoryGameStore {
    fn save_game(&self, game: DoublesGameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut state = inner.write().await;
            match state.games.iter_mut().find(|existing| existing.id == game.id) {
                Some(existing) => *existing = game,
                None => state.games.push(game),
            }
            Ok(())
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<DoublesGameEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let state = inner.read().await;
            Ok(state.games.iter().find(|game| game.id == id).cloned())
        })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut state = inner.write().await;
            let before = state.games.len();
            state.games.retain(|game| game.id != id);
            Ok(state.games.len() != before)
        })
    }

    fn all_doubles_games_ordered_by_time(
        &self,
    ) -> BoxFuture<'static, StorageResult<Vec<DoublesGameEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut games = inner.read().await.games.clone();
            games.sort_by_key(|game| game.played_at);
            Ok(games)
        })
    }

    fn list_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.sessions.clone()) })
    }

    fn find_session(
        &self,
        session_number: u32,
    ) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let state = inner.read().await;
            Ok(state
                .sessions
                .iter()
                .find(|session| session.session_number == session_number)
                .cloned())
        })
    }

    fn begin_session_rebuild(&self) -> BoxFuture<'static, StorageResult<Box<dyn SessionRebuild>>> {
        let store = self.clone();
        Box::pin(async move {
            let rebuild: Box<dyn SessionRebuild> = Box::new(MemorySessionRebuild {
                store,
                staged: Vec::new(),
            });
            Ok(rebuild)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

struct MemorySessionRebuild {
    store: InMemoryGameStore,
    staged: Vec<SessionEntity>,
}

impl SessionRebuild for MemorySessionRebuild {
    fn clear_all_sessions(&mut self) -> BoxFuture<'_, StorageResult<()>> {
        self.staged.clear();
        Box::pin(async { Ok(()) })
    }

    fn insert_session(&mut self, session: SessionEntity) -> BoxFuture<'_, StorageResult<()>> {
        self.staged.push(session);
        Box::pin(async { Ok(()) })
    }

    fn commit(self: Box<Self>) -> BoxFuture<'static, StorageResult<()>> {
        let MemorySessionRebuild { store, mut staged } = *self;
        Box::pin(async move {
            staged.sort_by_key(|session| session.session_number);
            store.inner.write().await.sessions = staged;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;

    fn game(offset_secs: u64) -> DoublesGameEntity {
        DoublesGameEntity {
            id: Uuid::new_v4(),
            played_at: SystemTime::UNIX_EPOCH + Duration::from_secs(offset_secs),
            winner1: "a".into(),
            winner2: "b".into(),
            winner_score: 21,
            loser1: "c".into(),
            loser2: "d".into(),
            loser_score: 12,
        }
    }

    fn session(number: u32) -> SessionEntity {
        SessionEntity {
            session_number: number,
            start_time: SystemTime::UNIX_EPOCH,
            end_time: SystemTime::UNIX_EPOCH,
            total_games: 3,
            players: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            game_ids: Vec::new(),
            pattern: "balanced".into(),
            created_at: SystemTime::UNIX_EPOCH,
        }
    }

    #[tokio::test]
    async fn games_are_returned_in_time_order() {
        let store = InMemoryGameStore::new();
        let late = game(300);
        let early = game(100);
        let tie = game(100);
        store.save_game(late.clone()).await.unwrap();
        store.save_game(early.clone()).await.unwrap();
        store.save_game(tie.clone()).await.unwrap();

        let ids: Vec<Uuid> = store
            .all_doubles_games_ordered_by_time()
            .await
            .unwrap()
            .into_iter()
            .map(|game| game.id)
            .collect();
        assert_eq!(ids, vec![early.id, tie.id, late.id]);
    }

    #[tokio::test]
    async fn saving_existing_game_replaces_it() {
        let store = InMemoryGameStore::new();
        let mut original = game(0);
        store.save_game(original.clone()).await.unwrap();
        original.winner_score = 25;
        store.save_game(original.clone()).await.unwrap();

        let games = store.all_doubles_games_ordered_by_time().await.unwrap();
        assert_eq!(games, vec![original]);
    }

    #[tokio::test]
    async fn delete_reports_whether_game_existed() {
        let store = InMemoryGameStore::new();
        let stored = game(0);
        store.save_game(stored.clone()).await.unwrap();

        assert!(store.delete_game(stored.id).await.unwrap());
        assert!(!store.delete_game(stored.id).await.unwrap());
        assert!(store.find_game(stored.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rebuild_is_invisible_until_commit() {
        let store = InMemoryGameStore::new();
        let mut first = store.begin_session_rebuild().await.unwrap();
        first.clear_all_sessions().await.unwrap();
        first.insert_session(session(1)).await.unwrap();
        first.commit().await.unwrap();

        let mut second = store.begin_session_rebuild().await.unwrap();
        second.clear_all_sessions().await.unwrap();
        second.insert_session(session(1)).await.unwrap();
        second.insert_session(session(2)).await.unwrap();
        assert_eq!(store.list_sessions().await.unwrap().len(), 1);

        drop(second);
        assert_eq!(store.list_sessions().await.unwrap(), vec![session(1)]);
        assert!(store.find_session(2).await.unwrap().is_none());
    }
}
