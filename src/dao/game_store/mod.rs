/// In-process store.
pub mod memory;
/// MongoDB-backed store.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{DoublesGameEntity, SessionEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

pub use memory::InMemoryGameStore;

/// Abstraction over the persistence layer for doubles games and the sessions
/// derived from them.
pub trait GameStore: Send + Sync {
    fn save_game(&self, game: DoublesGameEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<DoublesGameEntity>>>;
    /// Delete a game; resolves to `false` when no such game existed.
    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Every stored doubles game, ascending by `played_at`.
    fn all_doubles_games_ordered_by_time(
        &self,
    ) -> BoxFuture<'static, StorageResult<Vec<DoublesGameEntity>>>;
    /// Published sessions, ascending by session number.
    fn list_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>>;
    fn find_session(
        &self,
        session_number: u32,
    ) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>>;
    /// Open a rebuild of the session table.
    fn begin_session_rebuild(&self) -> BoxFuture<'static, StorageResult<Box<dyn SessionRebuild>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Staged replacement of the whole session table.
///
/// Nothing written through a rebuild is visible to readers before [`commit`]
/// resolves; dropping an uncommitted rebuild leaves the published sessions as
/// they were.
///
/// [`commit`]: SessionRebuild::commit
pub trait SessionRebuild: Send {
    /// Discard everything staged so far; the commit then starts from an empty table.
    fn clear_all_sessions(&mut self) -> BoxFuture<'_, StorageResult<()>>;
    fn insert_session(&mut self, session: SessionEntity) -> BoxFuture<'_, StorageResult<()>>;
    /// Publish the staged sessions in place of the current ones.
    fn commit(self: Box<Self>) -> BoxFuture<'static, StorageResult<()>>;
}
