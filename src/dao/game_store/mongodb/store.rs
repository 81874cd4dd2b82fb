use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Client, Collection, Database, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        GAME_COLLECTION_NAME, MongoGameDocument, MongoSessionDocument, SESSION_COLLECTION_NAME,
        SESSION_STAGING_COLLECTION_NAME, game_id, session_id,
    },
};
use crate::dao::{
    game_store::{GameStore, SessionRebuild},
    models::{DoublesGameEntity, SessionEntity},
    storage::StorageResult,
};

/// Game store backed by the `games` and `sessions` collections.
#[derive(Clone)]
pub struct MongoGameStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) = establish_connection(&self.config).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoGameStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) = establish_connection(&config).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let index = mongodb::IndexModel::builder()
            .keys(doc! {"played_at": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("game_played_at_idx".to_owned()))
                    .build(),
            )
            .build();

        self.games()
            .await
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: GAME_COLLECTION_NAME,
                index: "played_at",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn games(&self) -> Collection<MongoGameDocument> {
        self.database()
            .await
            .collection::<MongoGameDocument>(GAME_COLLECTION_NAME)
    }

    async fn sessions(&self) -> Collection<MongoSessionDocument> {
        self.database()
            .await
            .collection::<MongoSessionDocument>(SESSION_COLLECTION_NAME)
    }

    async fn staged_sessions(&self) -> Collection<MongoSessionDocument> {
        self.database()
            .await
            .collection::<MongoSessionDocument>(SESSION_STAGING_COLLECTION_NAME)
    }

    async fn save_game(&self, game: DoublesGameEntity) -> MongoResult<()> {
        let id = game.id;
        let document: MongoGameDocument = game.into();
        self.games()
            .await
            .replace_one(game_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveGame { id, source })?;
        Ok(())
    }

    async fn find_game(&self, id: Uuid) -> StorageResult<Option<DoublesGameEntity>> {
        let document = self
            .games()
            .await
            .find_one(game_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadGame { id, source })?;

        document.map(DoublesGameEntity::try_from).transpose()
    }

    async fn delete_game(&self, id: Uuid) -> MongoResult<bool> {
        let result = self
            .games()
            .await
            .delete_one(game_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteGame { id, source })?;
        Ok(result.deleted_count > 0)
    }

    async fn all_games(&self) -> StorageResult<Vec<DoublesGameEntity>> {
        let documents: Vec<MongoGameDocument> = self
            .games()
            .await
            .find(doc! {})
            .sort(doc! {"played_at": 1})
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?;

        documents
            .into_iter()
            .map(DoublesGameEntity::try_from)
            .collect()
    }

    async fn list_sessions(&self) -> StorageResult<Vec<SessionEntity>> {
        let documents: Vec<MongoSessionDocument> = self
            .sessions()
            .await
            .find(doc! {})
            .sort(doc! {"_id": 1})
            .await
            .map_err(|source| MongoDaoError::ListSessions { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListSessions { source })?;

        documents.into_iter().map(SessionEntity::try_from).collect()
    }

    async fn find_session(&self, session_number: u32) -> StorageResult<Option<SessionEntity>> {
        let document = self
            .sessions()
            .await
            .find_one(session_id(session_number))
            .await
            .map_err(|source| MongoDaoError::LoadSession {
                session_number,
                source,
            })?;

        document.map(SessionEntity::try_from).transpose()
    }

    /// Swap the staging collection in place of the published one.
    ///
    /// `renameCollection` with `dropTarget` replaces the target in one step, so
    /// readers see either the old or the new session table.
    async fn publish_staged_sessions(&self, staged: usize) -> MongoResult<()> {
        if staged == 0 {
            self.sessions()
                .await
                .delete_many(doc! {})
                .await
                .map_err(|source| MongoDaoError::PublishSessions { source })?;
            return Ok(());
        }

        let (client, database_name) = {
            let guard = self.inner.state.read().await;
            (guard.client.clone(), guard.database.name().to_owned())
        };
        client
            .database("admin")
            .run_command(doc! {
                "renameCollection": format!("{database_name}.{SESSION_STAGING_COLLECTION_NAME}"),
                "to": format!("{database_name}.{SESSION_COLLECTION_NAME}"),
                "dropTarget": true,
            })
            .await
            .map_err(|source| MongoDaoError::PublishSessions { source })?;

        debug!(staged, "published rebuilt sessions");
        Ok(())
    }
}

impl GameStore for MongoGameStore {
    fn save_game(&self, game: DoublesGameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_game(game).await.map_err(Into::into) })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<DoublesGameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_game(id).await })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_game(id).await.map_err(Into::into) })
    }

    fn all_doubles_games_ordered_by_time(
        &self,
    ) -> BoxFuture<'static, StorageResult<Vec<DoublesGameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.all_games().await })
    }

    fn list_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_sessions().await })
    }

    fn find_session(
        &self,
        session_number: u32,
    ) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_session(session_number).await })
    }

    fn begin_session_rebuild(&self) -> BoxFuture<'static, StorageResult<Box<dyn SessionRebuild>>> {
        let store = self.clone();
        Box::pin(async move {
            let rebuild: Box<dyn SessionRebuild> =
                Box::new(MongoSessionRebuild { store, staged: 0 });
            Ok(rebuild)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}

/// Rebuild writing into the staging collection until commit.
struct MongoSessionRebuild {
    store: MongoGameStore,
    staged: usize,
}

impl SessionRebuild for MongoSessionRebuild {
    fn clear_all_sessions(&mut self) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            self.store
                .staged_sessions()
                .await
                .drop()
                .await
                .map_err(|source| MongoDaoError::ResetStaging { source })?;
            self.staged = 0;
            Ok(())
        })
    }

    fn insert_session(&mut self, session: SessionEntity) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            let session_number = session.session_number;
            let document: MongoSessionDocument = session.into();
            self.store
                .staged_sessions()
                .await
                .insert_one(&document)
                .await
                .map_err(|source| MongoDaoError::StageSession {
                    session_number,
                    source,
                })?;
            self.staged += 1;
            debug!(session_number, "staged session");
            Ok(())
        })
    }

    fn commit(self: Box<Self>) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async move {
            self.store
                .publish_staged_sessions(self.staged)
                .await
                .map_err(Into::into)
        })
    }
}
