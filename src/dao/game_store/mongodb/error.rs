use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures of the MongoDB store, one variant per operation.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to save game `{id}`")]
    SaveGame {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load game `{id}`")]
    LoadGame {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete game `{id}`")]
    DeleteGame {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list games")]
    ListGames {
        #[source]
        source: MongoError,
    },
    #[error("failed to list sessions")]
    ListSessions {
        #[source]
        source: MongoError,
    },
    #[error("failed to load session #{session_number}")]
    LoadSession {
        session_number: u32,
        #[source]
        source: MongoError,
    },
    #[error("failed to stage session #{session_number}")]
    StageSession {
        session_number: u32,
        #[source]
        source: MongoError,
    },
    #[error("failed to reset staged sessions")]
    ResetStaging {
        #[source]
        source: MongoError,
    },
    #[error("failed to publish rebuilt sessions")]
    PublishSessions {
        #[source]
        source: MongoError,
    },
}
