use std::{env, future::Future, sync::Arc, time::Duration};

use futures::future::BoxFuture;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{
        game_store::{GameStore, InMemoryGameStore},
        storage::StorageError,
    },
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Persistence backend selected through `STORAGE_BACKEND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-local store; nothing survives a restart.
    Memory,
    /// MongoDB, configured through `MONGO_URI` and friends.
    #[cfg(feature = "mongo-store")]
    Mongo,
}

impl StorageBackend {
    /// Resolve the backend from the environment, defaulting to MongoDB when it is compiled in.
    pub fn from_env() -> Self {
        Self::parse(env::var("STORAGE_BACKEND").ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value.map(|raw| raw.trim().to_ascii_lowercase()).as_deref() {
            Some("memory") => Self::Memory,
            #[cfg(feature = "mongo-store")]
            Some("mongo") | Some("mongodb") | None | Some("") => Self::Mongo,
            #[cfg(not(feature = "mongo-store"))]
            None | Some("") => Self::Memory,
            Some(other) => {
                warn!(backend = other, "unknown STORAGE_BACKEND; using the default");
                Self::parse(None)
            }
        }
    }

    /// Open a fresh connection to the selected backend.
    pub fn connect(self) -> BoxFuture<'static, Result<Arc<dyn GameStore>, StorageError>> {
        match self {
            Self::Memory => Box::pin(async {
                let store: Arc<dyn GameStore> = Arc::new(InMemoryGameStore::new());
                Ok(store)
            }),
            #[cfg(feature = "mongo-store")]
            Self::Mongo => Box::pin(async {
                use crate::dao::game_store::mongodb::{MongoConfig, MongoGameStore};

                let config = MongoConfig::from_env().await?;
                let store = MongoGameStore::connect(config).await?;
                let store: Arc<dyn GameStore> = Arc::new(store);
                Ok::<_, StorageError>(store)
            }),
        }
    }
}

/// Keep a storage backend connected, holding the state in degraded mode while it is not.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn GameStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.install_game_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                delay = INITIAL_DELAY;

                loop {
                    match store.health_check().await {
                        Ok(()) => {
                            if state.is_degraded() {
                                info!("storage healthy again; leaving degraded mode");
                                state.update_degraded(false);
                            }
                            sleep(HEALTH_POLL_INTERVAL).await;
                        }
                        Err(err) => {
                            warn!(error = %err, "storage health check failed");
                            if reconnect(&state, store.as_ref()).await {
                                state.update_degraded(false);
                                sleep(HEALTH_POLL_INTERVAL).await;
                            } else {
                                warn!(
                                    "exhausted storage reconnect attempts; staying in degraded mode"
                                );
                                state.clear_game_store().await;
                                break;
                            }
                        }
                    }
                }

                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// Retry the existing store a bounded number of times, entering degraded mode on the first failure.
async fn reconnect(state: &SharedState, store: &dyn GameStore) -> bool {
    let mut reconnect_delay = INITIAL_DELAY;

    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "storage reconnection succeeded after health check failure");
                return true;
            }
            Err(err) => {
                if attempt == 0 {
                    warn!(
                        attempt, error = %err,
                        "storage reconnect first attempt failed; entering degraded mode"
                    );
                    state.update_degraded(true);
                } else {
                    warn!(attempt, error = %err, "storage reconnect attempt failed");
                }
                sleep(reconnect_delay).await;
                reconnect_delay = (reconnect_delay * 2).min(MAX_DELAY);
            }
        }
    }

    false
}
