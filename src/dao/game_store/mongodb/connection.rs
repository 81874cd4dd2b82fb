use std::{iter, time::Duration};

use mongodb::{Client, Database, bson::doc};
use tokio::time::sleep;
use tracing::warn;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
};

const PING_ATTEMPTS: u32 = 10;
const FIRST_BACKOFF: Duration = Duration::from_millis(250);
const BACKOFF_CAP: Duration = Duration::from_secs(5);

/// Waits between ping attempts: doubling from [`FIRST_BACKOFF`], capped at [`BACKOFF_CAP`].
fn backoff() -> impl Iterator<Item = Duration> {
    iter::successors(Some(FIRST_BACKOFF), |delay| Some((*delay * 2).min(BACKOFF_CAP)))
}

/// Build a client for `config` and wait until its database answers a ping.
pub async fn establish_connection(config: &MongoConfig) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(config.options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&config.database_name);

    let mut waits = backoff();
    let mut attempt = 0;
    loop {
        attempt += 1;
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => return Ok((client, database)),
            Err(source) if attempt >= PING_ATTEMPTS => {
                return Err(MongoDaoError::InitialPing {
                    attempts: attempt,
                    source,
                });
            }
            Err(err) => {
                let wait = waits.next().unwrap_or(BACKOFF_CAP);
                warn!(
                    attempt,
                    database = %config.database_name,
                    wait_ms = wait.as_millis(),
                    error = %err,
                    "MongoDB ping failed during initial connection; retrying"
                );
                sleep(wait).await;
            }
        }
    }
}
