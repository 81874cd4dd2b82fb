use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::game::{CreateGameRequest, GameSummary},
    error::ServiceError,
    services::kob_service,
    state::SharedState,
};

/// Record a doubles game and refresh the sessions.
pub async fn create_game(
    state: &SharedState,
    request: CreateGameRequest,
) -> Result<GameSummary, ServiceError> {
    let store = state.require_game_store().await?;
    let game = request.into_entity(Uuid::new_v4())?;
    store.save_game(game.clone()).await?;
    info!(game_id = %game.id, "recorded doubles game");

    refresh_sessions(state).await;
    Ok(game.into())
}

/// Every stored game, oldest first.
pub async fn list_games(state: &SharedState) -> Result<Vec<GameSummary>, ServiceError> {
    let store = state.require_game_store().await?;
    let games = store.all_doubles_games_ordered_by_time().await?;
    Ok(games.into_iter().map(Into::into).collect())
}

/// One stored game by id.
pub async fn get_game(state: &SharedState, id: Uuid) -> Result<GameSummary, ServiceError> {
    let store = state.require_game_store().await?;
    match store.find_game(id).await? {
        Some(game) => Ok(game.into()),
        None => Err(ServiceError::NotFound(format!("game `{id}` not found"))),
    }
}

/// Delete a game and refresh the sessions.
pub async fn delete_game(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_game_store().await?;
    if !store.delete_game(id).await? {
        return Err(ServiceError::NotFound(format!("game `{id}` not found")));
    }
    info!(game_id = %id, "deleted doubles game");

    refresh_sessions(state).await;
    Ok(())
}

/// The game change is already stored, so a failed rebuild is only logged.
async fn refresh_sessions(state: &SharedState) {
    if let Err(err) = kob_service::rebuild_sessions(state).await {
        warn!(error = %err, "session rebuild after game change failed");
    }
}
