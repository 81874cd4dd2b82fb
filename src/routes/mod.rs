use axum::Router;

use crate::state::SharedState;

/// Swagger UI and the OpenAPI JSON.
pub mod docs;
/// `/games` endpoints.
pub mod games;
/// `/healthcheck` endpoint.
pub mod health;
/// `/sessions` endpoints.
pub mod sessions;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(games::router())
        .merge(sessions::router())
        .merge(docs::router())
        .with_state(state)
}
