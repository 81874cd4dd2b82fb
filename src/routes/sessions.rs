use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::session::{
        RebuildReport, SessionDetail, SessionSummary, ValidateRequest, ValidationReport,
    },
    error::AppError,
    services::kob_service,
    state::SharedState,
};

/// Routes exposing detected sessions and the validator.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions", get(list_sessions))
        .route("/sessions/{number}", get(get_session))
        .route("/sessions/rebuild", post(rebuild_sessions))
        .route("/sessions/preview", get(preview_sessions))
        .route("/sessions/validate", post(validate_games))
}

/// List the recorded sessions in discovery order.
#[utoipa::path(
    get,
    path = "/sessions",
    tag = "sessions",
    responses((status = 200, description = "Recorded sessions", body = [SessionSummary]))
)]
pub async fn list_sessions(
    State(state): State<SharedState>,
) -> Result<Json<Vec<SessionSummary>>, AppError> {
    Ok(Json(kob_service::list_sessions(&state).await?))
}

/// Retrieve one session with its games and standings.
#[utoipa::path(
    get,
    path = "/sessions/{number}",
    tag = "sessions",
    params(("number" = u32, Path, description = "Session number, starting at 1")),
    responses(
        (status = 200, description = "Session found", body = SessionDetail),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    Path(number): Path<u32>,
) -> Result<Json<SessionDetail>, AppError> {
    Ok(Json(kob_service::get_session(&state, number).await?))
}

/// Recompute all sessions from the recorded games.
#[utoipa::path(
    post,
    path = "/sessions/rebuild",
    tag = "sessions",
    responses(
        (status = 200, description = "Sessions rebuilt", body = RebuildReport),
        (status = 503, description = "Storage unavailable; previous sessions kept")
    )
)]
pub async fn rebuild_sessions(
    State(state): State<SharedState>,
) -> Result<Json<RebuildReport>, AppError> {
    Ok(Json(kob_service::rebuild_sessions(&state).await?))
}

/// Report what a rebuild would find without publishing it.
#[utoipa::path(
    get,
    path = "/sessions/preview",
    tag = "sessions",
    responses((status = 200, description = "Dry-run counts", body = RebuildReport))
)]
pub async fn preview_sessions(
    State(state): State<SharedState>,
) -> Result<Json<RebuildReport>, AppError> {
    Ok(Json(kob_service::preview_candidates(&state).await?))
}

/// Check whether a list of games forms a round robin, without storing it.
#[utoipa::path(
    post,
    path = "/sessions/validate",
    tag = "sessions",
    request_body = ValidateRequest,
    responses(
        (status = 200, description = "Verdict", body = ValidationReport),
        (status = 400, description = "Invalid game payload, or not 1 to 300 games")
    )
)]
pub async fn validate_games(
    Valid(Json(payload)): Valid<Json<ValidateRequest>>,
) -> Result<Json<ValidationReport>, AppError> {
    Ok(Json(kob_service::validate_games(payload)?))
}
