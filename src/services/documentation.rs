use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for the KOB tracker.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::games::create_game,
        crate::routes::games::list_games,
        crate::routes::games::get_game,
        crate::routes::games::delete_game,
        crate::routes::sessions::list_sessions,
        crate::routes::sessions::get_session,
        crate::routes::sessions::rebuild_sessions,
        crate::routes::sessions::preview_sessions,
        crate::routes::sessions::validate_games,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::game::CreateGameRequest,
            crate::dto::game::GameSummary,
            crate::dto::session::SessionSummary,
            crate::dto::session::SessionDetail,
            crate::dto::session::PlayerStandingDto,
            crate::dto::session::RebuildReport,
            crate::dto::session::ValidateRequest,
            crate::dto::session::ValidationReport,
            crate::dto::session::ValidationStatus,
            crate::dto::session::PairingTallyDto,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "games", description = "Record and browse doubles games"),
        (name = "sessions", description = "King-of-the-beach sessions detected from games"),
    )
)]
pub struct ApiDoc;
