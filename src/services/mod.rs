/// OpenAPI documentation generation.
pub mod documentation;
/// Recording and browsing doubles games.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Session rebuild pipeline, session queries and ad-hoc validation.
pub mod kob_service;
/// Storage backend selection and reconnection supervisor.
pub mod storage_supervisor;
