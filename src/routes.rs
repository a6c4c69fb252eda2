use axum::{
    routing::{get, patch, post},
    Extension, Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{exercise_logs, health, plans, sessions, stats};
use crate::repositories::AuthTokenRepository;

pub fn create_router(
    sessions_state: sessions::SessionsState,
    plans_state: plans::PlansState,
    auth_tokens: AuthTokenRepository,
) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        // Sessions
        .route("/sessions", post(sessions::start).get(sessions::list))
        .route("/sessions/active", get(sessions::active))
        .route("/sessions/summaries", get(sessions::summaries))
        .route(
            "/sessions/{id}",
            get(sessions::show)
                .patch(sessions::complete)
                .delete(sessions::abandon),
        )
        // Exercise logs
        .route(
            "/sessions/{id}/logs",
            post(exercise_logs::create).get(exercise_logs::list),
        )
        .route(
            "/sessions/{id}/logs/{log_id}",
            patch(exercise_logs::update).delete(exercise_logs::delete),
        )
        // Stats
        .route("/stats", get(stats::index))
        .with_state(sessions_state)
        // Plans
        .route("/plans", post(plans::import))
        .with_state(plans_state)
        // Token lookup for the AuthUser extractor
        .layer(Extension(auth_tokens))
        .layer(TraceLayer::new_for_http())
}
