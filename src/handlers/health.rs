use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::db::DbPool;
use crate::handlers::sessions::SessionsState;
use crate::version::GIT_VERSION;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub database: &'static str,
    pub git_version: &'static str,
}

/// Liveness plus a round trip through the connection pool. Answers 503 when
/// no connection can be checked out or the store rejects a trivial query.
pub async fn health_check(
    State(state): State<SessionsState>,
) -> (StatusCode, Json<HealthReport>) {
    let reachable = database_reachable(state.pool).await;
    if !reachable {
        tracing::warn!("health check: database unreachable");
    }

    let (code, status, database) = if reachable {
        (StatusCode::OK, "ok", "up")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "down")
    };

    (
        code,
        Json(HealthReport {
            status,
            database,
            git_version: GIT_VERSION,
        }),
    )
}

async fn database_reachable(pool: DbPool) -> bool {
    tokio::task::spawn_blocking(move || {
        pool.get()
            .ok()
            .and_then(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).ok())
            == Some(1)
    })
    .await
    .unwrap_or(false)
}
