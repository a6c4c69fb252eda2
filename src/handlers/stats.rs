use axum::{extract::State, Json};
use serde_json::{json, Value};

use super::sessions::SessionsState;
use crate::error::Result;
use crate::middleware::AuthUser;

pub async fn index(State(state): State<SessionsState>, auth_user: AuthUser) -> Result<Json<Value>> {
    let stats = state
        .repo(&auth_user)
        .get_progress_stats(&auth_user.id)
        .await?;

    Ok(Json(json!({ "success": true, "stats": stats })))
}
