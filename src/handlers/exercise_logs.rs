use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use super::sessions::{owned_session, SessionsState};
use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::middleware::AuthUser;
use crate::models::{ExerciseLog, ExerciseLogUpdate, NewExerciseLog};
use crate::repositories::SessionRepository;
use crate::validation::{parse_uuid, validate_log_update, validate_new_log};

/// Fetch a log and make sure it was recorded in `session_id`.
async fn log_in_session(
    repo: &dyn SessionRepository,
    session_id: &str,
    log_id: &str,
) -> Result<ExerciseLog> {
    repo.get_exercise_log_by_id(log_id)
        .await?
        .filter(|log| log.session_id == session_id)
        .ok_or_else(|| AppError::NotFound("Log not found".to_string()))
}

pub async fn create(
    State(state): State<SessionsState>,
    auth_user: AuthUser,
    Path(session_id): Path<String>,
    ApiJson(data): ApiJson<NewExerciseLog>,
) -> Result<(StatusCode, Json<Value>)> {
    let session_id = parse_uuid(&session_id, "session id")?;
    let data = validate_new_log(data)?;

    let repo = state.repo(&auth_user);
    owned_session(repo.as_ref(), &auth_user, &session_id).await?;

    let log_id = repo.log_exercise_set(&session_id, data).await?;
    tracing::debug!(session_id = %session_id, log_id = %log_id, "Exercise set logged");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "logId": log_id })),
    ))
}

pub async fn list(
    State(state): State<SessionsState>,
    auth_user: AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<Value>> {
    let session_id = parse_uuid(&session_id, "session id")?;

    let repo = state.repo(&auth_user);
    owned_session(repo.as_ref(), &auth_user, &session_id).await?;

    let logs = repo.get_exercise_logs(&session_id).await?;
    let count = logs.len();

    Ok(Json(json!({
        "success": true,
        "logs": logs,
        "count": count,
    })))
}

pub async fn update(
    State(state): State<SessionsState>,
    auth_user: AuthUser,
    Path((session_id, log_id)): Path<(String, String)>,
    ApiJson(update): ApiJson<ExerciseLogUpdate>,
) -> Result<Json<Value>> {
    let session_id = parse_uuid(&session_id, "session id")?;
    let log_id = parse_uuid(&log_id, "log id")?;
    validate_log_update(&update)?;

    let repo = state.repo(&auth_user);
    owned_session(repo.as_ref(), &auth_user, &session_id).await?;
    log_in_session(repo.as_ref(), &session_id, &log_id).await?;

    repo.update_exercise_log(&log_id, update).await?;

    Ok(Json(json!({ "success": true })))
}

pub async fn delete(
    State(state): State<SessionsState>,
    auth_user: AuthUser,
    Path((session_id, log_id)): Path<(String, String)>,
) -> Result<Json<Value>> {
    let session_id = parse_uuid(&session_id, "session id")?;
    let log_id = parse_uuid(&log_id, "log id")?;

    let repo = state.repo(&auth_user);
    owned_session(repo.as_ref(), &auth_user, &session_id).await?;
    log_in_session(repo.as_ref(), &session_id, &log_id).await?;

    repo.delete_exercise_log(&log_id).await?;

    Ok(Json(json!({ "success": true })))
}
