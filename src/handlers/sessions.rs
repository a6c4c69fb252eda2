use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiQuery};
use crate::middleware::AuthUser;
use crate::models::{
    CompletionData, SessionQuery, SessionStatusFilter, WorkoutSession, WorkoutSessionWithLogs,
};
use crate::repositories::{create_session_repository, SessionRepository};
use crate::validation::{
    page_limit, page_offset, parse_date_bound, parse_uuid, validate_completion,
};

#[derive(Clone)]
pub struct SessionsState {
    pub pool: DbPool,
}

impl SessionsState {
    pub fn repo(&self, auth_user: &AuthUser) -> Arc<dyn SessionRepository> {
        create_session_repository(self.pool.clone(), Some(auth_user.id.clone()))
    }
}

/// Fetch a session and make sure it belongs to the caller.
pub(crate) async fn owned_session(
    repo: &dyn SessionRepository,
    auth_user: &AuthUser,
    session_id: &str,
) -> Result<WorkoutSession> {
    let session = repo
        .get_session_by_id(session_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

    if session.user_id != auth_user.id {
        return Err(AppError::Forbidden(
            "Session belongs to another user".to_string(),
        ));
    }

    Ok(session)
}

fn already_completed() -> AppError {
    AppError::Conflict("Session is already completed".to_string())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub routine_day_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSessionsQuery {
    status: Option<SessionStatusFilter>,
    limit: Option<i64>,
    offset: Option<i64>,
    from_date: Option<String>,
    to_date: Option<String>,
}

impl ListSessionsQuery {
    fn into_session_query(self) -> Result<SessionQuery> {
        let from_date = self
            .from_date
            .as_deref()
            .map(|d| parse_date_bound(d, "fromDate", false))
            .transpose()?;
        let to_date = self
            .to_date
            .as_deref()
            .map(|d| parse_date_bound(d, "toDate", true))
            .transpose()?;

        if let (Some(from), Some(to)) = (from_date, to_date) {
            if from > to {
                return Err(AppError::Validation(
                    "fromDate must not be after toDate".to_string(),
                ));
            }
        }

        Ok(SessionQuery {
            status: self.status,
            from_date,
            to_date,
            limit: page_limit(self.limit)?,
            offset: page_offset(self.offset)?,
        })
    }
}

#[derive(Deserialize)]
pub struct SummariesQuery {
    limit: Option<i64>,
}

#[derive(Serialize)]
pub struct ActiveSessionResponse {
    pub success: bool,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<WorkoutSession>,
}

#[derive(Serialize)]
pub struct SessionDetailResponse {
    pub success: bool,
    pub session: WorkoutSessionWithLogs,
}

pub async fn start(
    State(state): State<SessionsState>,
    auth_user: AuthUser,
    ApiJson(request): ApiJson<StartSessionRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let routine_day_id = parse_uuid(&request.routine_day_id, "routineDayId")?;

    let session_id = state
        .repo(&auth_user)
        .start_session(&auth_user.id, &routine_day_id)
        .await?;

    tracing::info!(
        user_id = %auth_user.id,
        session_id = %session_id,
        routine_day_id = %routine_day_id,
        "Workout session started"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "sessionId": session_id })),
    ))
}

pub async fn list(
    State(state): State<SessionsState>,
    auth_user: AuthUser,
    ApiQuery(query): ApiQuery<ListSessionsQuery>,
) -> Result<Json<Value>> {
    let query = query.into_session_query()?;

    let sessions = state
        .repo(&auth_user)
        .get_sessions_by_user(&auth_user.id, &query)
        .await?;
    let count = sessions.len();

    Ok(Json(json!({
        "success": true,
        "sessions": sessions,
        "count": count,
    })))
}

pub async fn active(
    State(state): State<SessionsState>,
    auth_user: AuthUser,
) -> Result<Json<ActiveSessionResponse>> {
    let session = state
        .repo(&auth_user)
        .get_active_session(&auth_user.id)
        .await?;

    Ok(Json(ActiveSessionResponse {
        success: true,
        active: session.is_some(),
        session,
    }))
}

pub async fn show(
    State(state): State<SessionsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SessionDetailResponse>> {
    let id = parse_uuid(&id, "session id")?;

    let session = state
        .repo(&auth_user)
        .get_session_with_logs(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

    if session.session.user_id != auth_user.id {
        return Err(AppError::Forbidden(
            "Session belongs to another user".to_string(),
        ));
    }

    Ok(Json(SessionDetailResponse {
        success: true,
        session,
    }))
}

pub async fn complete(
    State(state): State<SessionsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    ApiJson(data): ApiJson<CompletionData>,
) -> Result<Json<Value>> {
    let id = parse_uuid(&id, "session id")?;
    validate_completion(&data)?;

    let repo = state.repo(&auth_user);
    let session = owned_session(repo.as_ref(), &auth_user, &id).await?;
    if !session.is_active() {
        return Err(already_completed());
    }

    repo.complete_session(&id, data).await?;
    tracing::info!(user_id = %auth_user.id, session_id = %id, "Workout session completed");

    Ok(Json(json!({ "success": true })))
}

pub async fn abandon(
    State(state): State<SessionsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_uuid(&id, "session id")?;

    let repo = state.repo(&auth_user);
    let session = owned_session(repo.as_ref(), &auth_user, &id).await?;
    if !session.is_active() {
        return Err(already_completed());
    }

    repo.abandon_session(&id).await?;
    tracing::info!(user_id = %auth_user.id, session_id = %id, "Workout session abandoned");

    Ok(Json(json!({ "success": true })))
}

pub async fn summaries(
    State(state): State<SessionsState>,
    auth_user: AuthUser,
    ApiQuery(query): ApiQuery<SummariesQuery>,
) -> Result<Json<Value>> {
    let limit = page_limit(query.limit)?;

    let summaries = state
        .repo(&auth_user)
        .get_session_summaries(&auth_user.id, limit)
        .await?;
    let count = summaries.len();

    Ok(Json(json!({
        "success": true,
        "summaries": summaries,
        "count": count,
    })))
}
