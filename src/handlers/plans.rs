use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::error::Result;
use crate::extract::ApiJson;
use crate::middleware::AuthUser;
use crate::models::{ImportedPlan, WorkoutPlan};
use crate::repositories::PlanRepository;
use crate::validation::validate_plan;

#[derive(Clone)]
pub struct PlansState {
    pub plan_repo: PlanRepository,
}

#[derive(Serialize)]
pub struct ImportPlanResponse {
    pub success: bool,
    #[serde(flatten)]
    pub plan: ImportedPlan,
}

/// Store a plan produced by the plan generator for the caller.
pub async fn import(
    State(state): State<PlansState>,
    auth_user: AuthUser,
    ApiJson(plan): ApiJson<WorkoutPlan>,
) -> Result<(StatusCode, Json<ImportPlanResponse>)> {
    validate_plan(&plan)?;

    let plan = state.plan_repo.import_plan(&auth_user.id, plan).await?;
    tracing::info!(
        user_id = %auth_user.id,
        plan_id = %plan.plan_id,
        routine_days = plan.routine_days.len(),
        "Workout plan imported"
    );

    Ok((
        StatusCode::CREATED,
        Json(ImportPlanResponse {
            success: true,
            plan,
        }),
    ))
}
